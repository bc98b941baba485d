//! Postprocessing of created specimens
//!
//! A [`Postprocessor`] runs a [`SpecimenCommand`] against every value its
//! inner builder produces for requests matching its specification.
//! Auto-properties, member bindings and user actions are all commands.

use crate::builder::{CompositeSpecimenBuilder, SpecimenBuilder};
use crate::context::SpecimenContext;
use crate::error::{SpecimenError, SpecimenResult};
use crate::node::SpecimenBuilderNode;
use crate::request::{PropertyRequest, Request};
use crate::shape::{short_type_name, Shape, Shaped, TypeKey, Value};
use crate::specification::RequestSpecification;
use crate::specimen::Specimen;
use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Action applied to a freshly created specimen
pub trait SpecimenCommand: Send + Sync + fmt::Debug {
    /// Mutate `specimen`, resolving further values through `context`
    ///
    /// # Errors
    /// Resolution failures or a type mismatch on the specimen
    fn execute(
        &self,
        specimen: &mut (dyn Any + Send),
        request: &Request,
        context: &mut SpecimenContext,
    ) -> SpecimenResult<()>;
}

/// Runs a command on values produced by its inner builder
#[derive(Debug, Clone)]
pub struct Postprocessor {
    builder: Arc<dyn SpecimenBuilder>,
    command: Arc<dyn SpecimenCommand>,
    specification: Arc<dyn RequestSpecification>,
}

impl Postprocessor {
    /// Create postprocessor
    #[inline]
    #[must_use]
    pub fn new(
        builder: Arc<dyn SpecimenBuilder>,
        command: Arc<dyn SpecimenCommand>,
        specification: Arc<dyn RequestSpecification>,
    ) -> Self {
        Self {
            builder,
            command,
            specification,
        }
    }

    /// Inner builder
    #[inline]
    #[must_use]
    pub fn builder(&self) -> &Arc<dyn SpecimenBuilder> {
        &self.builder
    }

    /// Command run on every produced value
    #[inline]
    #[must_use]
    pub fn command(&self) -> &Arc<dyn SpecimenCommand> {
        &self.command
    }
}

impl SpecimenBuilder for Postprocessor {
    fn create(&self, request: &Request, context: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let specimen = self.builder.create(request, context)?;
        if !self.specification.is_satisfied_by(request) {
            return Ok(specimen);
        }
        match specimen {
            Specimen::Value(mut value) => {
                self.command.execute(value.as_mut(), request, context)?;
                Ok(Specimen::Value(value))
            }
            other => Ok(other),
        }
    }

    fn as_node(&self) -> Option<&dyn SpecimenBuilderNode> {
        Some(self)
    }
}

impl SpecimenBuilderNode for Postprocessor {
    fn children(&self) -> Vec<Arc<dyn SpecimenBuilder>> {
        vec![Arc::clone(&self.builder)]
    }

    fn compose(&self, children: Vec<Arc<dyn SpecimenBuilder>>) -> Arc<dyn SpecimenBuilder> {
        Arc::new(Self::new(
            CompositeSpecimenBuilder::compose_all(children),
            Arc::clone(&self.command),
            Arc::clone(&self.specification),
        ))
    }
}

/// Assigns every writable property a freshly resolved value
///
/// Properties resolving to null or omit are left as constructed.
#[derive(Debug, Clone, Default)]
pub struct AutoPropertiesCommand {
    excluded: BTreeSet<&'static str>,
}

impl AutoPropertiesCommand {
    /// Populate every property
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate every property except those named
    #[must_use]
    pub fn excluding<I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'static str>,
    {
        Self {
            excluded: names.into_iter().collect(),
        }
    }

    /// Names skipped by this command
    #[inline]
    #[must_use]
    pub fn excluded(&self) -> &BTreeSet<&'static str> {
        &self.excluded
    }
}

impl SpecimenCommand for AutoPropertiesCommand {
    fn execute(
        &self,
        specimen: &mut (dyn Any + Send),
        request: &Request,
        context: &mut SpecimenContext,
    ) -> SpecimenResult<()> {
        let Some(owner) = request.type_key() else {
            return Ok(());
        };
        let Shape::Struct(shape) = owner.shape() else {
            return Ok(());
        };
        for property in shape.properties() {
            if self.excluded.contains(property.name()) {
                continue;
            }
            let member = Request::Property(PropertyRequest {
                owner,
                name: property.name(),
                key: property.key(),
            });
            if let Specimen::Value(value) = context.resolve(&member)? {
                property.assign(specimen, value)?;
            }
        }
        Ok(())
    }
}

/// Source of a bound member value
#[derive(Clone)]
pub enum BindingValue {
    /// Clone of a fixed value
    Fixed(Arc<dyn Fn() -> Value + Send + Sync>),
    /// Value resolved from the graph for the member's type
    Resolved,
}

impl fmt::Debug for BindingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(_) => f.write_str("Fixed(..)"),
            Self::Resolved => f.write_str("Resolved"),
        }
    }
}

/// Assigns one named property
#[derive(Debug, Clone)]
pub struct BindingCommand {
    owner: TypeKey,
    member: &'static str,
    value: BindingValue,
}

impl BindingCommand {
    /// Bind `member` of `owner` to a clone of `value`
    pub fn fixed<V>(owner: TypeKey, member: &'static str, value: V) -> Self
    where
        V: Any + Clone + Send + Sync,
    {
        Self {
            owner,
            member,
            value: BindingValue::Fixed(Arc::new(move || Box::new(value.clone()) as Value)),
        }
    }

    /// Bind `member` of `owner` to a freshly resolved value
    #[must_use]
    pub fn resolved(owner: TypeKey, member: &'static str) -> Self {
        Self {
            owner,
            member,
            value: BindingValue::Resolved,
        }
    }

    /// Bound member name
    #[inline]
    #[must_use]
    pub fn member(&self) -> &'static str {
        self.member
    }
}

impl SpecimenCommand for BindingCommand {
    fn execute(
        &self,
        specimen: &mut (dyn Any + Send),
        _: &Request,
        context: &mut SpecimenContext,
    ) -> SpecimenResult<()> {
        let Shape::Struct(shape) = self.owner.shape() else {
            return Err(unknown_member(self.owner, self.member));
        };
        let property = shape
            .property_named(self.member)
            .ok_or_else(|| unknown_member(self.owner, self.member))?;
        let value = match &self.value {
            BindingValue::Fixed(make) => make(),
            BindingValue::Resolved => {
                let member = Request::Property(PropertyRequest {
                    owner: self.owner,
                    name: property.name(),
                    key: property.key(),
                });
                match context.resolve(&member)? {
                    Specimen::Value(value) => value,
                    _ => return Ok(()),
                }
            }
        };
        property.assign(specimen, value)
    }
}

fn unknown_member(owner: TypeKey, member: &str) -> SpecimenError {
    SpecimenError::UnknownMember {
        type_name: owner.short_name(),
        member: member.to_string(),
    }
}

type ActionFn<T> = dyn Fn(&mut T, &mut SpecimenContext) -> SpecimenResult<()> + Send + Sync;

/// Runs a user closure on the typed specimen
pub struct ActionCommand<T> {
    action: Arc<ActionFn<T>>,
}

impl<T: Shaped> ActionCommand<T> {
    /// Wrap an action
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(&mut T, &mut SpecimenContext) -> SpecimenResult<()> + Send + Sync + 'static,
    {
        Self {
            action: Arc::new(action),
        }
    }
}

impl<T> Clone for ActionCommand<T> {
    fn clone(&self) -> Self {
        Self {
            action: Arc::clone(&self.action),
        }
    }
}

impl<T> fmt::Debug for ActionCommand<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActionCommand<{}>", short_type_name(std::any::type_name::<T>()))
    }
}

impl<T: Shaped> SpecimenCommand for ActionCommand<T> {
    fn execute(
        &self,
        specimen: &mut (dyn Any + Send),
        _: &Request,
        context: &mut SpecimenContext,
    ) -> SpecimenResult<()> {
        let typed = specimen
            .downcast_mut::<T>()
            .ok_or_else(|| SpecimenError::TypeMismatch {
                expected: short_type_name(std::any::type_name::<T>()),
                actual: "specimen of another type".to_string(),
            })?;
        (self.action)(typed, context)
    }
}

/// Runs commands in order
#[derive(Debug, Clone, Default)]
pub struct CompositeCommand(pub Vec<Arc<dyn SpecimenCommand>>);

impl SpecimenCommand for CompositeCommand {
    fn execute(
        &self,
        specimen: &mut (dyn Any + Send),
        request: &Request,
        context: &mut SpecimenContext,
    ) -> SpecimenResult<()> {
        for command in &self.0 {
            command.execute(specimen, request, context)?;
        }
        Ok(())
    }
}
