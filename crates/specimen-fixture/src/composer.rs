//! Per-type recipes
//!
//! A [`Composer`] collects how one type should be created: which factory
//! makes it, which members get fixed or freshly resolved values, what
//! runs afterwards. It compiles into a single builder answering requests
//! for exactly that type.

use crate::fixture::Fixture;
use crate::invoker::MethodInvoker;
use specimen_core::{
    ActionCommand, AutoPropertiesCommand, BindingCommand, CompositeCommand, ExactTypeSpecification,
    FactoryBuilder, FilteringSpecimenBuilder, Postprocessor, Request, RequestSpecification, Seed, Shape, Shaped,
    Specimen, SpecimenBuilder, SpecimenCommand, SpecimenContext, SpecimenError, SpecimenResult,
    TypeKey,
};
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Recipe for creating `T`
pub struct Composer<'f, T> {
    fixture: &'f Fixture,
    factory: Option<Arc<dyn SpecimenBuilder>>,
    auto_properties: bool,
    excluded: Vec<&'static str>,
    bound: Vec<&'static str>,
    commands: Vec<Arc<dyn SpecimenCommand>>,
    error: Option<SpecimenError>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Composer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composer")
            .field("type", &std::any::type_name::<T>())
            .field("factory", &self.factory)
            .field("auto_properties", &self.auto_properties)
            .field("excluded", &self.excluded)
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}

impl<'f, T: Shaped> Composer<'f, T> {
    pub(crate) fn new(fixture: &'f Fixture) -> Self {
        Self {
            fixture,
            factory: None,
            auto_properties: !fixture.omit_auto_properties(),
            excluded: Vec::new(),
            bound: Vec::new(),
            commands: Vec::new(),
            error: None,
            _marker: PhantomData,
        }
    }

    /// Create `T` with `factory` instead of its constructors
    #[must_use]
    pub fn from_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&mut SpecimenContext) -> SpecimenResult<T> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(FactoryBuilder::new(factory)));
        self
    }

    /// Create `T` from the seed of seeded requests, `None` for plain ones
    #[must_use]
    pub fn from_seed<F>(mut self, factory: F) -> Self
    where
        F: Fn(Option<&Seed>) -> T + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(SeedFactoryBuilder::<T> {
            factory: Arc::new(factory),
        }));
        self
    }

    /// Set property `name` to a clone of `value`
    ///
    /// An unknown name or a mismatched value type is reported when the
    /// recipe is installed.
    #[must_use]
    pub fn with<V>(mut self, name: &'static str, value: V) -> Self
    where
        V: Any + Clone + Send + Sync,
    {
        if let Err(e) = member_of::<T>(name, Some(TypeId::of::<V>())) {
            self.error.get_or_insert(e);
        }
        self.bound.push(name);
        self.commands
            .push(Arc::new(BindingCommand::fixed(TypeKey::of::<T>(), name, value)));
        self
    }

    /// Set property `name` to a freshly resolved value, even with
    /// auto-properties off
    #[must_use]
    pub fn with_resolved(mut self, name: &'static str) -> Self {
        if let Err(e) = member_of::<T>(name, None) {
            self.error.get_or_insert(e);
        }
        self.bound.push(name);
        self.commands
            .push(Arc::new(BindingCommand::resolved(TypeKey::of::<T>(), name)));
        self
    }

    /// Leave property `name` as constructed
    #[must_use]
    pub fn without(mut self, name: &'static str) -> Self {
        if let Err(e) = member_of::<T>(name, None) {
            self.error.get_or_insert(e);
        }
        self.excluded.push(name);
        self
    }

    /// Run `action` on every created value
    #[must_use]
    pub fn do_<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.commands
            .push(Arc::new(ActionCommand::<T>::new(move |value, _| {
                action(value);
                Ok(())
            })));
        self
    }

    /// Run `action` with access to the resolution context
    #[must_use]
    pub fn do_with_context<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut T, &mut SpecimenContext) -> SpecimenResult<()> + Send + Sync + 'static,
    {
        self.commands.push(Arc::new(ActionCommand::<T>::new(action)));
        self
    }

    /// Leave every unbound property as constructed
    #[must_use]
    pub fn omit_auto_properties(mut self) -> Self {
        self.auto_properties = false;
        self
    }

    /// Populate every unbound, non-excluded property
    #[must_use]
    pub fn with_auto_properties(mut self) -> Self {
        self.auto_properties = true;
        self
    }

    /// Compile the recipe into a builder answering only `T`
    ///
    /// # Errors
    /// The first invalid member binding
    pub fn into_builder(self) -> SpecimenResult<Arc<dyn SpecimenBuilder>> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let base = self
            .factory
            .unwrap_or_else(|| Arc::new(MethodInvoker::modest()));

        let mut commands: Vec<Arc<dyn SpecimenCommand>> = Vec::new();
        if self.auto_properties {
            let skipped = self.excluded.into_iter().chain(self.bound);
            commands.push(Arc::new(AutoPropertiesCommand::excluding(skipped)));
        }
        commands.extend(self.commands);

        let specification: Arc<dyn RequestSpecification> =
            Arc::new(ExactTypeSpecification::of::<T>());
        let builder: Arc<dyn SpecimenBuilder> = if commands.is_empty() {
            base
        } else {
            Arc::new(Postprocessor::new(
                base,
                Arc::new(CompositeCommand(commands)),
                Arc::clone(&specification),
            ))
        };
        Ok(Arc::new(FilteringSpecimenBuilder::new(builder, specification)))
    }

    /// Create one `T` from this recipe without installing it
    ///
    /// # Errors
    /// Invalid member bindings or resolution failures
    pub fn create(self) -> SpecimenResult<T> {
        let fixture = self.fixture;
        let root = fixture.graph_with(self.into_builder()?)?;
        SpecimenContext::new(root).resolve_as::<T>()
    }

    /// Create [`Fixture::repeat_count`] values from this recipe
    ///
    /// # Errors
    /// See [`create`](Self::create)
    pub fn create_many(self) -> SpecimenResult<Vec<T>> {
        let fixture = self.fixture;
        let root = fixture.graph_with(self.into_builder()?)?;
        SpecimenContext::new(root).resolve_many::<T>()
    }
}

fn member_of<T: Shaped>(name: &'static str, value: Option<TypeId>) -> SpecimenResult<()> {
    let owner = TypeKey::of::<T>();
    let unknown = || SpecimenError::UnknownMember {
        type_name: owner.short_name(),
        member: name.to_string(),
    };
    let Shape::Struct(shape) = owner.shape() else {
        return Err(unknown());
    };
    let property = shape.property_named(name).ok_or_else(unknown)?;
    match value {
        Some(id) if id != property.key().id() => Err(SpecimenError::TypeMismatch {
            expected: property.key().short_name(),
            actual: format!("value bound to {}.{name}", owner.short_name()),
        }),
        _ => Ok(()),
    }
}

type SeedFn<T> = dyn Fn(Option<&Seed>) -> T + Send + Sync;

/// Builds `T` from the seed of its request
struct SeedFactoryBuilder<T> {
    factory: Arc<SeedFn<T>>,
}

impl<T> fmt::Debug for SeedFactoryBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeedFactoryBuilder<{}>", std::any::type_name::<T>())
    }
}

impl<T: Shaped> SpecimenBuilder for SeedFactoryBuilder<T> {
    fn create(&self, request: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let seed = match request {
            Request::Seeded(seeded) if seeded.request.is_type::<T>() => Some(&seeded.seed),
            Request::Type(key) if key.is::<T>() => None,
            _ => return Ok(Specimen::NoSpecimen),
        };
        Ok(Specimen::value((self.factory)(seed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use specimen_test_utils::{Address, Person, SelfRef};

    #[test]
    fn binds_fixed_values() {
        let fixture = Fixture::new();
        let person = fixture
            .build::<Person>()
            .with("name", "Ada".to_string())
            .with("age", 36_u32)
            .create()
            .unwrap();
        assert_eq!(person.name, "Ada");
        assert_eq!(person.age, 36);
        assert!(!person.email.is_empty());
    }

    #[test]
    fn excluded_members_keep_constructed_values() {
        let fixture = Fixture::new();
        let person = fixture.build::<Person>().without("email").create().unwrap();
        assert_eq!(person.email, "");
        assert!(!person.name.is_empty());
    }

    #[test]
    fn resolved_binding_ignores_omitted_auto_properties() {
        let fixture = Fixture::new();
        let person = fixture
            .build::<Person>()
            .omit_auto_properties()
            .with_resolved("name")
            .create()
            .unwrap();
        assert!(person.name.starts_with("name"));
        assert_eq!(person.age, 0);
    }

    #[test]
    fn actions_run_after_bindings() {
        let fixture = Fixture::new();
        let person = fixture
            .build::<Person>()
            .with("name", "ada".to_string())
            .do_(|p| p.name = p.name.to_uppercase())
            .create()
            .unwrap();
        assert_eq!(person.name, "ADA");
    }

    #[test]
    fn factory_replaces_constructors() {
        let fixture = Fixture::new();
        let address = fixture
            .build::<Address>()
            .from_factory(|ctx| {
                Ok(Address {
                    street: "Main".into(),
                    city: ctx.resolve_as::<String>()?,
                    zip: 1,
                })
            })
            .omit_auto_properties()
            .create()
            .unwrap();
        assert_eq!(address.street, "Main");
        assert_eq!(address.zip, 1);
        assert!(!address.city.is_empty());
    }

    #[test]
    fn seed_factory_sees_seed() {
        let fixture = Fixture::new();
        fixture
            .customize::<String, _>(|c| {
                c.from_seed(|seed| match seed {
                    Some(Seed::Text(text)) => format!("<{text}>"),
                    _ => "plain".to_string(),
                })
            })
            .unwrap();
        assert_eq!(fixture.create::<String>().unwrap(), "plain");
        assert_eq!(fixture.create_seeded::<String>("tag").unwrap(), "<tag>");
        let address = fixture.create::<Address>().unwrap();
        assert_eq!(address.street, "<street>");
    }

    #[test]
    fn invalid_bindings_fail_on_install() {
        let fixture = Fixture::new();
        let unknown = fixture.build::<Person>().with("nickname", 1_u8).create();
        assert!(matches!(unknown, Err(SpecimenError::UnknownMember { .. })));

        let mismatch = fixture.build::<Person>().with("age", "old".to_string()).create();
        assert!(matches!(mismatch, Err(SpecimenError::TypeMismatch { .. })));

        let not_struct = fixture.customize::<u32, _>(|c| c.without("bits"));
        assert!(not_struct.is_err());
        assert!(fixture.customizations().is_empty());
    }

    #[test]
    fn many_from_recipe() {
        let fixture = Fixture::new();
        let people = fixture
            .build::<Person>()
            .with("age", 7_u32)
            .create_many()
            .unwrap();
        assert_eq!(people.len(), 3);
        assert!(people.iter().all(|p| p.age == 7));
    }

    #[test]
    fn recipe_is_not_installed() {
        let fixture = Fixture::new();
        let _ = fixture.build::<Person>().with("age", 7_u32).create().unwrap();
        assert!(fixture.customizations().is_empty());
    }

    #[test]
    fn recipe_runs_inside_recursion_guard() {
        let fixture = Fixture::new();
        let direct = fixture.create::<SelfRef>().unwrap_err();
        let err = fixture.build::<SelfRef>().create().unwrap_err();
        assert!(err.is_recursion());
        assert_eq!(err.path(), direct.path());
    }
}
