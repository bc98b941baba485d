//! Specimen builder contract and the basic builders
//!
//! A [`SpecimenBuilder`] either satisfies a request or answers
//! [`Specimen::NoSpecimen`]. It never fails merely because the request is
//! foreign to it; genuine failures propagate as errors that composites do
//! not swallow.

use crate::context::SpecimenContext;
use crate::error::{SpecimenError, SpecimenResult};
use crate::node::{first_resolved, SpecimenBuilderNode};
use crate::request::Request;
use crate::shape::{short_type_name, Value};
use crate::specification::RequestSpecification;
use crate::specimen::Specimen;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type-erased view used to identify builders structurally
pub trait AsAny {
    /// Borrow as [`Any`]
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Unit that attempts to satisfy a request
pub trait SpecimenBuilder: AsAny + Send + Sync + fmt::Debug {
    /// Create a specimen, or [`Specimen::NoSpecimen`] when the request is
    /// not handled here
    ///
    /// # Errors
    /// Failures of the selected strategy; never for foreign requests
    fn create(&self, request: &Request, context: &mut SpecimenContext)
        -> SpecimenResult<Specimen>;

    /// Node view when this builder owns children
    fn as_node(&self) -> Option<&dyn SpecimenBuilderNode> {
        None
    }
}

/// Check the concrete type of a builder
#[inline]
#[must_use]
pub fn builder_is<T: Any>(builder: &dyn SpecimenBuilder) -> bool {
    AsAny::as_any(builder).is::<T>()
}

/// Borrow a builder as its concrete type
#[inline]
#[must_use]
pub fn downcast_builder<T: Any>(builder: &dyn SpecimenBuilder) -> Option<&T> {
    AsAny::as_any(builder).downcast_ref::<T>()
}

/// Tries children in order; the first resolution wins
#[derive(Debug, Clone, Default)]
pub struct CompositeSpecimenBuilder {
    builders: Vec<Arc<dyn SpecimenBuilder>>,
}

impl CompositeSpecimenBuilder {
    /// Create composite over `builders`
    #[inline]
    #[must_use]
    pub fn new(builders: Vec<Arc<dyn SpecimenBuilder>>) -> Self {
        Self { builders }
    }

    /// Child builders in priority order
    #[inline]
    #[must_use]
    pub fn builders(&self) -> &[Arc<dyn SpecimenBuilder>] {
        &self.builders
    }

    /// Compose a list into one builder, skipping the wrapper for one child
    #[must_use]
    pub fn compose_all(mut builders: Vec<Arc<dyn SpecimenBuilder>>) -> Arc<dyn SpecimenBuilder> {
        if builders.len() == 1 {
            if let Some(single) = builders.pop() {
                return single;
            }
        }
        Arc::new(Self::new(builders))
    }
}

impl SpecimenBuilder for CompositeSpecimenBuilder {
    fn create(
        &self,
        request: &Request,
        context: &mut SpecimenContext,
    ) -> SpecimenResult<Specimen> {
        first_resolved(&self.builders, request, context)
    }

    fn as_node(&self) -> Option<&dyn SpecimenBuilderNode> {
        Some(self)
    }
}

impl SpecimenBuilderNode for CompositeSpecimenBuilder {
    fn children(&self) -> Vec<Arc<dyn SpecimenBuilder>> {
        self.builders.clone()
    }

    fn compose(&self, builders: Vec<Arc<dyn SpecimenBuilder>>) -> Arc<dyn SpecimenBuilder> {
        Arc::new(Self::new(builders))
    }
}

/// Delegates only requests satisfying a specification
#[derive(Debug, Clone)]
pub struct FilteringSpecimenBuilder {
    builder: Arc<dyn SpecimenBuilder>,
    specification: Arc<dyn RequestSpecification>,
}

impl FilteringSpecimenBuilder {
    /// Create filter
    #[inline]
    #[must_use]
    pub fn new(
        builder: Arc<dyn SpecimenBuilder>,
        specification: Arc<dyn RequestSpecification>,
    ) -> Self {
        Self {
            builder,
            specification,
        }
    }

    /// Filtering specification
    #[inline]
    #[must_use]
    pub fn specification(&self) -> &Arc<dyn RequestSpecification> {
        &self.specification
    }
}

impl SpecimenBuilder for FilteringSpecimenBuilder {
    fn create(
        &self,
        request: &Request,
        context: &mut SpecimenContext,
    ) -> SpecimenResult<Specimen> {
        if !self.specification.is_satisfied_by(request) {
            return Ok(Specimen::NoSpecimen);
        }
        self.builder.create(request, context)
    }

    fn as_node(&self) -> Option<&dyn SpecimenBuilderNode> {
        Some(self)
    }
}

impl SpecimenBuilderNode for FilteringSpecimenBuilder {
    fn children(&self) -> Vec<Arc<dyn SpecimenBuilder>> {
        vec![Arc::clone(&self.builder)]
    }

    fn compose(&self, builders: Vec<Arc<dyn SpecimenBuilder>>) -> Arc<dyn SpecimenBuilder> {
        Arc::new(Self::new(
            CompositeSpecimenBuilder::compose_all(builders),
            Arc::clone(&self.specification),
        ))
    }
}

type MakeFn = dyn Fn() -> Value + Send + Sync;

/// Returns a copy of one fixed value for every request
#[derive(Clone)]
pub struct FixedBuilder {
    make: Arc<MakeFn>,
    type_name: String,
}

impl FixedBuilder {
    /// Create from a value cloned on every request
    #[must_use]
    pub fn new<T: Any + Clone + Send + Sync>(value: T) -> Self {
        Self {
            make: Arc::new(move || Box::new(value.clone()) as Value),
            type_name: short_type_name(std::any::type_name::<T>()),
        }
    }
}

impl fmt::Debug for FixedBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedBuilder<{}>", self.type_name)
    }
}

impl SpecimenBuilder for FixedBuilder {
    fn create(&self, _: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        Ok(Specimen::Value((self.make)()))
    }
}

type FactoryFn = dyn Fn(&mut SpecimenContext) -> SpecimenResult<Value> + Send + Sync;

/// Runs a factory closure for every request
#[derive(Clone)]
pub struct FactoryBuilder {
    factory: Arc<FactoryFn>,
    type_name: String,
}

impl FactoryBuilder {
    /// Create from a factory that may resolve its own inputs
    pub fn new<T, F>(factory: F) -> Self
    where
        T: Any + Send,
        F: Fn(&mut SpecimenContext) -> SpecimenResult<T> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(move |ctx| factory(ctx).map(|v| Box::new(v) as Value)),
            type_name: short_type_name(std::any::type_name::<T>()),
        }
    }
}

impl fmt::Debug for FactoryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FactoryBuilder<{}>", self.type_name)
    }
}

impl SpecimenBuilder for FactoryBuilder {
    fn create(&self, _: &Request, context: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        (self.factory)(context).map(Specimen::Value)
    }
}

/// Declines every request
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSpecimenBuilder;

impl SpecimenBuilder for NoSpecimenBuilder {
    fn create(&self, _: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        Ok(Specimen::NoSpecimen)
    }
}

/// Last resort: reaching it means every prior builder declined
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminatingSpecimenBuilder;

impl SpecimenBuilder for TerminatingSpecimenBuilder {
    fn create(&self, request: &Request, context: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        tracing::debug!(%request, depth = context.depth(), "request reached the terminator");
        Err(SpecimenError::Unresolved {
            request: request.to_string(),
            path: context.path_strings(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specification::ExactTypeSpecification;
    use proptest::prelude::*;

    #[derive(Debug)]
    struct Answer(Option<u32>);

    impl SpecimenBuilder for Answer {
        fn create(&self, _: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
            Ok(self.0.map_or(Specimen::NoSpecimen, Specimen::value))
        }
    }

    #[derive(Debug)]
    struct Fails;

    impl SpecimenBuilder for Fails {
        fn create(&self, _: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
            Err(SpecimenError::construction("u32", "constructor panicked"))
        }
    }

    #[derive(Debug)]
    struct Returns(fn() -> Specimen);

    impl SpecimenBuilder for Returns {
        fn create(&self, _: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
            Ok((self.0)())
        }
    }

    fn run(builder: Arc<dyn SpecimenBuilder>) -> SpecimenResult<Specimen> {
        let mut ctx = SpecimenContext::new(Arc::new(TerminatingSpecimenBuilder));
        builder.create(&Request::of::<u32>(), &mut ctx)
    }

    proptest! {
        #[test]
        fn composite_returns_first_resolution(
            answers in proptest::collection::vec(proptest::option::of(0u32..1000), 0..8)
        ) {
            let builders: Vec<Arc<dyn SpecimenBuilder>> = answers
                .iter()
                .map(|a| Arc::new(Answer(*a)) as Arc<dyn SpecimenBuilder>)
                .collect();
            let composite = Arc::new(CompositeSpecimenBuilder::new(builders));

            let result = run(composite).unwrap();
            match answers.iter().find_map(|a| *a) {
                Some(expected) => prop_assert_eq!(result.downcast::<u32>().unwrap(), expected),
                None => prop_assert!(result.is_no_specimen()),
            }
        }
    }

    #[test]
    fn null_and_omit_stop_the_scan() {
        let composite = CompositeSpecimenBuilder::new(vec![
            Arc::new(Answer(None)),
            Arc::new(Returns(|| Specimen::Null)),
            Arc::new(Answer(Some(1))),
        ]);
        assert!(matches!(run(Arc::new(composite)).unwrap(), Specimen::Null));

        let composite = CompositeSpecimenBuilder::new(vec![
            Arc::new(Returns(|| Specimen::Omit)),
            Arc::new(Answer(Some(1))),
        ]);
        assert!(matches!(run(Arc::new(composite)).unwrap(), Specimen::Omit));
    }

    #[test]
    fn composite_does_not_swallow_errors() {
        let composite = CompositeSpecimenBuilder::new(vec![
            Arc::new(Answer(None)),
            Arc::new(Fails),
            Arc::new(Answer(Some(1))),
        ]);
        let err = run(Arc::new(composite)).unwrap_err();
        assert!(matches!(err, SpecimenError::Construction { .. }));
    }

    #[test]
    fn compose_all_unwraps_single_child() {
        let single = CompositeSpecimenBuilder::compose_all(vec![Arc::new(Answer(Some(3)))]);
        assert!(builder_is::<Answer>(single.as_ref()));

        let many = CompositeSpecimenBuilder::compose_all(vec![
            Arc::new(Answer(None)),
            Arc::new(Answer(Some(3))),
        ]);
        assert!(builder_is::<CompositeSpecimenBuilder>(many.as_ref()));
    }

    #[test]
    fn filtering_builder_declines_unsatisfied_requests() {
        let filter = FilteringSpecimenBuilder::new(
            Arc::new(Answer(Some(9))),
            Arc::new(ExactTypeSpecification::of::<String>()),
        );
        assert!(run(Arc::new(filter)).unwrap().is_no_specimen());
    }

    #[test]
    fn fixed_builder_clones_value() {
        let fixed = Arc::new(FixedBuilder::new(String::from("same")));
        let a = run(fixed.clone()).unwrap().downcast::<String>().unwrap();
        let b = run(fixed).unwrap().downcast::<String>().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn factory_builder_can_resolve_inputs() {
        let root: Arc<dyn SpecimenBuilder> = Arc::new(CompositeSpecimenBuilder::new(vec![
            Arc::new(FilteringSpecimenBuilder::new(
                Arc::new(FixedBuilder::new(21_u32)),
                Arc::new(ExactTypeSpecification::of::<u32>()),
            )),
            Arc::new(FilteringSpecimenBuilder::new(
                Arc::new(FactoryBuilder::new(|ctx| {
                    Ok(u64::from(ctx.resolve_as::<u32>()?) * 2)
                })),
                Arc::new(ExactTypeSpecification::of::<u64>()),
            )),
        ]));
        let mut ctx = SpecimenContext::new(root);
        assert_eq!(ctx.resolve_as::<u32>().unwrap(), 21);
        assert_eq!(ctx.resolve_as::<u64>().unwrap(), 42);
    }

    #[test]
    fn terminator_reports_path() {
        let mut ctx = SpecimenContext::new(Arc::new(TerminatingSpecimenBuilder));
        let err = ctx.resolve(&Request::of::<u32>()).unwrap_err();
        assert!(err.is_unresolved());
        assert_eq!(err.path(), &["u32".to_string()]);
    }
}
