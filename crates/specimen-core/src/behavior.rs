//! Behaviors: transformations applied to the whole graph
//!
//! The fixture graph is rooted in a [`BehaviorRoot`]. Its only structural
//! child is the undecorated core; the decorated builder actually serving
//! requests is recomputed from the behavior list whenever the core or the
//! list changes, so rewrites never traverse into guard wrappers.

use crate::builder::{AsAny, CompositeSpecimenBuilder, SpecimenBuilder};
use crate::context::SpecimenContext;
use crate::error::{SpecimenError, SpecimenResult};
use crate::node::SpecimenBuilderNode;
use crate::recursion::{
    NullRecursionHandler, OmitOnRecursionHandler, RecursionGuard, ThrowingRecursionHandler,
};
use crate::request::Request;
use crate::specimen::Specimen;
use crate::trace::TracingBuilder;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Decorates a builder
pub trait SpecimenBuilderTransformation: AsAny + Send + Sync + fmt::Debug {
    /// Wrap `builder`
    fn transform(&self, builder: Arc<dyn SpecimenBuilder>) -> Arc<dyn SpecimenBuilder>;
}

/// Check the concrete type of a behavior
#[inline]
#[must_use]
pub fn behavior_is<T: Any>(behavior: &dyn SpecimenBuilderTransformation) -> bool {
    AsAny::as_any(behavior).is::<T>()
}

/// Graph root applying behaviors around the core
#[derive(Debug, Clone)]
pub struct BehaviorRoot {
    core: Arc<dyn SpecimenBuilder>,
    behaviors: Vec<Arc<dyn SpecimenBuilderTransformation>>,
    decorated: Arc<dyn SpecimenBuilder>,
}

impl BehaviorRoot {
    /// Apply `behaviors` in order; the last one ends up outermost
    #[must_use]
    pub fn new(
        core: Arc<dyn SpecimenBuilder>,
        behaviors: Vec<Arc<dyn SpecimenBuilderTransformation>>,
    ) -> Self {
        let decorated = behaviors
            .iter()
            .fold(Arc::clone(&core), |builder, behavior| behavior.transform(builder));
        Self {
            core,
            behaviors,
            decorated,
        }
    }

    /// Same core with another behavior list
    #[must_use]
    pub fn with_behaviors(&self, behaviors: Vec<Arc<dyn SpecimenBuilderTransformation>>) -> Self {
        Self::new(Arc::clone(&self.core), behaviors)
    }

    /// Undecorated core
    #[inline]
    #[must_use]
    pub fn core(&self) -> &Arc<dyn SpecimenBuilder> {
        &self.core
    }

    /// Behaviors in application order
    #[inline]
    #[must_use]
    pub fn behaviors(&self) -> &[Arc<dyn SpecimenBuilderTransformation>] {
        &self.behaviors
    }
}

impl SpecimenBuilder for BehaviorRoot {
    fn create(&self, request: &Request, context: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        self.decorated.create(request, context)
    }

    fn as_node(&self) -> Option<&dyn SpecimenBuilderNode> {
        Some(self)
    }
}

impl SpecimenBuilderNode for BehaviorRoot {
    fn children(&self) -> Vec<Arc<dyn SpecimenBuilder>> {
        vec![Arc::clone(&self.core)]
    }

    fn compose(&self, children: Vec<Arc<dyn SpecimenBuilder>>) -> Arc<dyn SpecimenBuilder> {
        Arc::new(Self::new(
            CompositeSpecimenBuilder::compose_all(children),
            self.behaviors.clone(),
        ))
    }
}

/// Guards against recursion by failing with the request path
#[derive(Debug, Clone, Copy, Default)]
pub struct ThrowingRecursionBehavior;

impl SpecimenBuilderTransformation for ThrowingRecursionBehavior {
    fn transform(&self, builder: Arc<dyn SpecimenBuilder>) -> Arc<dyn SpecimenBuilder> {
        Arc::new(RecursionGuard::with_handler(
            builder,
            Arc::new(ThrowingRecursionHandler),
            1,
        ))
    }
}

/// Guards against recursion by resolving repeats to null
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecursionBehavior;

impl SpecimenBuilderTransformation for NullRecursionBehavior {
    fn transform(&self, builder: Arc<dyn SpecimenBuilder>) -> Arc<dyn SpecimenBuilder> {
        Arc::new(RecursionGuard::with_handler(
            builder,
            Arc::new(NullRecursionHandler),
            1,
        ))
    }
}

/// Guards against recursion by omitting repeats past a depth
#[derive(Debug, Clone, Copy)]
pub struct OmitOnRecursionBehavior {
    depth: usize,
}

impl OmitOnRecursionBehavior {
    /// Omit on the first repeat
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { depth: 1 }
    }

    /// Omit once a request is already in flight `depth` times
    ///
    /// # Errors
    /// `InvalidArgument` for a zero depth
    pub fn with_depth(depth: usize) -> SpecimenResult<Self> {
        if depth == 0 {
            return Err(SpecimenError::invalid_argument(
                "recursion depth must be at least 1",
            ));
        }
        Ok(Self { depth })
    }

    /// Configured depth
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Default for OmitOnRecursionBehavior {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecimenBuilderTransformation for OmitOnRecursionBehavior {
    fn transform(&self, builder: Arc<dyn SpecimenBuilder>) -> Arc<dyn SpecimenBuilder> {
        Arc::new(RecursionGuard::with_handler(
            builder,
            Arc::new(OmitOnRecursionHandler),
            self.depth,
        ))
    }
}

/// Logs every request and outcome
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingBehavior;

impl SpecimenBuilderTransformation for TracingBehavior {
    fn transform(&self, builder: Arc<dyn SpecimenBuilder>) -> Arc<dyn SpecimenBuilder> {
        Arc::new(TracingBuilder::new(builder))
    }
}

/// Check if a behavior installs a recursion guard
#[must_use]
pub fn is_recursion_behavior(behavior: &dyn SpecimenBuilderTransformation) -> bool {
    behavior_is::<ThrowingRecursionBehavior>(behavior)
        || behavior_is::<NullRecursionBehavior>(behavior)
        || behavior_is::<OmitOnRecursionBehavior>(behavior)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{builder_is, downcast_builder, FixedBuilder};

    #[test]
    fn last_behavior_is_outermost() {
        let root = BehaviorRoot::new(
            Arc::new(FixedBuilder::new(1_u8)),
            vec![Arc::new(ThrowingRecursionBehavior), Arc::new(TracingBehavior)],
        );
        assert!(builder_is::<TracingBuilder>(root.decorated.as_ref()));
        assert!(builder_is::<FixedBuilder>(root.core().as_ref()));
    }

    #[test]
    fn compose_reapplies_behaviors() {
        let root = BehaviorRoot::new(
            Arc::new(FixedBuilder::new(1_u8)),
            vec![Arc::new(NullRecursionBehavior)],
        );
        let composed = root.compose(vec![Arc::new(FixedBuilder::new(2_u8))]);
        let composed = downcast_builder::<BehaviorRoot>(composed.as_ref()).unwrap();
        assert!(builder_is::<RecursionGuard>(composed.decorated.as_ref()));

        let mut ctx = SpecimenContext::new(Arc::new(composed.clone()));
        assert_eq!(ctx.resolve_as::<u8>().unwrap(), 2);
    }

    #[test]
    fn children_exclude_decorations() {
        let root = BehaviorRoot::new(
            Arc::new(FixedBuilder::new(1_u8)),
            vec![Arc::new(ThrowingRecursionBehavior)],
        );
        let children = root.children();
        assert_eq!(children.len(), 1);
        assert!(builder_is::<FixedBuilder>(children[0].as_ref()));
    }

    #[test]
    fn omit_depth_is_validated() {
        assert!(OmitOnRecursionBehavior::with_depth(0).is_err());
        assert_eq!(OmitOnRecursionBehavior::with_depth(3).unwrap().depth(), 3);
    }

    #[test]
    fn recursion_behaviors_are_recognised() {
        assert!(is_recursion_behavior(&ThrowingRecursionBehavior));
        assert!(is_recursion_behavior(&OmitOnRecursionBehavior::new()));
        assert!(!is_recursion_behavior(&TracingBehavior));
    }
}
