//! Recursion guarding
//!
//! A [`RecursionGuard`] tracks the requests it is currently resolving on a
//! stack owned by the resolution context, so concurrent top-level calls on
//! one graph never observe each other's in-flight requests. A request is
//! recursive when equal requests already sit on the stack `depth` times.

use crate::builder::{CompositeSpecimenBuilder, SpecimenBuilder};
use crate::context::{GuardId, SpecimenContext};
use crate::error::{SpecimenError, SpecimenResult};
use crate::node::SpecimenBuilderNode;
use crate::request::Request;
use crate::specimen::Specimen;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_GUARD: AtomicU64 = AtomicU64::new(1);

fn next_guard_id() -> GuardId {
    GuardId(NEXT_GUARD.fetch_add(1, Ordering::Relaxed))
}

/// Decides what a recursive request resolves to
pub trait RecursionHandler: Send + Sync + fmt::Debug {
    /// Handle a request detected as recursive
    ///
    /// # Errors
    /// Policies that fail fast report `Recursion`
    fn handle_recursive_request(
        &self,
        request: &Request,
        context: &SpecimenContext,
    ) -> SpecimenResult<Specimen>;
}

/// Fails with the full request path
#[derive(Debug, Clone, Copy, Default)]
pub struct ThrowingRecursionHandler;

impl RecursionHandler for ThrowingRecursionHandler {
    fn handle_recursive_request(
        &self,
        request: &Request,
        context: &SpecimenContext,
    ) -> SpecimenResult<Specimen> {
        let mut path = context.path_strings();
        let rendered = request.to_string();
        if path.last() != Some(&rendered) {
            path.push(rendered.clone());
        }
        Err(SpecimenError::Recursion {
            request: rendered,
            path,
        })
    }
}

/// Resolves recursive requests to null
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecursionHandler;

impl RecursionHandler for NullRecursionHandler {
    fn handle_recursive_request(&self, _: &Request, _: &SpecimenContext) -> SpecimenResult<Specimen> {
        Ok(Specimen::Null)
    }
}

/// Resolves recursive requests to omit
#[derive(Debug, Clone, Copy, Default)]
pub struct OmitOnRecursionHandler;

impl RecursionHandler for OmitOnRecursionHandler {
    fn handle_recursive_request(&self, _: &Request, _: &SpecimenContext) -> SpecimenResult<Specimen> {
        Ok(Specimen::Omit)
    }
}

/// Equality used to find a request on the guard stack
pub trait RequestComparer: Send + Sync + fmt::Debug {
    /// Check if two requests count as the same
    fn equals(&self, left: &Request, right: &Request) -> bool;
}

/// Full request equality
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralRequestComparer;

impl RequestComparer for StructuralRequestComparer {
    fn equals(&self, left: &Request, right: &Request) -> bool {
        left == right
    }
}

/// Plain type requests for the same type
#[derive(Debug, Clone, Copy, Default)]
pub struct SameTypeRequestComparer;

impl RequestComparer for SameTypeRequestComparer {
    fn equals(&self, left: &Request, right: &Request) -> bool {
        match (left.as_type(), right.as_type()) {
            (Some(l), Some(r)) => l == r,
            _ => false,
        }
    }
}

/// Detects cycles among in-flight requests
#[derive(Debug, Clone)]
pub struct RecursionGuard {
    builder: Arc<dyn SpecimenBuilder>,
    handler: Arc<dyn RecursionHandler>,
    comparer: Arc<dyn RequestComparer>,
    depth: usize,
    id: GuardId,
}

impl RecursionGuard {
    /// Guard `builder`, failing fast on the first repeat
    #[must_use]
    pub fn new(builder: Arc<dyn SpecimenBuilder>) -> Self {
        Self::with_handler(builder, Arc::new(ThrowingRecursionHandler), 1)
    }

    /// Guard `builder` with a handler and depth
    #[must_use]
    pub fn with_handler(
        builder: Arc<dyn SpecimenBuilder>,
        handler: Arc<dyn RecursionHandler>,
        depth: usize,
    ) -> Self {
        Self {
            builder,
            handler,
            comparer: Arc::new(StructuralRequestComparer),
            depth,
            id: next_guard_id(),
        }
    }

    /// Replace the comparer
    #[must_use]
    pub fn with_comparer(mut self, comparer: Arc<dyn RequestComparer>) -> Self {
        self.comparer = comparer;
        self
    }

    /// Occurrences on the stack that make a request recursive
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Handler applied to recursive requests
    #[inline]
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn RecursionHandler> {
        &self.handler
    }
}

impl SpecimenBuilder for RecursionGuard {
    fn create(&self, request: &Request, context: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let seen = context
            .monitor(self.id)
            .iter()
            .filter(|r| self.comparer.equals(r, request))
            .count();
        if seen >= self.depth {
            tracing::warn!(%request, depth = context.depth(), "recursion detected");
            return self.handler.handle_recursive_request(request, context);
        }

        context.monitor(self.id).push(request.clone());
        let result = self.builder.create(request, context);
        context.monitor(self.id).pop();
        result
    }

    fn as_node(&self) -> Option<&dyn SpecimenBuilderNode> {
        Some(self)
    }
}

impl SpecimenBuilderNode for RecursionGuard {
    fn children(&self) -> Vec<Arc<dyn SpecimenBuilder>> {
        vec![Arc::clone(&self.builder)]
    }

    fn compose(&self, children: Vec<Arc<dyn SpecimenBuilder>>) -> Arc<dyn SpecimenBuilder> {
        Arc::new(
            Self::with_handler(
                CompositeSpecimenBuilder::compose_all(children),
                Arc::clone(&self.handler),
                self.depth,
            )
            .with_comparer(Arc::clone(&self.comparer)),
        )
    }
}
