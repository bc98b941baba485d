//! Resolution context
//!
//! One [`SpecimenContext`] is created per top-level resolution call. It
//! re-enters the graph root for every nested request and carries the
//! resolution path plus the recursion guards' in-flight stacks, so no
//! resolution state lives on shared builder instances.

use crate::builder::SpecimenBuilder;
use crate::error::SpecimenResult;
use crate::request::{MultipleRequest, Request};
use crate::shape::Shaped;
use crate::specimen::{Specimen, SpecimenSequence};
use std::collections::HashMap;
use std::sync::Arc;

/// Identity of a recursion guard within one graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GuardId(pub u64);

/// Entry point handed to every builder
#[derive(Debug)]
pub struct SpecimenContext {
    root: Arc<dyn SpecimenBuilder>,
    path: Vec<Request>,
    monitors: HashMap<GuardId, Vec<Request>>,
}

impl SpecimenContext {
    /// Create context resolving through `root`
    #[inline]
    #[must_use]
    pub fn new(root: Arc<dyn SpecimenBuilder>) -> Self {
        Self {
            root,
            path: Vec::new(),
            monitors: HashMap::new(),
        }
    }

    /// Resolve a request through the graph root
    ///
    /// The request is on the path for the duration of the call and is
    /// popped whether or not resolution succeeds.
    ///
    /// # Errors
    /// Whatever the graph reports
    pub fn resolve(&mut self, request: &Request) -> SpecimenResult<Specimen> {
        let root = Arc::clone(&self.root);
        self.path.push(request.clone());
        tracing::trace!(depth = self.path.len(), %request, "resolving request");
        let result = root.create(request, self);
        self.path.pop();
        result
    }

    /// Resolve a value of `T`
    ///
    /// # Errors
    /// Resolution failures, or a typed-exit error when the graph produced
    /// null, omit, or a foreign value
    pub fn resolve_as<T: Shaped>(&mut self) -> SpecimenResult<T> {
        self.resolve(&Request::of::<T>())?.downcast()
    }

    /// Resolve many values of `T`
    ///
    /// # Errors
    /// See [`SpecimenContext::resolve_as`]
    pub fn resolve_many<T: Shaped>(&mut self) -> SpecimenResult<Vec<T>> {
        let request = Request::Multiple(MultipleRequest::new(Request::of::<T>()));
        self.resolve(&request)?
            .downcast::<SpecimenSequence>()?
            .downcast_all()
    }

    /// Requests currently being resolved, outermost first
    #[inline]
    #[must_use]
    pub fn path(&self) -> &[Request] {
        &self.path
    }

    /// Current nesting depth
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Path rendered for diagnostics
    #[must_use]
    pub fn path_strings(&self) -> Vec<String> {
        self.path.iter().map(ToString::to_string).collect()
    }

    /// In-flight requests monitored by one recursion guard
    pub(crate) fn monitor(&mut self, guard: GuardId) -> &mut Vec<Request> {
        self.monitors.entry(guard).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpecimenError;

    #[derive(Debug)]
    struct PathRecorder;

    impl SpecimenBuilder for PathRecorder {
        fn create(
            &self,
            request: &Request,
            context: &mut SpecimenContext,
        ) -> SpecimenResult<Specimen> {
            if request.is_type::<u8>() {
                return Ok(Specimen::value(u8::try_from(context.depth()).unwrap_or(0)));
            }
            if request.is_type::<(u8, u8)>() {
                let depth = u8::try_from(context.depth()).unwrap_or(0);
                let nested: u8 = context.resolve_as()?;
                return Ok(Specimen::value((depth, nested)));
            }
            Err(SpecimenError::Unresolved {
                request: request.to_string(),
                path: context.path_strings(),
            })
        }
    }

    #[test]
    fn nested_resolution_re_enters_root() {
        let mut ctx = SpecimenContext::new(Arc::new(PathRecorder));
        let pair: (u8, u8) = ctx.resolve_as().unwrap();
        assert_eq!(pair, (1, 2));
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn path_is_popped_on_error() {
        let mut ctx = SpecimenContext::new(Arc::new(PathRecorder));
        let err = ctx.resolve(&Request::of::<String>()).unwrap_err();
        assert_eq!(err.path(), &["String".to_string()]);
        assert!(ctx.path().is_empty());
    }
}
