//! Request tracing
//!
//! [`TracingBuilder`] reports each request entering the graph and the
//! outcome leaving it through `tracing`, indented by nesting depth.

use crate::builder::{CompositeSpecimenBuilder, SpecimenBuilder};
use crate::context::SpecimenContext;
use crate::error::SpecimenResult;
use crate::node::SpecimenBuilderNode;
use crate::request::Request;
use crate::specimen::Specimen;
use std::sync::Arc;

/// Logs requests and outcomes of the wrapped builder
#[derive(Debug, Clone)]
pub struct TracingBuilder {
    builder: Arc<dyn SpecimenBuilder>,
}

impl TracingBuilder {
    /// Trace `builder`
    #[inline]
    #[must_use]
    pub fn new(builder: Arc<dyn SpecimenBuilder>) -> Self {
        Self { builder }
    }
}

impl SpecimenBuilder for TracingBuilder {
    fn create(&self, request: &Request, context: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let depth = context.depth();
        let indent = depth.saturating_sub(1) * 2;
        tracing::debug!(depth, "{:indent$}requested: {request}", "");
        let result = self.builder.create(request, context);
        match &result {
            Ok(specimen) => tracing::debug!(depth, "{:indent$}created: {specimen:?}", ""),
            Err(err) => tracing::debug!(depth, error = %err, "{:indent$}failed: {request}", ""),
        }
        result
    }

    fn as_node(&self) -> Option<&dyn SpecimenBuilderNode> {
        Some(self)
    }
}

impl SpecimenBuilderNode for TracingBuilder {
    fn children(&self) -> Vec<Arc<dyn SpecimenBuilder>> {
        vec![Arc::clone(&self.builder)]
    }

    fn compose(&self, children: Vec<Arc<dyn SpecimenBuilder>>) -> Arc<dyn SpecimenBuilder> {
        Arc::new(Self::new(CompositeSpecimenBuilder::compose_all(children)))
    }
}
