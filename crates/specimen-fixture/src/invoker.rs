//! Constructor selection and invocation

use specimen_core::{
    Constructor, ParameterRequest, Request, Shape, Specimen, SpecimenBuilder, SpecimenContext,
    SpecimenResult, StructShape,
};
use std::fmt;
use std::sync::Arc;

/// Orders the constructors of a struct shape for invocation
pub trait ConstructorQuery: Send + Sync + fmt::Debug {
    /// Constructors to try, most preferred first
    fn select(&self, shape: &StructShape) -> Vec<Constructor>;
}

/// Fewest parameters first
#[derive(Debug, Clone, Copy, Default)]
pub struct ModestConstructorQuery;

impl ConstructorQuery for ModestConstructorQuery {
    fn select(&self, shape: &StructShape) -> Vec<Constructor> {
        let mut constructors = shape.constructors().to_vec();
        constructors.sort_by_key(Constructor::arity);
        constructors
    }
}

/// Most parameters first
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyConstructorQuery;

impl ConstructorQuery for GreedyConstructorQuery {
    fn select(&self, shape: &StructShape) -> Vec<Constructor> {
        let mut constructors = shape.constructors().to_vec();
        constructors.sort_by_key(|c| std::cmp::Reverse(c.arity()));
        constructors
    }
}

/// Creates structs by resolving constructor parameters
///
/// Constructors are tried in query order. A parameter that resolves to
/// omit or no specimen disqualifies its constructor and the next one is
/// tried; errors propagate immediately.
#[derive(Debug, Clone)]
pub struct MethodInvoker {
    query: Arc<dyn ConstructorQuery>,
}

impl MethodInvoker {
    /// Invoker using `query`
    #[inline]
    #[must_use]
    pub fn new(query: Arc<dyn ConstructorQuery>) -> Self {
        Self { query }
    }

    /// Invoker preferring the smallest constructor
    #[inline]
    #[must_use]
    pub fn modest() -> Self {
        Self::new(Arc::new(ModestConstructorQuery))
    }

    /// Invoker preferring the largest constructor
    #[inline]
    #[must_use]
    pub fn greedy() -> Self {
        Self::new(Arc::new(GreedyConstructorQuery))
    }
}

impl Default for MethodInvoker {
    fn default() -> Self {
        Self::modest()
    }
}

impl SpecimenBuilder for MethodInvoker {
    fn create(&self, request: &Request, context: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let Some(owner) = request.as_type() else {
            return Ok(Specimen::NoSpecimen);
        };
        let Shape::Struct(shape) = owner.shape() else {
            return Ok(Specimen::NoSpecimen);
        };

        'constructors: for constructor in self.query.select(&shape) {
            let mut arguments = Vec::with_capacity(constructor.arity());
            for (position, parameter) in constructor.parameters().iter().enumerate() {
                let parameter_request = Request::Parameter(ParameterRequest {
                    owner,
                    name: parameter.name(),
                    position,
                    key: parameter.key(),
                });
                match context.resolve(&parameter_request)?.into_argument() {
                    Some(argument) => arguments.push(argument),
                    None => {
                        tracing::trace!(%owner, parameter = parameter.name(), "constructor disqualified");
                        continue 'constructors;
                    }
                }
            }
            return constructor.invoke(arguments).map(Specimen::Value);
        }
        Ok(Specimen::NoSpecimen)
    }
}
