//! Specimen Core - the specimen builder graph
//!
//! The engine behind anonymous test-data generation:
//! - Describes requests for values as a closed set of request kinds
//! - Resolves requests through an immutable graph of builders
//! - Rewrites the graph structurally for every configuration change
//! - Guards against cyclic object graphs with per-call recursion tracking
//! - Postprocesses created values (auto-properties, bindings, actions)
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use specimen_core::{
//!     CompositeSpecimenBuilder, ExactTypeSpecification, FilteringSpecimenBuilder, FixedBuilder,
//!     SpecimenBuilder, SpecimenContext, TerminatingSpecimenBuilder,
//! };
//!
//! let graph: Arc<dyn SpecimenBuilder> = Arc::new(CompositeSpecimenBuilder::new(vec![
//!     Arc::new(FilteringSpecimenBuilder::new(
//!         Arc::new(FixedBuilder::new(42_u32)),
//!         Arc::new(ExactTypeSpecification::of::<u32>()),
//!     )),
//!     Arc::new(TerminatingSpecimenBuilder),
//! ]));
//!
//! let mut context = SpecimenContext::new(graph);
//! assert_eq!(context.resolve_as::<u32>().unwrap(), 42);
//! assert!(context.resolve_as::<String>().unwrap_err().is_unresolved());
//! ```

#![warn(unreachable_pub)]

pub mod behavior;
pub mod builder;
pub mod context;
pub mod error;
pub mod node;
pub mod postprocess;
pub mod recursion;
pub mod request;
pub mod shape;
pub mod specification;
pub mod specimen;
pub mod trace;

// Re-exports for convenience
pub use behavior::{
    behavior_is, is_recursion_behavior, BehaviorRoot, NullRecursionBehavior,
    OmitOnRecursionBehavior, SpecimenBuilderTransformation, ThrowingRecursionBehavior,
    TracingBehavior,
};
pub use builder::{
    builder_is, downcast_builder, AsAny, CompositeSpecimenBuilder, FactoryBuilder,
    FilteringSpecimenBuilder, FixedBuilder, NoSpecimenBuilder, SpecimenBuilder,
    TerminatingSpecimenBuilder,
};
pub use context::{GuardId, SpecimenContext};
pub use error::{SpecimenError, SpecimenResult};
pub use node::{
    downcast_node, find_nodes, find_single_node, node_is, replace_node_children, replace_nodes,
    AutoPropertiesTarget, CustomizationNode, ResidueCollectorNode, SpecimenBuilderNode,
};
pub use postprocess::{
    ActionCommand, AutoPropertiesCommand, BindingCommand, BindingValue, CompositeCommand,
    Postprocessor, SpecimenCommand,
};
pub use recursion::{
    NullRecursionHandler, OmitOnRecursionHandler, RecursionGuard, RecursionHandler,
    RequestComparer, SameTypeRequestComparer, StructuralRequestComparer,
    ThrowingRecursionHandler,
};
pub use request::{
    ConstrainedStringRequest, FiniteSequenceRequest, MultipleRequest, ParameterRequest,
    PropertyRequest, RangedNumberRequest, RegularExpressionRequest, Request, Seed,
    SeededRequest,
};
pub use shape::{
    downcast_value, short_type_name, Arguments, Constructor, EnumShape, MapShape, NumericKind,
    Parameter, Primitive, Property, SequenceShape, Shape, Shaped, StructShape, TypeKey, Value,
    WrapperShape,
};
pub use specification::{
    AndRequestSpecification, AnyTypeSpecification, ExactTypeSpecification,
    InverseRequestSpecification, OrRequestSpecification, PredicateSpecification,
    RequestSpecification, TrueRequestSpecification,
};
pub use specimen::{Specimen, SpecimenSequence};
pub use trace::TracingBuilder;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for writing builders
    pub use crate::{
        Request, Shape, Shaped, Specimen, SpecimenBuilder, SpecimenContext, SpecimenError,
        SpecimenResult, TypeKey,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Chain {
        next: Box<Chain>,
    }

    impl Shaped for Chain {
        fn shape() -> Shape {
            Shape::Struct(StructShape::new().constructor(Constructor::new(
                vec![Parameter::new::<Chain>("next")],
                |args| {
                    Ok(Chain {
                        next: Box::new(args.take()?),
                    })
                },
            )))
        }
    }

    /// Minimal constructor relay for struct shapes
    #[derive(Debug)]
    struct Construct;

    impl SpecimenBuilder for Construct {
        fn create(&self, request: &Request, context: &mut SpecimenContext) -> SpecimenResult<Specimen> {
            let Some(key) = request.as_type() else {
                return Ok(Specimen::NoSpecimen);
            };
            let Shape::Struct(shape) = key.shape() else {
                return Ok(Specimen::NoSpecimen);
            };
            let ctor = &shape.constructors()[0];
            let mut args = Vec::new();
            for (position, p) in ctor.parameters().iter().enumerate() {
                let request = Request::Parameter(ParameterRequest {
                    owner: key,
                    name: p.name(),
                    position,
                    key: p.key(),
                });
                match context.resolve(&request)?.into_argument() {
                    Some(arg) => args.push(arg),
                    None => return Ok(Specimen::NoSpecimen),
                }
            }
            ctor.invoke(args).map(Specimen::Value)
        }
    }

    #[derive(Debug)]
    struct ParameterToType;

    impl SpecimenBuilder for ParameterToType {
        fn create(&self, request: &Request, context: &mut SpecimenContext) -> SpecimenResult<Specimen> {
            match request {
                Request::Parameter(p) => context.resolve(&Request::Type(p.key)),
                _ => Ok(Specimen::NoSpecimen),
            }
        }
    }

    fn graph(behaviors: Vec<Arc<dyn SpecimenBuilderTransformation>>) -> Arc<dyn SpecimenBuilder> {
        let core: Arc<dyn SpecimenBuilder> = Arc::new(CompositeSpecimenBuilder::new(vec![
            Arc::new(CustomizationNode::default()),
            Arc::new(AutoPropertiesTarget::new(Arc::new(CompositeSpecimenBuilder::new(vec![
                Arc::new(Construct),
                Arc::new(ParameterToType),
            ])))),
            Arc::new(ResidueCollectorNode::default()),
            Arc::new(TerminatingSpecimenBuilder),
        ]));
        Arc::new(BehaviorRoot::new(core, behaviors))
    }

    #[test]
    fn self_reference_fails_fast_with_path() {
        let mut ctx = SpecimenContext::new(graph(vec![Arc::new(ThrowingRecursionBehavior)]));
        let err = ctx.resolve(&Request::of::<Chain>()).unwrap_err();
        assert!(err.is_recursion());
        let chains = err.path().iter().filter(|p| p.as_str() == "Chain").count();
        assert!(chains > 1);
        assert!(err.to_string().contains("Chain -> Chain(next: Chain) -> Chain"));
    }

    #[test]
    fn omit_policy_disqualifies_the_constructor() {
        let mut ctx = SpecimenContext::new(graph(vec![Arc::new(OmitOnRecursionBehavior::new())]));
        let err = ctx.resolve(&Request::of::<Chain>()).unwrap_err();
        assert!(err.is_unresolved());
        assert_eq!(err.path(), &["Chain".to_string()]);
    }

    #[test]
    fn customization_rewrite_takes_priority() {
        let original = graph(vec![Arc::new(ThrowingRecursionBehavior)]);
        let customized = replace_node_children(
            &original,
            &|n: &dyn SpecimenBuilderNode| node_is::<CustomizationNode>(n),
            vec![Arc::new(FilteringSpecimenBuilder::new(
                Arc::new(FixedBuilder::new(5_u64)),
                Arc::new(ExactTypeSpecification::of::<u64>()),
            ))],
        )
        .unwrap();

        let mut ctx = SpecimenContext::new(customized);
        assert_eq!(ctx.resolve_as::<u64>().unwrap(), 5);

        let mut ctx = SpecimenContext::new(original);
        assert!(ctx.resolve_as::<u64>().unwrap_err().is_unresolved());
    }
}
