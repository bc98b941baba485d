//! Builder graph nodes and structural rewriting
//!
//! The graph is immutable. A node exposes its children and can compose a
//! new node of the same kind around different children; every mutation
//! is a pure rewrite producing a new root, with untouched subtrees shared
//! between the old and new graphs.

use crate::builder::{AsAny, CompositeSpecimenBuilder, SpecimenBuilder};
use crate::context::SpecimenContext;
use crate::error::{SpecimenError, SpecimenResult};
use crate::request::Request;
use crate::specimen::Specimen;
use std::any::Any;
use std::sync::Arc;

/// Builder that owns child builders
pub trait SpecimenBuilderNode: SpecimenBuilder {
    /// Direct children in priority order
    fn children(&self) -> Vec<Arc<dyn SpecimenBuilder>>;

    /// New node of the same kind wrapping `children`; never mutates `self`
    fn compose(&self, children: Vec<Arc<dyn SpecimenBuilder>>) -> Arc<dyn SpecimenBuilder>;
}

/// Check the concrete type of a node
#[inline]
#[must_use]
pub fn node_is<T: Any>(node: &dyn SpecimenBuilderNode) -> bool {
    AsAny::as_any(node).is::<T>()
}

/// Borrow a node as its concrete type
#[inline]
#[must_use]
pub fn downcast_node<T: Any>(node: &dyn SpecimenBuilderNode) -> Option<&T> {
    AsAny::as_any(node).downcast_ref::<T>()
}

/// Replace every node matching `when` with the output of `with`
///
/// Depth-first and pre-order: a matching node is replaced whole and its
/// replacement is not visited again. Leaves are left untouched. When
/// nothing matches, the very same root is returned.
pub fn replace_nodes<W, P>(graph: &Arc<dyn SpecimenBuilder>, with: &W, when: &P) -> Arc<dyn SpecimenBuilder>
where
    W: Fn(&Arc<dyn SpecimenBuilder>) -> Arc<dyn SpecimenBuilder>,
    P: Fn(&dyn SpecimenBuilderNode) -> bool,
{
    let Some(node) = graph.as_node() else {
        return Arc::clone(graph);
    };
    if when(node) {
        return with(graph);
    }

    let children = node.children();
    let mut changed = false;
    let replaced: Vec<Arc<dyn SpecimenBuilder>> = children
        .iter()
        .map(|child| {
            let next = replace_nodes(child, with, when);
            changed |= !Arc::ptr_eq(&next, child);
            next
        })
        .collect();

    if changed {
        node.compose(replaced)
    } else {
        Arc::clone(graph)
    }
}

/// Every node matching `when`, depth-first
#[must_use]
pub fn find_nodes<P>(graph: &Arc<dyn SpecimenBuilder>, when: &P) -> Vec<Arc<dyn SpecimenBuilder>>
where
    P: Fn(&dyn SpecimenBuilderNode) -> bool,
{
    let mut found = Vec::new();
    collect_nodes(graph, when, &mut found);
    found
}

fn collect_nodes<P>(
    graph: &Arc<dyn SpecimenBuilder>,
    when: &P,
    found: &mut Vec<Arc<dyn SpecimenBuilder>>,
) where
    P: Fn(&dyn SpecimenBuilderNode) -> bool,
{
    let Some(node) = graph.as_node() else {
        return;
    };
    if when(node) {
        found.push(Arc::clone(graph));
    }
    for child in node.children() {
        collect_nodes(&child, when, found);
    }
}

/// The unique node matching `when`
///
/// # Errors
/// `InvalidGraph` when no node or more than one node matches
pub fn find_single_node<P>(
    graph: &Arc<dyn SpecimenBuilder>,
    when: &P,
) -> SpecimenResult<Arc<dyn SpecimenBuilder>>
where
    P: Fn(&dyn SpecimenBuilderNode) -> bool,
{
    let mut found = find_nodes(graph, when);
    match found.len() {
        1 => found
            .pop()
            .ok_or_else(|| SpecimenError::InvalidGraph("marker node vanished".to_string())),
        0 => Err(SpecimenError::InvalidGraph(
            "no node matches the marker".to_string(),
        )),
        n => Err(SpecimenError::InvalidGraph(format!(
            "{n} nodes match the marker, expected exactly one"
        ))),
    }
}

/// Swap the children of the unique node matching `when`
///
/// # Errors
/// `InvalidGraph` unless exactly one node matches
pub fn replace_node_children<P>(
    graph: &Arc<dyn SpecimenBuilder>,
    when: &P,
    children: Vec<Arc<dyn SpecimenBuilder>>,
) -> SpecimenResult<Arc<dyn SpecimenBuilder>>
where
    P: Fn(&dyn SpecimenBuilderNode) -> bool,
{
    find_single_node(graph, when)?;
    Ok(replace_nodes(
        graph,
        &|target: &Arc<dyn SpecimenBuilder>| match target.as_node() {
            Some(node) => node.compose(children.clone()),
            None => Arc::clone(target),
        },
        when,
    ))
}

pub(crate) fn first_resolved(
    builders: &[Arc<dyn SpecimenBuilder>],
    request: &Request,
    context: &mut SpecimenContext,
) -> SpecimenResult<Specimen> {
    for builder in builders {
        let specimen = builder.create(request, context)?;
        if specimen.is_resolved() {
            return Ok(specimen);
        }
    }
    Ok(Specimen::NoSpecimen)
}

macro_rules! marker_composite {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            builders: Vec<Arc<dyn SpecimenBuilder>>,
        }

        impl $name {
            /// Create marker over `builders`
            #[inline]
            #[must_use]
            pub fn new(builders: Vec<Arc<dyn SpecimenBuilder>>) -> Self {
                Self { builders }
            }

            /// Builders in priority order
            #[inline]
            #[must_use]
            pub fn builders(&self) -> &[Arc<dyn SpecimenBuilder>] {
                &self.builders
            }
        }

        impl SpecimenBuilder for $name {
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

        impl SpecimenBuilderNode for $name {
            fn children(&self) -> Vec<Arc<dyn SpecimenBuilder>> {
                self.builders.clone()
            }

            fn compose(
                &self,
                children: Vec<Arc<dyn SpecimenBuilder>>,
            ) -> Arc<dyn SpecimenBuilder> {
                Arc::new(Self::new(children))
            }
        }
    };
}

marker_composite! {
    /// Composite holding user customizations; index 0 has the highest priority
    CustomizationNode
}

marker_composite! {
    /// Composite holding fallbacks tried after the engine declined
    ResidueCollectorNode
}

/// Marks the engine so auto-properties can wrap and unwrap it
#[derive(Debug, Clone)]
pub struct AutoPropertiesTarget {
    builder: Arc<dyn SpecimenBuilder>,
}

impl AutoPropertiesTarget {
    /// Mark `builder`
    #[inline]
    #[must_use]
    pub fn new(builder: Arc<dyn SpecimenBuilder>) -> Self {
        Self { builder }
    }

    /// Wrapped engine
    #[inline]
    #[must_use]
    pub fn builder(&self) -> &Arc<dyn SpecimenBuilder> {
        &self.builder
    }
}

impl SpecimenBuilder for AutoPropertiesTarget {
    fn create(&self, request: &Request, context: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        self.builder.create(request, context)
    }

    fn as_node(&self) -> Option<&dyn SpecimenBuilderNode> {
        Some(self)
    }
}

impl SpecimenBuilderNode for AutoPropertiesTarget {
    fn children(&self) -> Vec<Arc<dyn SpecimenBuilder>> {
        vec![Arc::clone(&self.builder)]
    }

    fn compose(&self, children: Vec<Arc<dyn SpecimenBuilder>>) -> Arc<dyn SpecimenBuilder> {
        Arc::new(Self::new(CompositeSpecimenBuilder::compose_all(children)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{builder_is, downcast_builder, FixedBuilder, NoSpecimenBuilder};

    fn sample_graph() -> Arc<dyn SpecimenBuilder> {
        Arc::new(CompositeSpecimenBuilder::new(vec![
            Arc::new(CustomizationNode::new(vec![Arc::new(FixedBuilder::new(1_u8))])),
            Arc::new(AutoPropertiesTarget::new(Arc::new(NoSpecimenBuilder))),
            Arc::new(ResidueCollectorNode::default()),
        ]))
    }

    fn is_customizations(node: &dyn SpecimenBuilderNode) -> bool {
        node_is::<CustomizationNode>(node)
    }

    #[test]
    fn unmatched_rewrite_returns_same_root() {
        let graph = sample_graph();
        let same = replace_nodes(
            &graph,
            &|n: &Arc<dyn SpecimenBuilder>| Arc::clone(n),
            &|_: &dyn SpecimenBuilderNode| false,
        );
        assert!(Arc::ptr_eq(&graph, &same));
    }

    #[test]
    fn rewrite_shares_untouched_siblings() {
        let graph = sample_graph();
        let rewritten = replace_node_children(&graph, &is_customizations, vec![]).unwrap();

        let before = graph.as_node().unwrap().children();
        let after = rewritten.as_node().unwrap().children();
        assert!(!Arc::ptr_eq(&before[0], &after[0]));
        assert!(Arc::ptr_eq(&before[1], &after[1]));
        assert!(Arc::ptr_eq(&before[2], &after[2]));
    }

    #[test]
    fn matched_nodes_are_not_revisited() {
        let graph = sample_graph();
        let wrapped = replace_nodes(
            &graph,
            &|n: &Arc<dyn SpecimenBuilder>| {
                Arc::new(CustomizationNode::new(vec![Arc::clone(n)])) as Arc<dyn SpecimenBuilder>
            },
            &is_customizations,
        );
        assert_eq!(find_nodes(&wrapped, &is_customizations).len(), 2);
    }

    #[test]
    fn find_single_node_requires_uniqueness() {
        let graph = sample_graph();
        let found = find_single_node(&graph, &is_customizations).unwrap();
        assert!(builder_is::<CustomizationNode>(found.as_ref()));

        let missing = find_single_node(&graph, &|n: &dyn SpecimenBuilderNode| {
            node_is::<FixedBuilder>(n)
        });
        assert!(matches!(missing, Err(SpecimenError::InvalidGraph(_))));

        let doubled: Arc<dyn SpecimenBuilder> = Arc::new(CompositeSpecimenBuilder::new(vec![
            Arc::new(CustomizationNode::default()),
            Arc::new(CustomizationNode::default()),
        ]));
        assert!(find_single_node(&doubled, &is_customizations).is_err());
        assert!(replace_node_children(&doubled, &is_customizations, vec![]).is_err());
    }

    #[test]
    fn marker_composes_new_children() {
        let graph = sample_graph();
        let rewritten = replace_node_children(
            &graph,
            &is_customizations,
            vec![Arc::new(FixedBuilder::new(2_u8)), Arc::new(FixedBuilder::new(3_u8))],
        )
        .unwrap();
        let node = find_single_node(&rewritten, &is_customizations).unwrap();
        let node = downcast_builder::<CustomizationNode>(node.as_ref()).unwrap();
        assert_eq!(node.builders().len(), 2);
    }

    #[test]
    fn marker_resolves_first_child() {
        let node = CustomizationNode::new(vec![
            Arc::new(NoSpecimenBuilder),
            Arc::new(FixedBuilder::new(5_u8)),
        ]);
        let mut ctx = SpecimenContext::new(Arc::new(NoSpecimenBuilder));
        let specimen = node.create(&Request::of::<u8>(), &mut ctx).unwrap();
        assert_eq!(specimen.downcast::<u8>().unwrap(), 5);
    }
}
