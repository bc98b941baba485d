//! Live list views over the fixture graph
//!
//! Views hold no state of their own. Reads look at the current graph;
//! writes rebuild it around the changed list and swap it in.

use crate::fixture::Fixture;
use specimen_core::{
    downcast_builder, find_single_node, replace_node_children, BehaviorRoot, SpecimenBuilder,
    SpecimenBuilderNode, SpecimenBuilderTransformation, SpecimenError, SpecimenResult,
};
use std::fmt;
use std::sync::Arc;

type Marker = fn(&dyn SpecimenBuilderNode) -> bool;

/// Builders held by one marker node of the fixture graph
#[derive(Clone, Copy)]
pub struct BuilderListView<'f> {
    fixture: &'f Fixture,
    name: &'static str,
    marker: Marker,
}

impl fmt::Debug for BuilderListView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuilderListView")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish()
    }
}

impl<'f> BuilderListView<'f> {
    pub(crate) fn new(fixture: &'f Fixture, name: &'static str, marker: Marker) -> Self {
        Self {
            fixture,
            name,
            marker,
        }
    }

    /// Current builders in priority order
    ///
    /// # Errors
    /// `InvalidGraph` when the marker node is missing or duplicated
    pub fn to_vec(&self) -> SpecimenResult<Vec<Arc<dyn SpecimenBuilder>>> {
        let node = find_single_node(&self.fixture.graph(), &self.marker)?;
        Ok(node.as_node().map(|node| node.children()).unwrap_or_default())
    }

    /// Number of builders
    #[must_use]
    pub fn len(&self) -> usize {
        self.to_vec().map_or(0, |builders| builders.len())
    }

    /// Check if the list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert `builder` at `index`; index 0 is tried first
    ///
    /// # Errors
    /// `InvalidArgument` when `index` is past the end
    pub fn insert(&self, index: usize, builder: Arc<dyn SpecimenBuilder>) -> SpecimenResult<()> {
        self.modify(|builders| {
            if index > builders.len() {
                return Err(out_of_range(index, builders.len()));
            }
            builders.insert(index, builder);
            Ok(())
        })
    }

    /// Append `builder`; it is tried last
    ///
    /// # Errors
    /// `InvalidGraph` when the marker node is missing or duplicated
    pub fn push(&self, builder: Arc<dyn SpecimenBuilder>) -> SpecimenResult<()> {
        self.modify(|builders| {
            builders.push(builder);
            Ok(())
        })
    }

    /// Remove and return the builder at `index`
    ///
    /// # Errors
    /// `InvalidArgument` when `index` is out of range
    pub fn remove(&self, index: usize) -> SpecimenResult<Arc<dyn SpecimenBuilder>> {
        self.modify(|builders| {
            if index >= builders.len() {
                return Err(out_of_range(index, builders.len()));
            }
            Ok(builders.remove(index))
        })
    }

    /// Keep only the builders matching `keep`
    ///
    /// # Errors
    /// `InvalidGraph` when the marker node is missing or duplicated
    pub fn retain<F>(&self, mut keep: F) -> SpecimenResult<()>
    where
        F: FnMut(&dyn SpecimenBuilder) -> bool,
    {
        self.modify(|builders| {
            builders.retain(|builder| keep(builder.as_ref()));
            Ok(())
        })
    }

    /// Remove every builder
    ///
    /// # Errors
    /// `InvalidGraph` when the marker node is missing or duplicated
    pub fn clear(&self) -> SpecimenResult<()> {
        self.modify(|builders| {
            builders.clear();
            Ok(())
        })
    }

    fn modify<R, F>(&self, change: F) -> SpecimenResult<R>
    where
        F: FnOnce(&mut Vec<Arc<dyn SpecimenBuilder>>) -> SpecimenResult<R>,
    {
        self.fixture.rewrite(self.name, |graph| {
            let node = find_single_node(graph, &self.marker)?;
            let mut builders = node
                .as_node()
                .map(|node| node.children())
                .unwrap_or_default();
            let output = change(&mut builders)?;
            let next = replace_node_children(graph, &self.marker, builders)?;
            Ok((next, output))
        })
    }
}

/// Behaviors decorating the fixture graph
///
/// The first behavior wraps the graph first, so the last one is outermost.
#[derive(Clone, Copy)]
pub struct BehaviorListView<'f> {
    fixture: &'f Fixture,
}

impl fmt::Debug for BehaviorListView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.to_vec().unwrap_or_default()).finish()
    }
}

impl<'f> BehaviorListView<'f> {
    pub(crate) fn new(fixture: &'f Fixture) -> Self {
        Self { fixture }
    }

    /// Current behaviors in application order
    ///
    /// # Errors
    /// `InvalidGraph` when the graph root carries no behaviors
    pub fn to_vec(&self) -> SpecimenResult<Vec<Arc<dyn SpecimenBuilderTransformation>>> {
        let graph = self.fixture.graph();
        Ok(behavior_root(&graph)?.behaviors().to_vec())
    }

    /// Number of behaviors
    #[must_use]
    pub fn len(&self) -> usize {
        self.to_vec().map_or(0, |behaviors| behaviors.len())
    }

    /// Check if no behavior is applied
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if any behavior matches `predicate`
    #[must_use]
    pub fn any<F>(&self, predicate: F) -> bool
    where
        F: FnMut(&Arc<dyn SpecimenBuilderTransformation>) -> bool,
    {
        self.to_vec()
            .map(|behaviors| behaviors.iter().any(predicate))
            .unwrap_or(false)
    }

    /// Insert `behavior` at `index`
    ///
    /// # Errors
    /// `InvalidArgument` when `index` is past the end
    pub fn insert(
        &self,
        index: usize,
        behavior: Arc<dyn SpecimenBuilderTransformation>,
    ) -> SpecimenResult<()> {
        self.modify(|behaviors| {
            if index > behaviors.len() {
                return Err(out_of_range(index, behaviors.len()));
            }
            behaviors.insert(index, behavior);
            Ok(())
        })
    }

    /// Append `behavior`; it becomes outermost
    ///
    /// # Errors
    /// `InvalidGraph` when the graph root carries no behaviors
    pub fn push(&self, behavior: Arc<dyn SpecimenBuilderTransformation>) -> SpecimenResult<()> {
        self.modify(|behaviors| {
            behaviors.push(behavior);
            Ok(())
        })
    }

    /// Remove and return the behavior at `index`
    ///
    /// # Errors
    /// `InvalidArgument` when `index` is out of range
    pub fn remove(&self, index: usize) -> SpecimenResult<Arc<dyn SpecimenBuilderTransformation>> {
        self.modify(|behaviors| {
            if index >= behaviors.len() {
                return Err(out_of_range(index, behaviors.len()));
            }
            Ok(behaviors.remove(index))
        })
    }

    /// Keep only the behaviors matching `keep`
    ///
    /// # Errors
    /// `InvalidGraph` when the graph root carries no behaviors
    pub fn retain<F>(&self, mut keep: F) -> SpecimenResult<()>
    where
        F: FnMut(&dyn SpecimenBuilderTransformation) -> bool,
    {
        self.modify(|behaviors| {
            behaviors.retain(|behavior| keep(behavior.as_ref()));
            Ok(())
        })
    }

    /// Remove every behavior
    ///
    /// # Errors
    /// `InvalidGraph` when the graph root carries no behaviors
    pub fn clear(&self) -> SpecimenResult<()> {
        self.modify(|behaviors| {
            behaviors.clear();
            Ok(())
        })
    }

    fn modify<R, F>(&self, change: F) -> SpecimenResult<R>
    where
        F: FnOnce(&mut Vec<Arc<dyn SpecimenBuilderTransformation>>) -> SpecimenResult<R>,
    {
        self.fixture.rewrite("behaviors", |graph| {
            let root = behavior_root(graph)?;
            let mut behaviors = root.behaviors().to_vec();
            let output = change(&mut behaviors)?;
            let next: Arc<dyn SpecimenBuilder> = Arc::new(root.with_behaviors(behaviors));
            Ok((next, output))
        })
    }
}

fn behavior_root(graph: &Arc<dyn SpecimenBuilder>) -> SpecimenResult<&BehaviorRoot> {
    downcast_builder::<BehaviorRoot>(graph.as_ref())
        .ok_or_else(|| SpecimenError::InvalidGraph("graph root carries no behaviors".into()))
}

fn out_of_range(index: usize, len: usize) -> SpecimenError {
    SpecimenError::invalid_argument(format!("index {index} out of range for {len} entries"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use specimen_core::{
        builder_is, is_recursion_behavior, FixedBuilder, NullRecursionBehavior, TracingBehavior,
    };

    #[test]
    fn customizations_start_empty() {
        let fixture = Fixture::new();
        assert!(fixture.customizations().is_empty());
        assert_eq!(fixture.residue_collectors().len(), 2);
    }

    #[test]
    fn inserted_builder_takes_priority() {
        let fixture = Fixture::new();
        fixture
            .customizations()
            .insert(0, Arc::new(FixedBuilder::new(7_u8)))
            .unwrap();
        assert_eq!(fixture.create::<u8>().unwrap(), 7);

        fixture
            .customizations()
            .insert(0, Arc::new(FixedBuilder::new(9_u8)))
            .unwrap();
        assert_eq!(fixture.create::<u8>().unwrap(), 9);

        let removed = fixture.customizations().remove(0).unwrap();
        assert!(builder_is::<FixedBuilder>(removed.as_ref()));
        assert_eq!(fixture.create::<u8>().unwrap(), 7);

        fixture.customizations().clear().unwrap();
        assert!(fixture.customizations().is_empty());
    }

    #[test]
    fn out_of_range_edits_leave_graph_untouched() {
        let fixture = Fixture::new();
        let before = fixture.graph();
        assert!(fixture
            .customizations()
            .insert(1, Arc::new(FixedBuilder::new(1_u8)))
            .is_err());
        assert!(fixture.customizations().remove(0).is_err());
        assert!(Arc::ptr_eq(&before, &fixture.graph()));
    }

    #[test]
    fn residue_collectors_can_be_cleared() {
        let fixture = Fixture::new();
        assert!(fixture.create::<Vec<u8>>().is_ok());
        fixture.residue_collectors().clear().unwrap();
        let err = fixture.create::<Vec<u8>>().unwrap_err();
        assert!(err.is_unresolved());
    }

    #[test]
    fn behaviors_can_be_swapped() {
        let fixture = Fixture::new();
        let behaviors = fixture.behaviors();
        assert_eq!(behaviors.len(), 1);

        behaviors.retain(|b| !is_recursion_behavior(b)).unwrap();
        behaviors.push(Arc::new(NullRecursionBehavior)).unwrap();
        behaviors.insert(0, Arc::new(TracingBehavior)).unwrap();
        assert_eq!(behaviors.len(), 2);
        assert!(behaviors.any(|b| is_recursion_behavior(b.as_ref())));

        let removed = behaviors.remove(0).unwrap();
        assert!(!is_recursion_behavior(removed.as_ref()));
        assert!(behaviors.remove(5).is_err());
    }

    #[test]
    fn customizations_survive_behavior_changes() {
        let fixture = Fixture::new();
        fixture
            .customizations()
            .push(Arc::new(FixedBuilder::new(3_u8)))
            .unwrap();
        fixture.behaviors().clear().unwrap();
        assert!(fixture.behaviors().is_empty());
        assert_eq!(fixture.create::<u8>().unwrap(), 3);
    }
}
