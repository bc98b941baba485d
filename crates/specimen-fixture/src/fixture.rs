//! The fixture facade
//!
//! A [`Fixture`] owns one immutable builder graph behind a lock:
//!
//! ```text
//! BehaviorRoot (recursion guard, tracing, ...)
//! └── Composite
//!     ├── CustomizationNode      newest customization first
//!     ├── Postprocessor(auto-properties)   absent while auto-properties are off
//!     │   └── AutoPropertiesTarget
//!     │       └── engine
//!     ├── ResidueCollectorNode   collection fallbacks
//!     └── Terminator
//! ```
//!
//! Every configuration change computes a new graph by structural rewrite
//! and swaps it in; resolutions already running keep their snapshot.

use crate::composer::Composer;
use crate::config::FixtureConfig;
use crate::customization::Customization;
use crate::engine::{default_engine, default_residue_collectors};
use crate::relays::RepeatCount;
use crate::views::{BehaviorListView, BuilderListView};
use parking_lot::RwLock;
use specimen_core::{
    downcast_node, find_nodes, find_single_node, node_is, replace_node_children, replace_nodes,
    AnyTypeSpecification,
    AutoPropertiesCommand, AutoPropertiesTarget, BehaviorRoot, CompositeSpecimenBuilder,
    CustomizationNode, FiniteSequenceRequest, Postprocessor, Request, ResidueCollectorNode, Seed,
    SeededRequest, Shaped, Specimen, SpecimenBuilder, SpecimenBuilderNode,
    SpecimenBuilderTransformation, SpecimenContext, SpecimenResult, SpecimenSequence,
    TerminatingSpecimenBuilder, ThrowingRecursionBehavior, TypeKey,
};
use std::sync::Arc;

/// Creates anonymous values of any [`Shaped`] type
#[derive(Debug)]
pub struct Fixture {
    graph: RwLock<Arc<dyn SpecimenBuilder>>,
    repeat: RepeatCount,
}

impl Fixture {
    /// Fixture with the default configuration
    #[must_use]
    pub fn new() -> Self {
        let config = FixtureConfig::default();
        let repeat = RepeatCount::default();
        let engine = default_engine(&config, &repeat);
        Self::assemble(engine, &config, Arc::new(ThrowingRecursionBehavior), repeat)
    }

    /// Fixture with `config`
    ///
    /// # Errors
    /// `InvalidArgument` when the configuration does not validate
    pub fn with_config(config: FixtureConfig) -> SpecimenResult<Self> {
        config.validate()?;
        let repeat = RepeatCount::new(config.repeat_count)?;
        let engine = default_engine(&config, &repeat);
        let behavior = config.recursion.behavior()?;
        Ok(Self::assemble(engine, &config, behavior, repeat))
    }

    /// Fixture around a custom engine
    ///
    /// The engine owns its own "many" handling, so
    /// [`set_repeat_count`](Self::set_repeat_count) only reaches engines
    /// built with [`repeat_handle`](Self::repeat_handle).
    ///
    /// # Errors
    /// `InvalidArgument` when the configuration does not validate
    pub fn with_engine(
        engine: Arc<dyn SpecimenBuilder>,
        config: FixtureConfig,
    ) -> SpecimenResult<Self> {
        config.validate()?;
        let repeat = RepeatCount::new(config.repeat_count)?;
        let behavior = config.recursion.behavior()?;
        Ok(Self::assemble(engine, &config, behavior, repeat))
    }

    fn assemble(
        engine: Arc<dyn SpecimenBuilder>,
        config: &FixtureConfig,
        behavior: Arc<dyn SpecimenBuilderTransformation>,
        repeat: RepeatCount,
    ) -> Self {
        let target: Arc<dyn SpecimenBuilder> = Arc::new(AutoPropertiesTarget::new(engine));
        let engine_stage = if config.omit_auto_properties {
            target
        } else {
            with_auto_properties(&target)
        };
        let core: Arc<dyn SpecimenBuilder> = Arc::new(CompositeSpecimenBuilder::new(vec![
            Arc::new(CustomizationNode::default()),
            engine_stage,
            Arc::new(ResidueCollectorNode::new(default_residue_collectors())),
            Arc::new(TerminatingSpecimenBuilder),
        ]));
        Self {
            graph: RwLock::new(Arc::new(BehaviorRoot::new(core, vec![behavior]))),
            repeat,
        }
    }

    /// Current graph snapshot
    #[must_use]
    pub fn graph(&self) -> Arc<dyn SpecimenBuilder> {
        Arc::clone(&self.graph.read())
    }

    /// Current graph with `builder` tried before every customization
    ///
    /// The installed graph is left untouched.
    pub(crate) fn graph_with(
        &self,
        builder: Arc<dyn SpecimenBuilder>,
    ) -> SpecimenResult<Arc<dyn SpecimenBuilder>> {
        let graph = self.graph();
        let node = find_single_node(&graph, &is_customizations)?;
        let mut builders = node
            .as_node()
            .map(|node| node.children())
            .unwrap_or_default();
        builders.insert(0, builder);
        replace_node_children(&graph, &is_customizations, builders)
    }

    /// Fresh resolution context over the current graph
    #[must_use]
    pub fn context(&self) -> SpecimenContext {
        SpecimenContext::new(self.graph())
    }

    /// Replace the graph with the output of `rewrite`
    pub(crate) fn rewrite<R, F>(&self, what: &'static str, rewrite: F) -> SpecimenResult<R>
    where
        F: FnOnce(&Arc<dyn SpecimenBuilder>) -> SpecimenResult<(Arc<dyn SpecimenBuilder>, R)>,
    {
        let mut graph = self.graph.write();
        let (next, output) = rewrite(&graph)?;
        if !Arc::ptr_eq(&graph, &next) {
            tracing::debug!(change = what, "fixture graph rewritten");
            *graph = next;
        }
        Ok(output)
    }

    /// Create an anonymous `T`
    ///
    /// # Errors
    /// Resolution failures: unresolved or recursive requests, constructor
    /// failures
    pub fn create<T: Shaped>(&self) -> SpecimenResult<T> {
        tracing::debug!(target_type = %TypeKey::of::<T>(), "creating specimen");
        self.context().resolve_as::<T>()
    }

    /// Create a `T` for a seeded request
    ///
    /// # Errors
    /// See [`create`](Self::create)
    pub fn create_seeded<T: Shaped>(&self, seed: impl Into<Seed>) -> SpecimenResult<T> {
        let request = Request::Seeded(SeededRequest::new(TypeKey::of::<T>(), seed));
        self.resolve(&request)?.downcast()
    }

    /// Create [`repeat_count`](Self::repeat_count) values of `T`
    ///
    /// # Errors
    /// See [`create`](Self::create)
    pub fn create_many<T: Shaped>(&self) -> SpecimenResult<Vec<T>> {
        self.context().resolve_many::<T>()
    }

    /// Create exactly `count` values of `T`, fewer if items were omitted
    ///
    /// # Errors
    /// See [`create`](Self::create)
    pub fn create_many_n<T: Shaped>(&self, count: usize) -> SpecimenResult<Vec<T>> {
        let request = Request::FiniteSequence(FiniteSequenceRequest::new(TypeKey::of::<T>(), count));
        self.resolve(&request)?
            .downcast::<SpecimenSequence>()?
            .downcast_all()
    }

    /// Resolve an arbitrary request
    ///
    /// # Errors
    /// See [`create`](Self::create)
    pub fn resolve(&self, request: &Request) -> SpecimenResult<Specimen> {
        self.context().resolve(request)
    }

    /// Customize how `T` is created; the newest customization wins
    ///
    /// # Errors
    /// `UnknownMember` or `TypeMismatch` for invalid member bindings
    pub fn customize<T, F>(&self, compose: F) -> SpecimenResult<()>
    where
        T: Shaped,
        F: for<'f> FnOnce(Composer<'f, T>) -> Composer<'f, T>,
    {
        let builder = compose(Composer::new(self)).into_builder()?;
        self.customizations().insert(0, builder)
    }

    /// Apply a customization
    ///
    /// # Errors
    /// Whatever the customization reports
    pub fn customize_with(&self, customization: &dyn Customization) -> SpecimenResult<()> {
        tracing::debug!(?customization, "applying customization");
        customization.customize(self)
    }

    /// Create `T` with `factory`, skipping auto-properties
    ///
    /// # Errors
    /// See [`customize`](Self::customize)
    pub fn register<T, F>(&self, factory: F) -> SpecimenResult<()>
    where
        T: Shaped,
        F: Fn(&mut SpecimenContext) -> SpecimenResult<T> + Send + Sync + 'static,
    {
        self.customize::<T, _>(|composer| composer.from_factory(factory).omit_auto_properties())
    }

    /// Always answer `T` with a clone of `value`
    ///
    /// # Errors
    /// See [`customize`](Self::customize)
    pub fn inject<T>(&self, value: T) -> SpecimenResult<()>
    where
        T: Shaped + Clone + Sync,
    {
        self.register(move |_| Ok(value.clone()))
    }

    /// Create a `T` and answer every later `T` request with it
    ///
    /// # Errors
    /// See [`create`](Self::create)
    pub fn freeze<T>(&self) -> SpecimenResult<T>
    where
        T: Shaped + Clone + Sync,
    {
        let value = self.create::<T>()?;
        self.inject(value.clone())?;
        Ok(value)
    }

    /// Compose a one-off recipe for `T`
    #[must_use]
    pub fn build<T: Shaped>(&self) -> Composer<'_, T> {
        Composer::new(self)
    }

    /// Customizations, newest first
    #[must_use]
    pub fn customizations(&self) -> BuilderListView<'_> {
        BuilderListView::new(self, "customizations", is_customizations)
    }

    /// Fallbacks tried after the engine
    #[must_use]
    pub fn residue_collectors(&self) -> BuilderListView<'_> {
        BuilderListView::new(self, "residue collectors", is_residue_collectors)
    }

    /// Behaviors decorating the whole graph, innermost first
    #[must_use]
    pub fn behaviors(&self) -> BehaviorListView<'_> {
        BehaviorListView::new(self)
    }

    /// Check if properties are left as constructed
    #[must_use]
    pub fn omit_auto_properties(&self) -> bool {
        find_nodes(&self.graph(), &is_auto_properties_wrapper).is_empty()
    }

    /// Switch auto-properties off (`true`) or on (`false`)
    ///
    /// # Errors
    /// Never fails for a fixture-built graph; kept fallible like every rewrite
    pub fn set_omit_auto_properties(&self, omit: bool) -> SpecimenResult<()> {
        self.rewrite("auto-properties", |graph| {
            let enabled = !find_nodes(graph, &is_auto_properties_wrapper).is_empty();
            let next = match (omit, enabled) {
                (true, true) => {
                    replace_nodes(graph, &unwrap_auto_properties, &is_auto_properties_wrapper)
                }
                (false, false) => {
                    replace_nodes(graph, &with_auto_properties, &is_auto_properties_target)
                }
                _ => Arc::clone(graph),
            };
            Ok((next, ()))
        })
    }

    /// Items produced for "many" requests
    #[must_use]
    pub fn repeat_count(&self) -> usize {
        self.repeat.get()
    }

    /// Change the item count for "many" requests
    ///
    /// # Errors
    /// `InvalidArgument` for zero
    pub fn set_repeat_count(&self, count: usize) -> SpecimenResult<()> {
        tracing::debug!(count, "repeat count changed");
        self.repeat.set(count)
    }

    /// Handle to the live repeat count, for custom engines
    #[must_use]
    pub fn repeat_handle(&self) -> RepeatCount {
        self.repeat.clone()
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

fn is_customizations(node: &dyn SpecimenBuilderNode) -> bool {
    node_is::<CustomizationNode>(node)
}

fn is_residue_collectors(node: &dyn SpecimenBuilderNode) -> bool {
    node_is::<ResidueCollectorNode>(node)
}

fn is_auto_properties_target(node: &dyn SpecimenBuilderNode) -> bool {
    node_is::<AutoPropertiesTarget>(node)
}

fn is_auto_properties_wrapper(node: &dyn SpecimenBuilderNode) -> bool {
    downcast_node::<Postprocessor>(node).is_some_and(|postprocessor| {
        postprocessor
            .builder()
            .as_node()
            .is_some_and(is_auto_properties_target)
    })
}

fn with_auto_properties(target: &Arc<dyn SpecimenBuilder>) -> Arc<dyn SpecimenBuilder> {
    Arc::new(Postprocessor::new(
        Arc::clone(target),
        Arc::new(AutoPropertiesCommand::new()),
        Arc::new(AnyTypeSpecification),
    ))
}

fn unwrap_auto_properties(wrapper: &Arc<dyn SpecimenBuilder>) -> Arc<dyn SpecimenBuilder> {
    wrapper
        .as_node()
        .and_then(|node| node.children().into_iter().next())
        .unwrap_or_else(|| Arc::clone(wrapper))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use specimen_core::find_single_node;
    use specimen_test_utils::{Address, Person};

    #[test]
    fn graph_has_every_marker_once() {
        let fixture = Fixture::new();
        let graph = fixture.graph();
        assert!(find_single_node(&graph, &is_customizations).is_ok());
        assert!(find_single_node(&graph, &is_residue_collectors).is_ok());
        assert!(find_single_node(&graph, &is_auto_properties_target).is_ok());
        assert!(find_single_node(&graph, &is_auto_properties_wrapper).is_ok());
    }

    #[test]
    fn default_graph_is_guarded() {
        let fixture = Fixture::new();
        let graph = fixture.graph();
        let root = specimen_core::downcast_builder::<BehaviorRoot>(graph.as_ref()).unwrap();
        assert_eq!(root.behaviors().len(), 1);
        assert!(specimen_core::is_recursion_behavior(root.behaviors()[0].as_ref()));
        assert!(fixture.create::<Address>().is_ok());
    }

    #[test]
    fn toggling_auto_properties_rewrites_structure() {
        let fixture = Fixture::new();
        assert!(!fixture.omit_auto_properties());

        let before = fixture.graph();
        fixture.set_omit_auto_properties(true).unwrap();
        assert!(fixture.omit_auto_properties());
        assert!(!Arc::ptr_eq(&before, &fixture.graph()));
        assert!(find_single_node(&fixture.graph(), &is_auto_properties_target).is_ok());

        let unchanged = fixture.graph();
        fixture.set_omit_auto_properties(true).unwrap();
        assert!(Arc::ptr_eq(&unchanged, &fixture.graph()));

        fixture.set_omit_auto_properties(false).unwrap();
        assert!(!fixture.omit_auto_properties());
        assert_eq!(find_nodes(&fixture.graph(), &is_auto_properties_wrapper).len(), 1);
    }

    #[test]
    fn omitted_auto_properties_from_config() {
        let fixture =
            Fixture::with_config(FixtureConfig::new().with_omit_auto_properties(true)).unwrap();
        assert!(fixture.omit_auto_properties());
        let person = fixture.create::<Person>().unwrap();
        assert_eq!(person, Person::default());
    }

    #[test]
    fn seeded_creation_uses_seed() {
        let fixture = Fixture::new();
        let text = fixture.create_seeded::<String>("label").unwrap();
        assert!(text.starts_with("label"));
        let address = fixture.create_seeded::<Address>("home").unwrap();
        assert!(address.city.starts_with("city"));
    }

    #[test]
    fn repeat_count_is_live() {
        let fixture = Fixture::new();
        assert_eq!(fixture.repeat_count(), 3);
        assert_eq!(fixture.create_many::<u8>().unwrap().len(), 3);
        fixture.set_repeat_count(5).unwrap();
        assert_eq!(fixture.create_many::<u8>().unwrap().len(), 5);
        assert!(fixture.set_repeat_count(0).is_err());
        assert_eq!(fixture.create_many_n::<u8>(2).unwrap().len(), 2);
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(Fixture::with_config(FixtureConfig::new().with_repeat_count(0)).is_err());
    }

    #[test]
    fn fixture_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Fixture>();
    }
}
