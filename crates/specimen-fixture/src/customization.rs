//! Reusable fixture customizations

use crate::config::RecursionPolicy;
use crate::engine::sequence_generators;
use crate::fixture::Fixture;
use specimen_core::{
    is_recursion_behavior, CompositeSpecimenBuilder, Shaped, SpecimenResult, TracingBehavior,
};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A bundle of changes applied to a fixture in one call
pub trait Customization: Send + Sync + fmt::Debug {
    /// Apply to `fixture`
    ///
    /// # Errors
    /// Whatever the change reports; earlier changes stay applied
    fn customize(&self, fixture: &Fixture) -> SpecimenResult<()>;
}

/// Applies customizations in order
#[derive(Debug, Clone, Default)]
pub struct CompositeCustomization(pub Vec<Arc<dyn Customization>>);

impl Customization for CompositeCustomization {
    fn customize(&self, fixture: &Fixture) -> SpecimenResult<()> {
        self.0
            .iter()
            .try_for_each(|customization| customization.customize(fixture))
    }
}

/// Freezes one `T` for the rest of the fixture's life
pub struct FreezingCustomization<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> FreezingCustomization<T> {
    /// Create customization
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for FreezingCustomization<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for FreezingCustomization<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FreezingCustomization<{}>", std::any::type_name::<T>())
    }
}

impl<T: Shaped + Clone + Sync> Customization for FreezingCustomization<T> {
    fn customize(&self, fixture: &Fixture) -> SpecimenResult<()> {
        fixture.freeze::<T>().map(drop)
    }
}

/// Numbers count `1, 2, 3, ...` per type instead of being random
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericSequenceCustomization;

impl Customization for NumericSequenceCustomization {
    fn customize(&self, fixture: &Fixture) -> SpecimenResult<()> {
        let counters = CompositeSpecimenBuilder::new(sequence_generators());
        fixture.customizations().insert(0, Arc::new(counters))
    }
}

/// Replaces whatever recursion handling is installed
#[derive(Debug, Clone, Copy, Default)]
pub struct RecursionPolicyCustomization(pub RecursionPolicy);

impl Customization for RecursionPolicyCustomization {
    fn customize(&self, fixture: &Fixture) -> SpecimenResult<()> {
        let behavior = self.0.behavior()?;
        let behaviors = fixture.behaviors();
        behaviors.retain(|b| !is_recursion_behavior(b))?;
        behaviors.push(behavior)
    }
}

/// Logs every request the fixture resolves at `trace` level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingCustomization;

impl Customization for TracingCustomization {
    fn customize(&self, fixture: &Fixture) -> SpecimenResult<()> {
        fixture.behaviors().push(Arc::new(TracingBehavior))
    }
}
