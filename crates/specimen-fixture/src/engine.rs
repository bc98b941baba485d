//! Default engine assembly
//!
//! The engine is the composite of leaf generators and relays sitting
//! between a fixture's customizations and its residue collectors.

use crate::config::{FixtureConfig, NumberStrategy};
use crate::invoker::MethodInvoker;
use crate::relays::{
    BoxRelay, FiniteSequenceRelay, MapRelay, MultipleRelay, OptionRelay, ParameterRequestRelay,
    PropertyRequestRelay, RepeatCount, SeedIgnoringRelay, SequenceRelay,
};
use specimen_core::{CompositeSpecimenBuilder, NumericKind, SpecimenBuilder};
use specimen_generators::{
    BooleanSwitch, CharSequenceGenerator, ConstrainedStringGenerator, DateTimeGenerator,
    DurationGenerator, EnumGenerator, NaiveDateGenerator, RandomNumericSequenceGenerator,
    RangedNumberGenerator, RegularExpressionGenerator, SequenceGenerator, StringGenerator,
    StringSeedRelay, UnitGenerator, UuidGenerator,
};
use std::sync::Arc;

/// Builders answering numeric requests under `strategy`
///
/// Random generators get one per numeric type, each with the default
/// limits cut at the type's maximum. With a seed, generator `i` is seeded
/// with `seed + i`.
#[must_use]
pub fn number_generators(
    strategy: NumberStrategy,
    seed: Option<u64>,
) -> Vec<Arc<dyn SpecimenBuilder>> {
    match strategy {
        NumberStrategy::Random => NumericKind::ALL
            .iter()
            .zip(0_u64..)
            .filter_map(|(kind, index)| {
                let generator = RandomNumericSequenceGenerator::for_kind(*kind).ok()?;
                let generator = match seed {
                    Some(seed) => generator.with_seed(seed.wrapping_add(index)),
                    None => generator,
                };
                Some(Arc::new(generator) as Arc<dyn SpecimenBuilder>)
            })
            .collect(),
        NumberStrategy::Sequence => sequence_generators(),
    }
}

/// One counting generator per numeric type
#[must_use]
pub fn sequence_generators() -> Vec<Arc<dyn SpecimenBuilder>> {
    vec![
        Arc::new(SequenceGenerator::<i8>::new()),
        Arc::new(SequenceGenerator::<i16>::new()),
        Arc::new(SequenceGenerator::<i32>::new()),
        Arc::new(SequenceGenerator::<i64>::new()),
        Arc::new(SequenceGenerator::<i128>::new()),
        Arc::new(SequenceGenerator::<isize>::new()),
        Arc::new(SequenceGenerator::<u8>::new()),
        Arc::new(SequenceGenerator::<u16>::new()),
        Arc::new(SequenceGenerator::<u32>::new()),
        Arc::new(SequenceGenerator::<u64>::new()),
        Arc::new(SequenceGenerator::<u128>::new()),
        Arc::new(SequenceGenerator::<usize>::new()),
        Arc::new(SequenceGenerator::<f32>::new()),
        Arc::new(SequenceGenerator::<f64>::new()),
    ]
}

/// Builders of the default engine, in priority order
#[must_use]
pub fn default_engine_builders(
    config: &FixtureConfig,
    repeat: &RepeatCount,
) -> Vec<Arc<dyn SpecimenBuilder>> {
    let mut builders: Vec<Arc<dyn SpecimenBuilder>> = vec![
        Arc::new(StringSeedRelay),
        Arc::new(StringGenerator),
        Arc::new(CharSequenceGenerator::new()),
        Arc::new(BooleanSwitch::new()),
        Arc::new(UuidGenerator),
        Arc::new(DateTimeGenerator),
        Arc::new(NaiveDateGenerator),
        Arc::new(DurationGenerator),
        Arc::new(UnitGenerator),
    ];
    builders.extend(number_generators(config.numbers, config.random_seed));
    builders.extend([
        Arc::new(EnumGenerator::new()) as Arc<dyn SpecimenBuilder>,
        Arc::new(RangedNumberGenerator::new()),
        Arc::new(ConstrainedStringGenerator),
        Arc::new(RegularExpressionGenerator::new()),
        Arc::new(OptionRelay),
        Arc::new(BoxRelay),
        Arc::new(MethodInvoker::modest()),
        Arc::new(ParameterRequestRelay),
        Arc::new(PropertyRequestRelay),
        Arc::new(SeedIgnoringRelay),
        Arc::new(MultipleRelay::new(repeat.clone())),
        Arc::new(FiniteSequenceRelay),
    ]);
    builders
}

/// The default engine as one composite
#[must_use]
pub fn default_engine(config: &FixtureConfig, repeat: &RepeatCount) -> Arc<dyn SpecimenBuilder> {
    Arc::new(CompositeSpecimenBuilder::new(default_engine_builders(
        config, repeat,
    )))
}

/// Fallbacks tried after customizations and engine decline
#[must_use]
pub fn default_residue_collectors() -> Vec<Arc<dyn SpecimenBuilder>> {
    vec![Arc::new(SequenceRelay), Arc::new(MapRelay)]
}
