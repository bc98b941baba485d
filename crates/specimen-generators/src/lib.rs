//! Specimen Generators
//!
//! Stateful leaf builders that satisfy primitive requests.
//!
//! # Core Concepts
//!
//! - [`SequenceGenerator`]: `1, 2, 3, ...` per numeric type, restarting on overflow
//! - [`NumericSequenceGenerator`]: one counter shared by all numeric types
//! - [`RandomNumericSequenceGenerator`]: random numbers unique within a band of limits
//! - [`RangedNumberGenerator`]: cycles `min..=max` per ranged request
//! - [`EnumGenerator`]: round-robin over declared enum variants
//! - [`StringGenerator`], [`StringSeedRelay`], [`ConstrainedStringGenerator`],
//!   [`RegularExpressionGenerator`], [`CharSequenceGenerator`]: text
//! - [`BooleanSwitch`], [`UuidGenerator`], [`DateTimeGenerator`],
//!   [`NaiveDateGenerator`], [`DurationGenerator`], [`UnitGenerator`]
//!
//! Every generator is safe to share between threads; each guards its own
//! state with an atomic, a `DashMap` or a `parking_lot` mutex.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use specimen_core::{CompositeSpecimenBuilder, SpecimenContext, TerminatingSpecimenBuilder};
//! use specimen_generators::{BooleanSwitch, Int32SequenceGenerator};
//!
//! let graph = Arc::new(CompositeSpecimenBuilder::new(vec![
//!     Arc::new(Int32SequenceGenerator::new()),
//!     Arc::new(BooleanSwitch::new()),
//!     Arc::new(TerminatingSpecimenBuilder),
//! ]));
//! let mut context = SpecimenContext::new(graph);
//!
//! assert_eq!(context.resolve_as::<i32>().unwrap(), 1);
//! assert_eq!(context.resolve_as::<i32>().unwrap(), 2);
//! assert!(context.resolve_as::<bool>().unwrap());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod enums;
mod misc;
mod pattern;
mod random;
mod ranged;
mod sequence;
mod strings;

// Re-exports
pub use enums::EnumGenerator;
pub use misc::{
    BooleanSwitch, DateTimeGenerator, DurationGenerator, NaiveDateGenerator, UnitGenerator,
    UuidGenerator,
};
pub use pattern::{RegularExpressionGenerator, DEFAULT_MAX_REPEAT};
pub use random::{limits_for, RandomNumericSequenceGenerator, DEFAULT_LIMITS};
pub use ranged::RangedNumberGenerator;
pub use sequence::{
    ByteSequenceGenerator, DoubleSequenceGenerator, Int16SequenceGenerator,
    Int32SequenceGenerator, Int64SequenceGenerator, NumericSequenceGenerator,
    SByteSequenceGenerator, SequenceGenerator, SequenceNumber, SingleSequenceGenerator,
    UInt16SequenceGenerator, UInt32SequenceGenerator, UInt64SequenceGenerator,
};
pub use strings::{
    CharSequenceGenerator, ConstrainedStringGenerator, StringGenerator, StringSeedRelay,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use specimen_core::{
        CompositeSpecimenBuilder, NumericKind, Request, SeededRequest, SpecimenBuilder,
        SpecimenContext, TerminatingSpecimenBuilder,
    };
    use specimen_test_utils::Color;
    use std::sync::Arc;

    fn leaf_graph() -> Arc<dyn SpecimenBuilder> {
        let mut builders: Vec<Arc<dyn SpecimenBuilder>> = vec![
            Arc::new(StringSeedRelay),
            Arc::new(StringGenerator),
            Arc::new(BooleanSwitch::new()),
            Arc::new(CharSequenceGenerator::new()),
            Arc::new(EnumGenerator::new()),
        ];
        for kind in NumericKind::ALL {
            if let Ok(generator) = RandomNumericSequenceGenerator::for_kind(kind) {
                builders.push(Arc::new(generator));
            }
        }
        builders.push(Arc::new(TerminatingSpecimenBuilder));
        Arc::new(CompositeSpecimenBuilder::new(builders))
    }

    #[test]
    fn every_numeric_kind_is_served() {
        let graph = leaf_graph();
        let mut ctx = SpecimenContext::new(graph);
        assert!(ctx.resolve_as::<u8>().unwrap() >= 1);
        assert!(ctx.resolve_as::<i8>().unwrap() >= 1);
        assert!(ctx.resolve_as::<u64>().unwrap() >= 1);
        assert!(ctx.resolve_as::<f32>().unwrap() >= 1.0);
        assert!(ctx.resolve_as::<f64>().unwrap() >= 1.0);
    }

    #[test]
    fn seeded_strings_win_over_plain_strings() {
        let mut ctx = SpecimenContext::new(leaf_graph());
        let seeded = Request::Seeded(SeededRequest::new(Request::of::<String>(), "city"));
        let text = ctx.resolve(&seeded).unwrap().downcast::<String>().unwrap();
        assert!(text.starts_with("city"));
    }

    #[test]
    fn enums_resolve_through_graph() {
        let mut ctx = SpecimenContext::new(leaf_graph());
        assert_eq!(ctx.resolve_as::<Color>().unwrap(), Color::Red);
        assert_eq!(ctx.resolve_as::<Color>().unwrap(), Color::Green);
    }

    #[test]
    fn unknown_types_reach_terminator() {
        let mut ctx = SpecimenContext::new(leaf_graph());
        let err = ctx.resolve_as::<Vec<u8>>().unwrap_err();
        assert!(err.is_unresolved());
    }
}
