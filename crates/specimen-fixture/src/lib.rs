//! Specimen Fixture
//!
//! The user-facing entry point: a [`Fixture`] assembles the default
//! engine of generators and relays into one builder graph and creates
//! anonymous values of any [`Shaped`](specimen_core::Shaped) type from it.
//!
//! # Core Concepts
//!
//! - [`Fixture`]: create, customize, freeze and inject values
//! - [`Composer`]: per-type recipe with member bindings and actions
//! - [`Customization`]: reusable bundle of fixture changes
//! - [`FixtureConfig`]: repeat count, auto-properties, recursion policy and
//!   number strategy, loadable from TOML
//! - [`MethodInvoker`]: constructor selection and invocation
//! - Relays: translate parameter, property, seeded, collection and wrapper
//!   requests into requests other builders answer
//!
//! # Example
//!
//! ```rust
//! use specimen_core::{Constructor, Parameter, Property, Shape, Shaped, StructShape};
//! use specimen_fixture::Fixture;
//!
//! #[derive(Debug, Clone)]
//! struct Account {
//!     owner: String,
//!     balance: i64,
//! }
//!
//! impl Shaped for Account {
//!     fn shape() -> Shape {
//!         Shape::Struct(
//!             StructShape::new()
//!                 .constructor(Constructor::new(
//!                     vec![Parameter::new::<String>("owner")],
//!                     |args| Ok(Account { owner: args.take()?, balance: 0 }),
//!                 ))
//!                 .property(Property::new("balance", |a: &mut Account, v: i64| a.balance = v)),
//!         )
//!     }
//! }
//!
//! let fixture = Fixture::new();
//! let account = fixture.create::<Account>().unwrap();
//! assert!(account.owner.starts_with("owner"));
//! assert_ne!(account.balance, 0);
//!
//! fixture.customize::<Account, _>(|c| c.with("balance", 100_i64)).unwrap();
//! assert_eq!(fixture.create::<Account>().unwrap().balance, 100);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod composer;
mod config;
mod customization;
mod engine;
mod fixture;
mod invoker;
mod relays;
mod views;

// Re-exports
pub use composer::Composer;
pub use config::{FixtureConfig, NumberStrategy, RecursionPolicy};
pub use customization::{
    CompositeCustomization, Customization, FreezingCustomization, NumericSequenceCustomization,
    RecursionPolicyCustomization, TracingCustomization,
};
pub use engine::{
    default_engine, default_engine_builders, default_residue_collectors, number_generators,
    sequence_generators,
};
pub use fixture::Fixture;
pub use invoker::{ConstructorQuery, GreedyConstructorQuery, MethodInvoker, ModestConstructorQuery};
pub use relays::{
    BoxRelay, FiniteSequenceRelay, MapRelay, MultipleRelay, OptionRelay,
    ParameterRequestRelay, PropertyRequestRelay, RepeatCount, SeedIgnoringRelay, SequenceRelay,
};
pub use views::{BehaviorListView, BuilderListView};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
