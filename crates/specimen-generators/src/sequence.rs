//! Monotonic numeric sequences
//!
//! Each generator owns one atomic counter. Values start at 1 and grow by
//! one per request; once the next value no longer fits the target type
//! the sequence restarts at 1.

use specimen_core::{
    NumericKind, Request, Shaped, Specimen, SpecimenBuilder, SpecimenContext, SpecimenResult,
};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

/// Numeric type a [`SequenceGenerator`] can produce
pub trait SequenceNumber: Shaped + Copy {
    /// First value of every sequence
    const ONE: Self;

    /// Convert a counter value, `None` when it does not fit
    fn from_counter(value: u64) -> Option<Self>;
}

macro_rules! integral_sequence {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SequenceNumber for $ty {
                const ONE: Self = 1;

                fn from_counter(value: u64) -> Option<Self> {
                    <$ty>::try_from(value).ok()
                }
            }
        )*
    };
}

integral_sequence!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

// Floats count only as far as every integer stays exact.
impl SequenceNumber for f32 {
    const ONE: Self = 1.0;

    fn from_counter(value: u64) -> Option<Self> {
        u16::try_from(value).ok().map(f32::from)
    }
}

impl SequenceNumber for f64 {
    const ONE: Self = 1.0;

    fn from_counter(value: u64) -> Option<Self> {
        u32::try_from(value).ok().map(f64::from)
    }
}

/// Counts `1, 2, 3, ...` for requests of `T`
pub struct SequenceGenerator<T> {
    counter: AtomicU64,
    _marker: PhantomData<fn() -> T>,
}

impl<T: SequenceNumber> SequenceGenerator<T> {
    /// Create generator whose first value is 1
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
            _marker: PhantomData,
        }
    }

    /// Produce the next value
    pub fn next_value(&self) -> T {
        let step = |current: u64| match current.checked_add(1) {
            Some(next) if T::from_counter(next).is_some() => next,
            _ => 1,
        };
        let previous = self
            .counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| Some(step(current)))
            .unwrap_or_else(|current| current);
        T::from_counter(step(previous)).unwrap_or(T::ONE)
    }
}

impl<T: SequenceNumber> Default for SequenceGenerator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SequenceGenerator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceGenerator")
            .field("type", &specimen_core::short_type_name(std::any::type_name::<T>()))
            .field("counter", &self.counter.load(Ordering::Relaxed))
            .finish()
    }
}

impl<T: SequenceNumber> SpecimenBuilder for SequenceGenerator<T> {
    fn create(&self, request: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        if !request.is_type::<T>() {
            return Ok(Specimen::NoSpecimen);
        }
        Ok(Specimen::value(self.next_value()))
    }
}

/// Sequence of `i8`
pub type SByteSequenceGenerator = SequenceGenerator<i8>;
/// Sequence of `i16`
pub type Int16SequenceGenerator = SequenceGenerator<i16>;
/// Sequence of `i32`
pub type Int32SequenceGenerator = SequenceGenerator<i32>;
/// Sequence of `i64`
pub type Int64SequenceGenerator = SequenceGenerator<i64>;
/// Sequence of `u8`
pub type ByteSequenceGenerator = SequenceGenerator<u8>;
/// Sequence of `u16`
pub type UInt16SequenceGenerator = SequenceGenerator<u16>;
/// Sequence of `u32`
pub type UInt32SequenceGenerator = SequenceGenerator<u32>;
/// Sequence of `u64`
pub type UInt64SequenceGenerator = SequenceGenerator<u64>;
/// Sequence of `f32`
pub type SingleSequenceGenerator = SequenceGenerator<f32>;
/// Sequence of `f64`
pub type DoubleSequenceGenerator = SequenceGenerator<f64>;

/// One counter shared by every numeric type
#[derive(Debug, Default)]
pub struct NumericSequenceGenerator {
    counter: AtomicU64,
}

impl NumericSequenceGenerator {
    /// Create generator whose first value is 1
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next counter value for `kind`, restarting at 1 when it no longer fits
    pub fn next_for(&self, kind: NumericKind) -> i128 {
        let limit = exact_limit(kind);
        let step = |current: u64| {
            let next = current.saturating_add(1);
            if i128::from(next) <= limit {
                next
            } else {
                1
            }
        };
        let previous = self
            .counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| Some(step(current)))
            .unwrap_or_else(|current| current);
        i128::from(step(previous))
    }
}

fn exact_limit(kind: NumericKind) -> i128 {
    match kind {
        NumericKind::F32 => i128::from(u16::MAX),
        NumericKind::F64 => i128::from(u32::MAX),
        other => other.max_integral(),
    }
}

impl SpecimenBuilder for NumericSequenceGenerator {
    fn create(&self, request: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let Some(kind) = request.as_type().and_then(|key| key.shape().numeric()) else {
            return Ok(Specimen::NoSpecimen);
        };
        kind.to_value(self.next_for(kind)).map(Specimen::Value)
    }
}
