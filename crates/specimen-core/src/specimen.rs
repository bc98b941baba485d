//! Specimen outcome
//!
//! Every builder answers a request with a [`Specimen`]: a produced value,
//! a legitimate null, an explicit omission, or a decline. Only
//! [`Specimen::NoSpecimen`] lets a composite move on to its next child.

use crate::error::{SpecimenError, SpecimenResult};
use crate::shape::{downcast_value, short_type_name, Value};
use std::any::Any;
use std::fmt;

/// Outcome of a builder for one request
pub enum Specimen {
    /// A produced value
    Value(Value),
    /// A legitimate null
    Null,
    /// The request was explicitly declined; skip assignment
    Omit,
    /// This builder does not handle the request
    NoSpecimen,
}

impl Specimen {
    /// Wrap a concrete value
    #[inline]
    #[must_use]
    pub fn value<T: Any + Send>(value: T) -> Self {
        Self::Value(Box::new(value))
    }

    /// Check if the builder declined
    #[inline]
    #[must_use]
    pub fn is_no_specimen(&self) -> bool {
        matches!(self, Self::NoSpecimen)
    }

    /// Check if the request resolved (value, null, or omit)
    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !self.is_no_specimen()
    }

    /// Check if this holds a value
    #[inline]
    #[must_use]
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Borrow the value as `T`
    #[must_use]
    pub fn value_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Value(v) => v.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Move into `T`
    ///
    /// # Errors
    /// `NullValue`, `Omitted`, `TypeMismatch`, or `Unresolved` for the
    /// respective outcome
    pub fn downcast<T: Any>(self) -> SpecimenResult<T> {
        let type_name = || short_type_name(std::any::type_name::<T>());
        match self {
            Self::Value(v) => downcast_value::<T>(v),
            Self::Null => Err(SpecimenError::NullValue {
                type_name: type_name(),
            }),
            Self::Omit => Err(SpecimenError::Omitted {
                type_name: type_name(),
            }),
            Self::NoSpecimen => Err(SpecimenError::Unresolved {
                request: type_name(),
                path: vec![],
            }),
        }
    }

    /// Convert into a constructor argument slot (`None` is null)
    #[must_use]
    pub fn into_argument(self) -> Option<Option<Value>> {
        match self {
            Self::Value(v) => Some(Some(v)),
            Self::Null => Some(None),
            Self::Omit | Self::NoSpecimen => None,
        }
    }
}

impl fmt::Debug for Specimen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(_) => f.write_str("Value(..)"),
            Self::Null => f.write_str("Null"),
            Self::Omit => f.write_str("Omit"),
            Self::NoSpecimen => f.write_str("NoSpecimen"),
        }
    }
}

/// Ordered specimens produced for a finite sequence request
#[derive(Default)]
pub struct SpecimenSequence(pub Vec<Value>);

impl SpecimenSequence {
    /// Number of items
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Move every item into `T`
    ///
    /// # Errors
    /// `TypeMismatch` on the first foreign item
    pub fn downcast_all<T: Any>(self) -> SpecimenResult<Vec<T>> {
        self.0.into_iter().map(downcast_value::<T>).collect()
    }
}

impl fmt::Debug for SpecimenSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpecimenSequence(len: {})", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_no_specimen_is_unresolved() {
        assert!(Specimen::NoSpecimen.is_no_specimen());
        assert!(Specimen::Null.is_resolved());
        assert!(Specimen::Omit.is_resolved());
        assert!(Specimen::value(1_u8).is_resolved());
    }

    #[test]
    fn downcast_maps_each_outcome() {
        assert_eq!(Specimen::value(7_u32).downcast::<u32>().unwrap(), 7);
        assert!(matches!(
            Specimen::Null.downcast::<u32>(),
            Err(SpecimenError::NullValue { .. })
        ));
        assert!(matches!(
            Specimen::Omit.downcast::<u32>(),
            Err(SpecimenError::Omitted { .. })
        ));
        assert!(matches!(
            Specimen::NoSpecimen.downcast::<u32>(),
            Err(SpecimenError::Unresolved { .. })
        ));
        assert!(matches!(
            Specimen::value("x").downcast::<u32>(),
            Err(SpecimenError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn value_ref_borrows() {
        let s = Specimen::value(String::from("abc"));
        assert_eq!(s.value_ref::<String>().map(String::as_str), Some("abc"));
        assert!(s.value_ref::<u8>().is_none());
    }

    #[test]
    fn argument_slots() {
        assert!(matches!(Specimen::Null.into_argument(), Some(None)));
        assert!(Specimen::Omit.into_argument().is_none());
        assert!(matches!(Specimen::value(1_u8).into_argument(), Some(Some(_))));
    }

    #[test]
    fn sequence_downcasts_items() {
        let seq = SpecimenSequence(vec![Box::new(1_u8), Box::new(2_u8)]);
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.downcast_all::<u8>().unwrap(), vec![1, 2]);
    }
}
