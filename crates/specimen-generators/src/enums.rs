//! Enum round-robin

use dashmap::DashMap;
use specimen_core::{
    Request, Shape, Shaped, Specimen, SpecimenBuilder, SpecimenContext, SpecimenError,
    SpecimenResult, TypeKey,
};
use std::collections::HashMap;

/// Cycles through the declared variants of every enum it sees
///
/// A cursor per enum type is created lazily on first use. Variants can be
/// restricted per type to a named subset, cycled in the given order.
#[derive(Debug, Default)]
pub struct EnumGenerator {
    cursors: DashMap<TypeKey, usize>,
    subsets: HashMap<TypeKey, Vec<usize>>,
}

impl EnumGenerator {
    /// Cycle through every declared variant
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict `T` to the named variants
    ///
    /// # Errors
    /// `InvalidArgument` when `T` is not an enum, the subset is empty, or a
    /// name is not a declared variant
    pub fn with_variants<T: Shaped>(mut self, names: &[&str]) -> SpecimenResult<Self> {
        let key = TypeKey::of::<T>();
        let Shape::Enum(shape) = key.shape() else {
            return Err(SpecimenError::invalid_argument(format!("{key} is not an enum")));
        };
        if names.is_empty() {
            return Err(SpecimenError::invalid_argument(format!(
                "variant subset of {key} must not be empty"
            )));
        }
        let indices = names
            .iter()
            .map(|name| {
                shape.position(name).ok_or_else(|| {
                    SpecimenError::invalid_argument(format!("{key} has no variant named {name}"))
                })
            })
            .collect::<SpecimenResult<Vec<_>>>()?;
        self.subsets.insert(key, indices);
        Ok(self)
    }
}

impl SpecimenBuilder for EnumGenerator {
    fn create(&self, request: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let Some(key) = request.as_type() else {
            return Ok(Specimen::NoSpecimen);
        };
        let Shape::Enum(shape) = key.shape() else {
            return Ok(Specimen::NoSpecimen);
        };
        let len = self
            .subsets
            .get(&key)
            .map_or(shape.len(), Vec::len);
        if len == 0 {
            return Ok(Specimen::NoSpecimen);
        }

        let position = {
            let mut cursor = self.cursors.entry(key).or_insert(0);
            let position = *cursor % len;
            *cursor = (position + 1) % len;
            position
        };
        let index = self
            .subsets
            .get(&key)
            .map_or(position, |subset| subset[position]);
        Ok(shape
            .variant(index)
            .map_or(Specimen::NoSpecimen, Specimen::Value))
    }
}
