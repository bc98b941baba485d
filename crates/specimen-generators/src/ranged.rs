//! Numbers within requested bounds

use dashmap::DashMap;
use specimen_core::{
    RangedNumberRequest, Request, Specimen, SpecimenBuilder, SpecimenContext, SpecimenError,
    SpecimenResult,
};

/// Yields `min, min + 1, ..., max` per distinct ranged request, then wraps
#[derive(Debug, Default)]
pub struct RangedNumberGenerator {
    cursors: DashMap<RangedNumberRequest, i128>,
}

impl RangedNumberGenerator {
    /// Create generator with no history
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next value for `request`
    pub fn next_for(&self, request: &RangedNumberRequest) -> i128 {
        let mut cursor = self.cursors.entry(*request).or_insert(request.min);
        let value = *cursor;
        *cursor = if value >= request.max {
            request.min
        } else {
            value + 1
        };
        value
    }
}

impl SpecimenBuilder for RangedNumberGenerator {
    fn create(&self, request: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let Request::RangedNumber(ranged) = request else {
            return Ok(Specimen::NoSpecimen);
        };
        let kind = ranged.key.shape().numeric().ok_or_else(|| {
            SpecimenError::invalid_argument(format!("{} is not a numeric type", ranged.key))
        })?;
        kind.to_value(self.next_for(ranged)).map(Specimen::Value)
    }
}
