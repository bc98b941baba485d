//! Booleans, uuids, dates, durations and unit

use chrono::{DateTime, Duration as TimeDelta, NaiveDate, Utc};
use rand::Rng;
use specimen_core::{Request, Specimen, SpecimenBuilder, SpecimenContext, SpecimenResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use uuid::Uuid;

/// Seconds in two years, the spread of generated instants around now
const INSTANT_SPREAD_SECONDS: i64 = 730 * 86_400;

/// Seconds in one day, the upper bound of generated durations
const DURATION_MAX_SECONDS: u64 = 86_400;

/// Alternates `true`, `false`, `true`, ...
#[derive(Debug)]
pub struct BooleanSwitch {
    next: AtomicBool,
}

impl BooleanSwitch {
    /// Create switch whose first value is `true`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: AtomicBool::new(true),
        }
    }

    /// Current value; flips the switch
    pub fn next_value(&self) -> bool {
        self.next.fetch_xor(true, Ordering::SeqCst)
    }
}

impl Default for BooleanSwitch {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecimenBuilder for BooleanSwitch {
    fn create(&self, request: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        if !request.is_type::<bool>() {
            return Ok(Specimen::NoSpecimen);
        }
        Ok(Specimen::value(self.next_value()))
    }
}

/// Fresh v4 uuids
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl SpecimenBuilder for UuidGenerator {
    fn create(&self, request: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        if !request.is_type::<Uuid>() {
            return Ok(Specimen::NoSpecimen);
        }
        Ok(Specimen::value(Uuid::new_v4()))
    }
}

/// Random instants within two years either side of now
#[derive(Debug, Default, Clone, Copy)]
pub struct DateTimeGenerator;

impl DateTimeGenerator {
    /// Draw one instant
    #[must_use]
    pub fn next_instant() -> DateTime<Utc> {
        let now = Utc::now();
        let offset = rand::thread_rng().gen_range(-INSTANT_SPREAD_SECONDS..=INSTANT_SPREAD_SECONDS);
        now.checked_add_signed(TimeDelta::seconds(offset))
            .unwrap_or(now)
    }
}

impl SpecimenBuilder for DateTimeGenerator {
    fn create(&self, request: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        if !request.is_type::<DateTime<Utc>>() {
            return Ok(Specimen::NoSpecimen);
        }
        Ok(Specimen::value(Self::next_instant()))
    }
}

/// Calendar dates of random instants
#[derive(Debug, Default, Clone, Copy)]
pub struct NaiveDateGenerator;

impl SpecimenBuilder for NaiveDateGenerator {
    fn create(&self, request: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        if !request.is_type::<NaiveDate>() {
            return Ok(Specimen::NoSpecimen);
        }
        Ok(Specimen::value(DateTimeGenerator::next_instant().date_naive()))
    }
}

/// Whole-second durations between one second and one day
#[derive(Debug, Default, Clone, Copy)]
pub struct DurationGenerator;

impl SpecimenBuilder for DurationGenerator {
    fn create(&self, request: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        if !request.is_type::<Duration>() {
            return Ok(Specimen::NoSpecimen);
        }
        let seconds = rand::thread_rng().gen_range(1..=DURATION_MAX_SECONDS);
        Ok(Specimen::value(Duration::from_secs(seconds)))
    }
}

/// `()`
#[derive(Debug, Default, Clone, Copy)]
pub struct UnitGenerator;

impl SpecimenBuilder for UnitGenerator {
    fn create(&self, request: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        if !request.is_type::<()>() {
            return Ok(Specimen::NoSpecimen);
        }
        Ok(Specimen::value(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use specimen_core::TerminatingSpecimenBuilder;
    use std::sync::Arc;

    fn context() -> SpecimenContext {
        SpecimenContext::new(Arc::new(TerminatingSpecimenBuilder))
    }

    #[test]
    fn switch_alternates() {
        let switch = BooleanSwitch::new();
        let values: Vec<bool> = (0..4).map(|_| switch.next_value()).collect();
        assert_eq!(values, vec![true, false, true, false]);
    }

    #[test]
    fn instants_stay_within_two_years() {
        let spread = TimeDelta::days(731);
        for _ in 0..100 {
            let instant = DateTimeGenerator::next_instant();
            let now = Utc::now();
            assert!(instant > now - spread && instant < now + spread);
        }
    }

    #[test]
    fn durations_are_positive_and_within_a_day() {
        let mut ctx = context();
        for _ in 0..100 {
            let duration = DurationGenerator
                .create(&Request::of::<Duration>(), &mut ctx)
                .unwrap()
                .downcast::<Duration>()
                .unwrap();
            assert!(duration >= Duration::from_secs(1));
            assert!(duration <= Duration::from_secs(DURATION_MAX_SECONDS));
            assert_eq!(duration.subsec_nanos(), 0);
        }
    }

    #[test]
    fn generators_decline_foreign_types() {
        let mut ctx = context();
        let request = Request::of::<String>();
        assert!(BooleanSwitch::new().create(&request, &mut ctx).unwrap().is_no_specimen());
        assert!(UuidGenerator.create(&request, &mut ctx).unwrap().is_no_specimen());
        assert!(DateTimeGenerator.create(&request, &mut ctx).unwrap().is_no_specimen());
        assert!(NaiveDateGenerator.create(&request, &mut ctx).unwrap().is_no_specimen());
        assert!(DurationGenerator.create(&request, &mut ctx).unwrap().is_no_specimen());
        assert!(UnitGenerator.create(&request, &mut ctx).unwrap().is_no_specimen());
    }

    #[test]
    fn uuids_are_version_four() {
        let mut ctx = context();
        let id = UuidGenerator
            .create(&Request::of::<Uuid>(), &mut ctx)
            .unwrap()
            .downcast::<Uuid>()
            .unwrap();
        assert_eq!(id.get_version_num(), 4);
    }
}
