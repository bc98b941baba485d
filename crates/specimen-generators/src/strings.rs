//! Text generators: strings, seeded strings, bounded strings, characters

use rand::Rng;
use specimen_core::{
    Request, Seed, SeededRequest, Specimen, SpecimenBuilder, SpecimenContext, SpecimenResult,
};
use std::sync::atomic::{AtomicU32, Ordering};
use uuid::Uuid;

/// Produces hyphenated v4 uuid text for `String` requests
#[derive(Debug, Default, Clone, Copy)]
pub struct StringGenerator;

impl SpecimenBuilder for StringGenerator {
    fn create(&self, request: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        if !request.is_type::<String>() {
            return Ok(Specimen::NoSpecimen);
        }
        Ok(Specimen::value(Uuid::new_v4().hyphenated().to_string()))
    }
}

/// Prefixes uuid text with a text seed, e.g. `name3f2a...`
///
/// Handles only seeded `String` requests carrying a text seed.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringSeedRelay;

impl SpecimenBuilder for StringSeedRelay {
    fn create(&self, request: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let Request::Seeded(SeededRequest {
            request: inner,
            seed: Seed::Text(seed),
        }) = request
        else {
            return Ok(Specimen::NoSpecimen);
        };
        if !inner.is_type::<String>() {
            return Ok(Specimen::NoSpecimen);
        }
        Ok(Specimen::value(format!(
            "{seed}{}",
            Uuid::new_v4().hyphenated()
        )))
    }
}

/// Strings whose length falls within the requested bounds
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstrainedStringGenerator;

impl ConstrainedStringGenerator {
    /// Random text of exactly `length` characters
    #[must_use]
    pub fn text_of_length(length: usize) -> String {
        let mut text = String::with_capacity(length + 32);
        while text.len() < length {
            text.push_str(&Uuid::new_v4().simple().to_string());
        }
        text.truncate(length);
        text
    }
}

impl SpecimenBuilder for ConstrainedStringGenerator {
    fn create(&self, request: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let Request::ConstrainedString(constraint) = request else {
            return Ok(Specimen::NoSpecimen);
        };
        let length =
            rand::thread_rng().gen_range(constraint.min_length..=constraint.max_length);
        Ok(Specimen::value(Self::text_of_length(length)))
    }
}

const FIRST_PRINTABLE: u32 = b'!' as u32;
const PRINTABLE_COUNT: u32 = (b'~' - b'!') as u32 + 1;

/// Cycles through printable ASCII `!` to `~`
#[derive(Debug, Default)]
pub struct CharSequenceGenerator {
    counter: AtomicU32,
}

impl CharSequenceGenerator {
    /// Create generator starting at `!`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next character of the cycle
    pub fn next_char(&self) -> char {
        let offset = self
            .counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some((current + 1) % PRINTABLE_COUNT)
            })
            .unwrap_or_else(|current| current);
        char::from_u32(FIRST_PRINTABLE + offset).unwrap_or('!')
    }
}

impl SpecimenBuilder for CharSequenceGenerator {
    fn create(&self, request: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        if !request.is_type::<char>() {
            return Ok(Specimen::NoSpecimen);
        }
        Ok(Specimen::value(self.next_char()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use specimen_core::{ConstrainedStringRequest, TerminatingSpecimenBuilder};
    use std::sync::Arc;

    fn context() -> SpecimenContext {
        SpecimenContext::new(Arc::new(TerminatingSpecimenBuilder))
    }

    #[test]
    fn strings_are_distinct_uuids() {
        let mut ctx = context();
        let a = StringGenerator
            .create(&Request::of::<String>(), &mut ctx)
            .unwrap()
            .downcast::<String>()
            .unwrap();
        let b = StringGenerator
            .create(&Request::of::<String>(), &mut ctx)
            .unwrap()
            .downcast::<String>()
            .unwrap();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn seeded_string_starts_with_seed() {
        let mut ctx = context();
        let request = Request::Seeded(SeededRequest::new(Request::of::<String>(), "name"));
        let text = StringSeedRelay
            .create(&request, &mut ctx)
            .unwrap()
            .downcast::<String>()
            .unwrap();
        assert!(text.starts_with("name"));
        assert_eq!(text.len(), "name".len() + 36);
    }

    #[test]
    fn seed_relay_declines_other_requests() {
        let mut ctx = context();
        let numeric_seed = Request::Seeded(SeededRequest::new(Request::of::<String>(), 3_i128));
        let other_type = Request::Seeded(SeededRequest::new(Request::of::<u8>(), "n"));
        assert!(StringSeedRelay.create(&numeric_seed, &mut ctx).unwrap().is_no_specimen());
        assert!(StringSeedRelay.create(&other_type, &mut ctx).unwrap().is_no_specimen());
        assert!(StringSeedRelay
            .create(&Request::of::<String>(), &mut ctx)
            .unwrap()
            .is_no_specimen());
    }

    proptest! {
        #[test]
        fn constrained_length_is_within_bounds(min in 0usize..80, extra in 0usize..80) {
            let max = min + extra + 1;
            let mut ctx = context();
            let request = Request::ConstrainedString(ConstrainedStringRequest::new(min, max).unwrap());
            let text = ConstrainedStringGenerator
                .create(&request, &mut ctx)
                .unwrap()
                .downcast::<String>()
                .unwrap();
            prop_assert!(text.len() >= min && text.len() <= max);
        }
    }

    #[test]
    fn chars_cycle_printable_ascii() {
        let generator = CharSequenceGenerator::new();
        let drawn: Vec<char> = (0..96).map(|_| generator.next_char()).collect();
        assert_eq!(drawn[0], '!');
        assert_eq!(drawn[93], '~');
        assert_eq!(drawn[94], '!');
        assert_eq!(drawn[95], '"');
    }
}
