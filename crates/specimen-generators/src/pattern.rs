//! Strings matching a regular expression
//!
//! Candidates are sampled with `rand_regex` and checked against the
//! pattern compiled by `regex`, anchored at both ends. Compiled pairs are
//! cached per pattern.

use dashmap::DashMap;
use rand::Rng;
use specimen_core::{
    Request, Specimen, SpecimenBuilder, SpecimenContext, SpecimenError, SpecimenResult,
};
use std::sync::Arc;

/// Longest run produced for unbounded repetitions (`*`, `+`)
pub const DEFAULT_MAX_REPEAT: u32 = 16;

const ATTEMPTS: usize = 10;

#[derive(Debug)]
struct CompiledPattern {
    sampler: rand_regex::Regex,
    matcher: regex::Regex,
}

impl CompiledPattern {
    fn compile(pattern: &str, max_repeat: u32) -> SpecimenResult<Self> {
        let sampler = rand_regex::Regex::compile(pattern, max_repeat).map_err(|e| {
            SpecimenError::invalid_argument(format!("cannot sample /{pattern}/: {e}"))
        })?;
        let matcher = regex::Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
            SpecimenError::invalid_argument(format!("invalid pattern /{pattern}/: {e}"))
        })?;
        Ok(Self { sampler, matcher })
    }
}

/// Random strings matching the requested pattern
#[derive(Debug)]
pub struct RegularExpressionGenerator {
    max_repeat: u32,
    cache: DashMap<String, Arc<CompiledPattern>>,
}

impl RegularExpressionGenerator {
    /// Create generator with [`DEFAULT_MAX_REPEAT`]
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_repeat(DEFAULT_MAX_REPEAT)
    }

    /// Create generator capping unbounded repetitions at `max_repeat`
    #[must_use]
    pub fn with_max_repeat(max_repeat: u32) -> Self {
        Self {
            max_repeat,
            cache: DashMap::new(),
        }
    }

    fn compiled(&self, pattern: &str) -> SpecimenResult<Arc<CompiledPattern>> {
        if let Some(hit) = self.cache.get(pattern) {
            return Ok(Arc::clone(hit.value()));
        }
        let compiled = Arc::new(CompiledPattern::compile(pattern, self.max_repeat)?);
        self.cache
            .insert(pattern.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Sample one string matching `pattern`, `None` when no candidate verified
    ///
    /// # Errors
    /// `InvalidArgument` when the pattern cannot be compiled
    pub fn sample(&self, pattern: &str) -> SpecimenResult<Option<String>> {
        let compiled = self.compiled(pattern)?;
        let mut rng = rand::thread_rng();
        for _ in 0..ATTEMPTS {
            let candidate: String = rng.sample(&compiled.sampler);
            if compiled.matcher.is_match(&candidate) {
                return Ok(Some(candidate));
            }
        }
        tracing::debug!(pattern, "no sampled candidate matched");
        Ok(None)
    }
}

impl Default for RegularExpressionGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecimenBuilder for RegularExpressionGenerator {
    fn create(&self, request: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let Request::RegularExpression(regex) = request else {
            return Ok(Specimen::NoSpecimen);
        };
        Ok(self
            .sample(&regex.pattern)?
            .map_or(Specimen::NoSpecimen, Specimen::value))
    }
}
