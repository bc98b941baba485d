//! Random numbers, unique within the current band
//!
//! Limits `l0 < l1 < ... < ln` split the number line into bands: the first
//! band is `[l0, l1)`, every later band `[previous upper, l(i) + 1)`. Values
//! are drawn without replacement from the current band. An exhausted band
//! advances to the next one; after the last band the cycle restarts at the
//! first band with a cleared history.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use specimen_core::{
    NumericKind, Request, Specimen, SpecimenBuilder, SpecimenContext, SpecimenError,
    SpecimenResult,
};
use std::collections::HashSet;
use std::fmt;

/// Limits used when none are given: byte, short and int maxima
pub const DEFAULT_LIMITS: [i128; 4] = [1, 255, 32_767, 2_147_483_647];

/// Band cursor over one set of limits
struct Lane {
    limits: Vec<i128>,
    band: usize,
    lower: i128,
    // inclusive, so the last limit may be `i128::MAX`
    upper: i128,
    seen: HashSet<i128>,
}

impl Lane {
    fn new(limits: Vec<i128>) -> Self {
        let mut lane = Self {
            limits,
            band: 0,
            lower: 0,
            upper: 0,
            seen: HashSet::new(),
        };
        lane.enter(0);
        lane
    }

    fn band_bounds(&self, band: usize) -> (i128, i128) {
        let limits = &self.limits;
        match band {
            0 => (limits[0], limits[1] - 1),
            1 => (limits[1], limits[2]),
            _ => (limits[band] + 1, limits[band + 1]),
        }
    }

    fn enter(&mut self, band: usize) {
        let (lower, upper) = self.band_bounds(band);
        self.band = band;
        self.lower = lower;
        self.upper = upper;
        self.seen.clear();
    }

    fn exhausted(&self) -> bool {
        let width = self.upper.checked_sub(self.lower).and_then(|d| d.checked_add(1));
        match (width, i128::try_from(self.seen.len())) {
            (Some(width), Ok(seen)) => seen >= width,
            _ => false,
        }
    }

    fn draw(&mut self, rng: &mut StdRng) -> i128 {
        if self.exhausted() {
            let next = self.band + 1;
            let band = if next + 1 < self.limits.len() { next } else { 0 };
            tracing::trace!(band, "random band exhausted");
            self.enter(band);
        }
        loop {
            let candidate = rng.gen_range(self.lower..=self.upper);
            if self.seen.insert(candidate) {
                return candidate;
            }
        }
    }
}

struct RandomState {
    rng: StdRng,
    lanes: Vec<Lane>,
}

/// Random numbers unique per band
///
/// Each numeric type draws from its own lane, the configured limits cut to
/// the range the type holds exactly. Lanes with identical limits are shared.
pub struct RandomNumericSequenceGenerator {
    limits: Vec<i128>,
    kinds: Vec<(NumericKind, usize)>,
    state: Mutex<RandomState>,
}

impl RandomNumericSequenceGenerator {
    /// Serve every numeric type with explicit limits
    ///
    /// Types whose range cannot hold two of the limits are not served.
    ///
    /// # Errors
    /// `InvalidArgument` for fewer than two limits or limits not strictly
    /// ascending
    pub fn new(limits: Vec<i128>) -> SpecimenResult<Self> {
        Self::build(limits, &NumericKind::ALL)
    }

    /// Serve one numeric type with the default limits truncated to its range
    ///
    /// # Errors
    /// `InvalidArgument` when the type's range cannot hold two limits
    pub fn for_kind(kind: NumericKind) -> SpecimenResult<Self> {
        Self::build(limits_for(kind), &[kind])
    }

    /// Replace the random source with a seeded one
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.state.get_mut().rng = StdRng::seed_from_u64(seed);
        self
    }

    fn build(limits: Vec<i128>, kinds: &[NumericKind]) -> SpecimenResult<Self> {
        if limits.len() < 2 {
            return Err(SpecimenError::invalid_argument(
                "at least two limits are required",
            ));
        }
        if limits.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SpecimenError::invalid_argument(format!(
                "limits must be strictly ascending: {limits:?}"
            )));
        }
        let mut lanes = vec![Lane::new(limits.clone())];
        let mut served = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            let Some(fitted) = fit_limits(&limits, kind.min_integral(), kind.max_exact()) else {
                continue;
            };
            let lane = match lanes.iter().position(|lane| lane.limits == fitted) {
                Some(index) => index,
                None => {
                    lanes.push(Lane::new(fitted));
                    lanes.len() - 1
                }
            };
            served.push((kind, lane));
        }
        Ok(Self {
            limits,
            kinds: served,
            state: Mutex::new(RandomState {
                rng: StdRng::from_entropy(),
                lanes,
            }),
        })
    }

    /// Configured limits
    #[inline]
    #[must_use]
    pub fn limits(&self) -> &[i128] {
        &self.limits
    }

    /// Draw the next number within the configured limits
    pub fn next_number(&self) -> i128 {
        self.draw_lane(0)
    }

    /// Draw the next number for `kind`, or `None` when `kind` is not served
    pub fn next_for(&self, kind: NumericKind) -> Option<i128> {
        let lane = self
            .kinds
            .iter()
            .find_map(|(served, lane)| (*served == kind).then_some(*lane))?;
        Some(self.draw_lane(lane))
    }

    fn draw_lane(&self, lane: usize) -> i128 {
        let mut state = self.state.lock();
        let RandomState { rng, lanes } = &mut *state;
        lanes[lane].draw(rng)
    }
}

/// Limits cut to `[min, max]`
///
/// Limits past `max` collapse into `max` and limits below `min` into `min`.
/// `None` when fewer than two limits remain.
fn fit_limits(limits: &[i128], min: i128, max: i128) -> Option<Vec<i128>> {
    let mut fitted: Vec<i128> = Vec::with_capacity(limits.len());
    for limit in limits.iter().map(|l| (*l).clamp(min, max)) {
        if fitted.last() != Some(&limit) {
            fitted.push(limit);
        }
    }
    (fitted.len() >= 2).then_some(fitted)
}

/// Default limits cut at the largest integer `kind` holds exactly
#[must_use]
pub fn limits_for(kind: NumericKind) -> Vec<i128> {
    fit_limits(&DEFAULT_LIMITS, kind.min_integral(), kind.max_exact())
        .unwrap_or_else(|| DEFAULT_LIMITS.to_vec())
}

impl fmt::Debug for RandomNumericSequenceGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomNumericSequenceGenerator")
            .field("limits", &self.limits)
            .field(
                "kinds",
                &self.kinds.iter().map(|(kind, _)| kind).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl SpecimenBuilder for RandomNumericSequenceGenerator {
    fn create(&self, request: &Request, _: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let Some(kind) = request.as_type().and_then(|key| key.shape().numeric()) else {
            return Ok(Specimen::NoSpecimen);
        };
        match self.next_for(kind) {
            Some(value) => kind.to_value(value).map(Specimen::Value),
            None => Ok(Specimen::NoSpecimen),
        }
    }
}
