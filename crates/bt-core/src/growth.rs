//! Weight percentiles against a growth reference curve.
//!
//! The reference is a table of dated weight bands (15th, 25th, 50th, 75th and
//! 85th percentile), usually a WHO weight-for-age curve already aligned to the
//! child's birth date. A weigh-in is placed by interpolating the bands linearly
//! in time between the two surrounding rows, then interpolating linearly in
//! weight between the two surrounding bands.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Percentile ranks carried by every reference row, lowest first.
pub const BAND_PERCENTILES: [u8; 5] = [15, 25, 50, 75, 85];

/// One dated row of the reference table. Weights are in kilograms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthPoint {
    pub at: DateTime<Utc>,
    pub p15: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p85: f64,
}

impl GrowthPoint {
    const fn bands(&self) -> [f64; 5] {
        [self.p15, self.p25, self.p50, self.p75, self.p85]
    }
}

/// Where a weight falls relative to the reference bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Percentile {
    /// At or below the lowest band.
    Below(u8),
    /// Between two bands, rounded to a whole percentile.
    Exact(u8),
    /// At or above the highest band.
    Above(u8),
}

impl fmt::Display for Percentile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Below(p) => write!(f, "< P{p}"),
            Self::Exact(p) => write!(f, "{p}%"),
            Self::Above(p) => write!(f, "> P{p}"),
        }
    }
}

impl Serialize for Percentile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A growth reference table, sorted by time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrowthReference {
    points: Vec<GrowthPoint>,
}

impl GrowthReference {
    pub fn new(mut points: Vec<GrowthPoint>) -> Self {
        points.sort_by_key(|p| p.at);
        Self { points }
    }

    pub fn points(&self) -> &[GrowthPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Band weights interpolated at `at`.
    ///
    /// `None` outside `[first row, last row)`: the table is never extrapolated.
    #[allow(clippy::cast_precision_loss)]
    pub fn bands_at(&self, at: DateTime<Utc>) -> Option<[f64; 5]> {
        let pair = self
            .points
            .windows(2)
            .find(|pair| pair[0].at <= at && at < pair[1].at)?;
        let (lower, upper) = (pair[0].bands(), pair[1].bands());
        let span = (pair[1].at - pair[0].at).num_milliseconds() as f64;
        let factor = (at - pair[0].at).num_milliseconds() as f64 / span;
        Some(std::array::from_fn(|i| lower[i] + (upper[i] - lower[i]) * factor))
    }

    /// Percentile of `weight_kg` at `at`, or `None` outside the table.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percentile(&self, weight_kg: f64, at: DateTime<Utc>) -> Option<Percentile> {
        let bands = self.bands_at(at)?;
        let [lowest, .., highest] = BAND_PERCENTILES;
        if weight_kg <= bands[0] {
            return Some(Percentile::Below(lowest));
        }
        if weight_kg >= bands[4] {
            return Some(Percentile::Above(highest));
        }

        // bands[i] <= weight < bands[i + 1]
        let i = bands.windows(2).position(|pair| weight_kg < pair[1])?;
        let fraction = (weight_kg - bands[i]) / (bands[i + 1] - bands[i]);
        let lower = f64::from(BAND_PERCENTILES[i]);
        let upper = f64::from(BAND_PERCENTILES[i + 1]);
        let exact = lower + fraction * (upper - lower);
        Some(Percentile::Exact(exact.round() as u8))
    }
}
