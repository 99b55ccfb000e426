//! Half-open value ranges `(lo, hi]` used by the geometric filters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A half-open interval `(lo, hi]`. `hi` may be `+inf`.
///
/// In YAML a range is a two-element sequence, e.g. `[10, .inf]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct RangeFilter {
    lo: f64,
    hi: f64,
}

impl RangeFilter {
    /// Creates a range, rejecting NaN bounds and empty intervals.
    pub fn new(lo: f64, hi: f64) -> Result<Self, String> {
        if lo.is_nan() || hi.is_nan() {
            return Err("bounds must not be NaN".to_string());
        }
        if lo >= hi {
            return Err(format!("lower bound {lo} must be below upper bound {hi}"));
        }
        Ok(Self { lo, hi })
    }

    /// `(lo, +inf]` for a known-good constant bound.
    pub(crate) fn above(lo: f64) -> Self {
        Self {
            lo,
            hi: f64::INFINITY,
        }
    }

    /// Lower (exclusive) bound.
    pub fn lo(&self) -> f64 {
        self.lo
    }

    /// Upper (inclusive) bound.
    pub fn hi(&self) -> f64 {
        self.hi
    }

    /// Returns true if `lo < value <= hi`.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.lo < value && value <= self.hi
    }
}

impl TryFrom<[f64; 2]> for RangeFilter {
    type Error = String;

    fn try_from([lo, hi]: [f64; 2]) -> Result<Self, Self::Error> {
        RangeFilter::new(lo, hi)
    }
}

impl From<RangeFilter> for [f64; 2] {
    fn from(range: RangeFilter) -> Self {
        [range.lo, range.hi]
    }
}

/// Parses `lo:hi` (or `lo,hi`); either bound may be `inf`.
impl FromStr for RangeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lo, hi) = s
            .split_once(':')
            .or_else(|| s.split_once(','))
            .ok_or_else(|| format!("expected 'lo:hi', got '{s}'"))?;
        let lo = parse_bound(lo)?;
        let hi = parse_bound(hi)?;
        RangeFilter::new(lo, hi)
    }
}

fn parse_bound(raw: &str) -> Result<f64, String> {
    let raw = raw.trim();
    raw.parse::<f64>()
        .map_err(|_| format!("invalid range bound '{raw}'"))
}

impl fmt::Display for RangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}]", self.lo, self.hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_half_open() {
        let range = RangeFilter::new(10.0, 20.0).unwrap();
        assert!(!range.contains(10.0));
        assert!(range.contains(10.5));
        assert!(range.contains(20.0));
        assert!(!range.contains(20.1));
        assert!(!range.contains(f64::NAN));
    }

    #[test]
    fn unbounded_upper_end() {
        let range: RangeFilter = "10:inf".parse().unwrap();
        assert_eq!(range.hi(), f64::INFINITY);
        assert!(range.contains(1e9));
        assert!(!range.contains(10.0));
    }

    #[test]
    fn rejects_malformed_ranges() {
        assert!(RangeFilter::new(5.0, 5.0).is_err());
        assert!(RangeFilter::new(6.0, 5.0).is_err());
        assert!(RangeFilter::new(f64::NAN, 5.0).is_err());
        assert!("10".parse::<RangeFilter>().is_err());
        assert!("a:b".parse::<RangeFilter>().is_err());
    }

    #[test]
    fn yaml_sequence_form() {
        let range: RangeFilter = serde_yaml::from_str("[0.5, .inf]").unwrap();
        assert_eq!(range.lo(), 0.5);
        assert_eq!(range.hi(), f64::INFINITY);

        assert!(serde_yaml::from_str::<RangeFilter>("[3, 1]").is_err());
    }

    #[test]
    fn display_uses_interval_notation() {
        assert_eq!(RangeFilter::new(10.0, f64::INFINITY).unwrap().to_string(), "(10, inf]");
        assert_eq!("0.5,1".parse::<RangeFilter>().unwrap().to_string(), "(0.5, 1]");
    }
}
