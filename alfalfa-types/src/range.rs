use crate::code::GeoCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An inclusive range of codes, scanned as one contiguous slice of the key space.
///
/// # Examples
///
/// ```
/// use alfalfa_types::code::GeoCode;
/// use alfalfa_types::range::KeyRange;
///
/// let range = KeyRange::new(GeoCode::new(0x10), GeoCode::new(0x1F));
/// assert!(range.contains(GeoCode::new(0x10)));
/// assert!(range.contains(GeoCode::new(0x1F)));
/// assert!(!range.contains(GeoCode::new(0x20)));
/// assert_eq!(range.min_key(), "0000000000000010");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KeyRange {
    /// Lowest code in the range
    pub min: GeoCode,
    /// Highest code in the range
    pub max: GeoCode,
}

impl KeyRange {
    /// Create a range; the bounds are swapped if given in reverse.
    pub fn new(min: GeoCode, max: GeoCode) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Whether `code` lies within the range, bounds included.
    pub fn contains(&self, code: GeoCode) -> bool {
        self.min <= code && code <= self.max
    }

    /// Hex key of the lower bound.
    pub fn min_key(&self) -> String {
        self.min.to_key()
    }

    /// Hex key of the upper bound.
    pub fn max_key(&self) -> String {
        self.max.to_key()
    }

    /// Number of codes covered by the range.
    pub fn code_count(&self) -> u128 {
        u128::from(self.max.value() - self.min.value()) + 1
    }

    /// Whether `other` starts exactly one code past the end of `self`.
    pub fn is_adjacent_to(&self, other: &KeyRange) -> bool {
        self.max.value().checked_add(1) == Some(other.min.value())
    }

    /// Whether the two ranges share or abut at least one code.
    pub fn touches(&self, other: &KeyRange) -> bool {
        self.is_adjacent_to(other)
            || other.is_adjacent_to(self)
            || (self.min <= other.max && other.min <= self.max)
    }

    /// Smallest range covering both.
    pub fn union(&self, other: &KeyRange) -> KeyRange {
        KeyRange {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

impl fmt::Display for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}
