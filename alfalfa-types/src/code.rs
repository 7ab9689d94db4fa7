use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of the hex key a code is stored under.
pub const KEY_LEN: usize = 16;

/// A 64-bit Z-order code addressing a point of the latitude/longitude grid.
///
/// Bits are interleaved most-significant first, one longitude bit followed by
/// one latitude bit, so codes sharing a 2N-bit prefix lie in the same
/// depth-N quadtree cell.
///
/// The all-ones value is reserved as [`GeoCode::UNSPECIFIED`]. Constructing a
/// code from that value yields `u64::MAX - 1` instead; the sentinel itself is
/// only reachable through the constant.
///
/// Codes serialize as their hex key, which sorts exactly like the integer.
///
/// # Examples
///
/// ```
/// use alfalfa_types::code::GeoCode;
///
/// let code = GeoCode::new(u64::MAX);
/// assert_eq!(code.value(), u64::MAX - 1);
/// assert!(!code.is_unspecified());
///
/// let parsed = GeoCode::from_key("00000000000000FF").unwrap();
/// assert_eq!(parsed.value(), 0xFF);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GeoCode(u64);

impl GeoCode {
    /// Sentinel meaning "not computed yet". Never a real code.
    pub const UNSPECIFIED: GeoCode = GeoCode(u64::MAX);

    /// Smallest real code (south-west corner of the grid).
    pub const MIN: GeoCode = GeoCode(0);

    /// Largest real code (north-east corner of the grid).
    pub const MAX: GeoCode = GeoCode(u64::MAX - 1);

    /// Create a code, folding the sentinel value onto its neighbour.
    pub const fn new(raw: u64) -> Self {
        if raw == u64::MAX {
            GeoCode(raw - 1)
        } else {
            GeoCode(raw)
        }
    }

    /// The raw integer value.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Whether this is the reserved sentinel.
    pub const fn is_unspecified(self) -> bool {
        self.0 == u64::MAX
    }

    /// The 16-character zero-padded uppercase hex key for this code.
    pub fn to_key(self) -> String {
        format!("{:016X}", self.0)
    }

    /// Parse a hex key produced by [`GeoCode::to_key`].
    ///
    /// Lowercase digits are accepted; anything that is not exactly sixteen
    /// hex digits is rejected.
    pub fn from_key(key: &str) -> Result<Self, ParseGeoCodeError> {
        if key.len() != KEY_LEN {
            return Err(ParseGeoCodeError::Length(key.len()));
        }
        if !key.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseGeoCodeError::Digit(key.to_string()));
        }
        u64::from_str_radix(key, 16)
            .map(GeoCode::new)
            .map_err(|_| ParseGeoCodeError::Digit(key.to_string()))
    }
}

impl fmt::Display for GeoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

impl FromStr for GeoCode {
    type Err = ParseGeoCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GeoCode::from_key(s)
    }
}

impl From<GeoCode> for u64 {
    fn from(code: GeoCode) -> Self {
        code.0
    }
}

impl From<GeoCode> for String {
    fn from(code: GeoCode) -> Self {
        code.to_key()
    }
}

impl TryFrom<String> for GeoCode {
    type Error = ParseGeoCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        GeoCode::from_key(&value)
    }
}

/// Error returned when a hex key cannot be parsed into a [`GeoCode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseGeoCodeError {
    /// The key was not sixteen characters long.
    Length(usize),
    /// The key contained a non-hex character.
    Digit(String),
}

impl fmt::Display for ParseGeoCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseGeoCodeError::Length(len) => {
                write!(f, "key must be {} hex digits, got {} characters", KEY_LEN, len)
            }
            ParseGeoCodeError::Digit(key) => write!(f, "key contains non-hex digits: {:?}", key),
        }
    }
}

impl std::error::Error for ParseGeoCodeError {}
