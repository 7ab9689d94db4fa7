//! Validated coordinates and the dual coordinate/code location type.

use std::fmt;
use std::hash::{Hash, Hasher};

use alfalfa_types::code::GeoCode;
use serde::{Deserialize, Serialize};

use crate::compute::geocode;
use crate::compute::geometry::{self, DistanceUnit};
use crate::compute::validation::{validate_latitude, validate_longitude};
use crate::error::Result;

/// A latitude/longitude pair in degrees, validated on construction.
///
/// Latitude lies in [-90, 90] and longitude in [-180, 180]. Both poles are
/// valid points; every longitude names the same place there.
///
/// # Examples
///
/// ```
/// use alfalfa::Coordinate;
///
/// let ocean_beach = Coordinate::new(37.756235, -122.47727).unwrap();
/// assert_eq!(ocean_beach.latitude(), 37.756235);
///
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate", into = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting out-of-range or non-finite values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        validate_latitude(latitude)?;
        validate_longitude(longitude)?;
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Build from values already known to be on the grid.
    pub(crate) const fn from_grid(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// The Z-order code of this coordinate.
    pub fn code(&self) -> GeoCode {
        geocode::encode_coordinate(self)
    }

    /// Great-circle distance in the given unit.
    pub fn distance_to(&self, other: &Coordinate, unit: DistanceUnit) -> f64 {
        geometry::haversine_distance(self, other, unit)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

impl From<Coordinate> for geo::Point<f64> {
    fn from(coordinate: Coordinate) -> Self {
        geo::Point::new(coordinate.longitude, coordinate.latitude)
    }
}

impl TryFrom<geo::Point<f64>> for Coordinate {
    type Error = crate::error::AlfalfaError;

    fn try_from(point: geo::Point<f64>) -> Result<Self> {
        Coordinate::new(point.y(), point.x())
    }
}

#[derive(Serialize, Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = crate::error::AlfalfaError;

    fn try_from(raw: RawCoordinate) -> Result<Self> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl From<Coordinate> for RawCoordinate {
    fn from(coordinate: Coordinate) -> Self {
        Self {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        }
    }
}

/// A point known by its coordinate, its Z-order code, or both.
///
/// Whichever side is missing is computed on access. A location built from a
/// code reports the decoded grid point as its coordinate; one built from a
/// coordinate reports the encoded code. Two locations are equal when their
/// codes are equal.
///
/// # Examples
///
/// ```
/// use alfalfa::GeoLocation;
///
/// let here = GeoLocation::from_coordinates(45.0, 90.0).unwrap();
/// assert_eq!(here.code().value(), 0xF000_0000_0000_0000);
///
/// let same = GeoLocation::from_code(here.code());
/// assert_eq!(same.latitude(), 45.0);
/// assert_eq!(here, same);
/// ```
#[derive(Debug, Clone, Copy)]
pub enum GeoLocation {
    /// Only the coordinate is known
    Coordinate(Coordinate),
    /// Only the code is known
    Code(GeoCode),
    /// Both are known and agree
    Both(Coordinate, GeoCode),
}

impl GeoLocation {
    /// Validate and wrap a latitude/longitude pair.
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Result<Self> {
        Ok(Self::Coordinate(Coordinate::new(latitude, longitude)?))
    }

    pub fn from_coordinate(coordinate: Coordinate) -> Self {
        Self::Coordinate(coordinate)
    }

    /// Wrap a code. The sentinel is folded into the largest real code.
    pub fn from_code(code: GeoCode) -> Self {
        Self::Code(GeoCode::new(code.value()))
    }

    /// Parse a 16-digit hex storage key.
    pub fn from_key(key: &str) -> Result<Self> {
        Ok(Self::from_code(GeoCode::from_key(key)?))
    }

    pub fn code(&self) -> GeoCode {
        match self {
            Self::Coordinate(coordinate) => coordinate.code(),
            Self::Code(code) | Self::Both(_, code) => *code,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        match self {
            Self::Coordinate(coordinate) | Self::Both(coordinate, _) => *coordinate,
            Self::Code(code) => {
                let (latitude, longitude) = geocode::decode(*code);
                Coordinate::from_grid(latitude, longitude)
            }
        }
    }

    pub fn latitude(&self) -> f64 {
        self.coordinate().latitude()
    }

    pub fn longitude(&self) -> f64 {
        self.coordinate().longitude()
    }

    /// The 16-digit hex storage key of this location.
    pub fn key(&self) -> String {
        self.code().to_key()
    }

    /// Materialise both representations.
    pub fn resolved(self) -> Self {
        match self {
            Self::Both(..) => self,
            _ => Self::Both(self.coordinate(), self.code()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Both(..))
    }

    /// Central angle to `other` in radians.
    pub fn radians_from(&self, other: &GeoLocation) -> f64 {
        geometry::central_angle(&self.coordinate(), &other.coordinate())
    }

    pub fn distance_from(&self, other: &GeoLocation, unit: DistanceUnit) -> f64 {
        self.radians_from(other) * unit.earth_radius()
    }

    pub fn meters_from(&self, other: &GeoLocation) -> f64 {
        self.distance_from(other, DistanceUnit::Meters)
    }

    pub fn kilometers_from(&self, other: &GeoLocation) -> f64 {
        self.distance_from(other, DistanceUnit::Kilometers)
    }

    pub fn feet_from(&self, other: &GeoLocation) -> f64 {
        self.distance_from(other, DistanceUnit::Feet)
    }

    pub fn miles_from(&self, other: &GeoLocation) -> f64 {
        self.distance_from(other, DistanceUnit::Miles)
    }
}

impl PartialEq for GeoLocation {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Eq for GeoLocation {}

impl Hash for GeoLocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code().hash(state);
    }
}

impl fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.coordinate().fmt(f)
    }
}

impl From<Coordinate> for GeoLocation {
    fn from(coordinate: Coordinate) -> Self {
        Self::Coordinate(coordinate)
    }
}

impl From<GeoCode> for GeoLocation {
    fn from(code: GeoCode) -> Self {
        Self::from_code(code)
    }
}
