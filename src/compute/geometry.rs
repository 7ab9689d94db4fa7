//! Spherical geometry for radius queries.
//!
//! Distances use the haversine formula on a sphere of radius
//! [`EARTH_RADIUS_METERS`]. The overlap test between a cell rectangle and a
//! query circle is conservative: it may accept a rectangle the circle only
//! nearly touches, but never rejects one the circle reaches.

use std::f64::consts::FRAC_PI_2;

use alfalfa_types::rect::GeoRect;
use serde::{Deserialize, Serialize};

use crate::compute::validation::validate_radius;
use crate::error::Result;
use crate::location::Coordinate;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KILOMETERS: f64 = EARTH_RADIUS_METERS / 1000.0;

/// Mean Earth radius in international feet.
pub const EARTH_RADIUS_FEET: f64 = EARTH_RADIUS_METERS / (0.0254 * 12.0);

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = EARTH_RADIUS_FEET / 5280.0;

/// Relative tolerance applied to the nearest-point distance check.
const OVERLAP_SLACK: f64 = 1e-9;

/// Unit for distances derived from a central angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    #[default]
    Meters,
    Kilometers,
    Feet,
    Miles,
}

impl DistanceUnit {
    /// Earth radius expressed in this unit.
    pub const fn earth_radius(self) -> f64 {
        match self {
            DistanceUnit::Meters => EARTH_RADIUS_METERS,
            DistanceUnit::Kilometers => EARTH_RADIUS_KILOMETERS,
            DistanceUnit::Feet => EARTH_RADIUS_FEET,
            DistanceUnit::Miles => EARTH_RADIUS_MILES,
        }
    }

    /// Convert a distance in meters to this unit.
    pub fn from_meters(self, meters: f64) -> f64 {
        meters / EARTH_RADIUS_METERS * self.earth_radius()
    }
}

/// Central angle in radians between two coordinates.
///
/// # Examples
///
/// ```
/// use alfalfa::Coordinate;
/// use alfalfa::compute::geometry::central_angle;
///
/// let a = Coordinate::new(45.0, 90.0).unwrap();
/// let b = Coordinate::new(0.0, 0.0).unwrap();
/// assert!((central_angle(&a, &b) - std::f64::consts::FRAC_PI_2).abs() < 1e-15);
/// ```
pub fn central_angle(a: &Coordinate, b: &Coordinate) -> f64 {
    angle_between(a.latitude(), a.longitude(), b.latitude(), b.longitude())
}

/// Great-circle distance between two coordinates in `unit`.
pub fn haversine_distance(a: &Coordinate, b: &Coordinate, unit: DistanceUnit) -> f64 {
    central_angle(a, b) * unit.earth_radius()
}

/// Longitude span in degrees covered by `meters` along the parallel at `latitude`.
///
/// Grows without bound towards the poles and is infinite at them.
pub fn meters_to_longitude_difference(meters: f64, latitude: f64) -> f64 {
    (meters / (latitude.to_radians().cos() * EARTH_RADIUS_METERS)).to_degrees()
}

/// Haversine central angle on raw degree values.
///
/// Callers may pass rectangle corners that lie slightly past the valid
/// coordinate range; the formula is periodic in longitude.
///
/// Works on the unit sphere so callers scale by [`EARTH_RADIUS_METERS`];
/// `geo::Haversine` assumes a larger mean radius (6,371,008.8 m).
pub(crate) fn angle_between(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let sin_lat = (d_lat / 2.0).sin();
    let sin_lon = (d_lon / 2.0).sin();

    let a = sin_lat * sin_lat
        + lat1.to_radians().cos() * lat2.to_radians().cos() * sin_lon * sin_lon;

    2.0 * a.clamp(0.0, 1.0).sqrt().asin()
}

/// A query circle: a center and a radius in meters, plus its bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCircle {
    center: Coordinate,
    radius_meters: f64,
    bounds: GeoRect,
}

impl GeoCircle {
    /// Create a circle. The radius must be finite and not negative.
    pub fn new(center: Coordinate, radius_meters: f64) -> Result<Self> {
        validate_radius(radius_meters)?;

        let angular = radius_meters / EARTH_RADIUS_METERS;
        let half_height = angular.to_degrees();
        let half_width = longitude_half_width(center.latitude(), radius_meters);

        let bounds = GeoRect::new(
            center.latitude() - half_height,
            center.longitude() - half_width,
            center.latitude() + half_height,
            center.longitude() + half_width,
        );

        Ok(Self {
            center,
            radius_meters,
            bounds,
        })
    }

    #[inline]
    pub fn center(&self) -> Coordinate {
        self.center
    }

    #[inline]
    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }

    /// Radius as a central angle in radians.
    pub fn angular_radius(&self) -> f64 {
        self.radius_meters / EARTH_RADIUS_METERS
    }

    /// Bounding rectangle. Edges may extend past the valid coordinate range.
    #[inline]
    pub fn bounds(&self) -> &GeoRect {
        &self.bounds
    }

    /// Whether a point lies within the radius (inclusive).
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        self.angle_to(latitude, longitude) * EARTH_RADIUS_METERS <= self.radius_meters
    }

    fn angle_to(&self, latitude: f64, longitude: f64) -> f64 {
        angle_between(
            self.center.latitude(),
            self.center.longitude(),
            latitude,
            longitude,
        )
    }
}

/// Half the longitude span of a circle's bounding rectangle, in degrees.
///
/// Starts from the parallel-arc estimate and widens it to the true extent of
/// the spherical cap, `asin(sin d / cos lat)`, which is never narrower. A cap
/// that reaches a pole covers all longitudes.
fn longitude_half_width(latitude: f64, radius_meters: f64) -> f64 {
    let angular = radius_meters / EARTH_RADIUS_METERS;
    let colatitude = FRAC_PI_2 - latitude.to_radians().abs();
    if angular >= colatitude {
        return 360.0;
    }

    let estimate = meters_to_longitude_difference(radius_meters, latitude);
    let cap = (angular.sin() / latitude.to_radians().cos())
        .clamp(-1.0, 1.0)
        .asin()
        .to_degrees();
    estimate.max(cap)
}

/// Whether `circle` may reach any point of `rect`.
///
/// Accepts when any of these holds:
/// - the rectangle contains the circle's center;
/// - the rectangle crosses the circle's north-south axis within its latitude
///   extent, or its east-west axis within its longitude extent;
/// - a corner of the rectangle lies within the radius;
/// - the nearest point of the rectangle lies within the radius.
///
/// # Examples
///
/// ```
/// use alfalfa::Coordinate;
/// use alfalfa::compute::geometry::{overlaps, GeoCircle};
/// use alfalfa_types::rect::GeoRect;
///
/// let circle = GeoCircle::new(Coordinate::new(0.0, 0.0).unwrap(), 1000.0).unwrap();
/// assert!(overlaps(&GeoRect::new(-1.0, -1.0, 1.0, 1.0), &circle));
/// assert!(!overlaps(&GeoRect::new(10.0, 10.0, 20.0, 20.0), &circle));
/// ```
pub fn overlaps(rect: &GeoRect, circle: &GeoCircle) -> bool {
    let center = circle.center();
    rect.contains(center.latitude(), center.longitude())
        || crosses_axis(rect, circle)
        || rect
            .corners()
            .iter()
            .any(|&(latitude, longitude)| circle.contains(latitude, longitude))
        || nearest_point_within(rect, circle)
}

fn crosses_axis(rect: &GeoRect, circle: &GeoCircle) -> bool {
    let bounds = circle.bounds();
    let (latitude, longitude) = (circle.center().latitude(), circle.center().longitude());

    let on_meridian = rect.west() <= longitude
        && longitude <= rect.east()
        && rect.south() <= bounds.north()
        && bounds.south() <= rect.north();

    let on_parallel = rect.south() <= latitude
        && latitude <= rect.north()
        && rect.west() <= bounds.east()
        && bounds.west() <= rect.east();

    on_meridian || on_parallel
}

fn nearest_point_within(rect: &GeoRect, circle: &GeoCircle) -> bool {
    let reach = circle.angular_radius() * (1.0 + OVERLAP_SLACK);
    angle_to_rect(rect, circle) <= reach
}

/// Smallest central angle from the circle's center to any point of `rect`.
fn angle_to_rect(rect: &GeoRect, circle: &GeoCircle) -> f64 {
    let (latitude, longitude) = (circle.center().latitude(), circle.center().longitude());

    if rect.west() <= longitude && longitude <= rect.east() {
        // Straight north or south along the center's meridian.
        let nearest = latitude.clamp(rect.south(), rect.north());
        return circle.angle_to(nearest, longitude);
    }

    // Otherwise the nearest point lies on one of the two meridian edges.
    [rect.west(), rect.east()]
        .into_iter()
        .map(|edge| angle_to_meridian_segment(circle, edge, rect.south(), rect.north()))
        .fold(f64::INFINITY, f64::min)
}

/// Smallest central angle from the circle's center to the meridian `longitude`
/// between `south` and `north`.
fn angle_to_meridian_segment(circle: &GeoCircle, longitude: f64, south: f64, north: f64) -> f64 {
    let center = circle.center();
    let phi = center.latitude().to_radians();
    let d_lon = (longitude - center.longitude()).to_radians();

    // Latitude on the full meridian closest to the center.
    let closest = phi.sin().atan2(phi.cos() * d_lon.cos()).to_degrees();

    [south, north, closest.clamp(south, north)]
        .into_iter()
        .map(|candidate| circle.angle_to(candidate, longitude))
        .fold(f64::INFINITY, f64::min)
}
