use geo::Rect;
use serde::{Deserialize, Serialize};

/// A latitude/longitude rectangle.
///
/// This is a wrapper around `geo::Rect` with `x` as longitude and `y` as
/// latitude, exposing the sides by compass direction. Containment tests are
/// inclusive on every side.
///
/// # Examples
///
/// ```
/// use alfalfa_types::rect::GeoRect;
///
/// let bay_area = GeoRect::new(37.0, -123.0, 38.5, -121.5);
/// assert!(bay_area.contains(37.756235, -122.47727));
/// assert!(!bay_area.contains(40.7128, -74.0060));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoRect {
    /// The underlying geometric rectangle
    pub rect: Rect,
}

impl GeoRect {
    /// Create a rectangle from its south-west and north-east corners.
    ///
    /// # Arguments
    ///
    /// * `south` - Minimum latitude
    /// * `west` - Minimum longitude
    /// * `north` - Maximum latitude
    /// * `east` - Maximum longitude
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            rect: Rect::new(
                geo::coord! { x: west, y: south },
                geo::coord! { x: east, y: north },
            ),
        }
    }

    /// Create a rectangle from a `geo::Rect`.
    pub fn from_rect(rect: Rect) -> Self {
        Self { rect }
    }

    /// Minimum latitude.
    pub fn south(&self) -> f64 {
        self.rect.min().y
    }

    /// Minimum longitude.
    pub fn west(&self) -> f64 {
        self.rect.min().x
    }

    /// Maximum latitude.
    pub fn north(&self) -> f64 {
        self.rect.max().y
    }

    /// Maximum longitude.
    pub fn east(&self) -> f64 {
        self.rect.max().x
    }

    /// Latitude span in degrees.
    pub fn height(&self) -> f64 {
        self.north() - self.south()
    }

    /// Longitude span in degrees.
    pub fn width(&self) -> f64 {
        self.east() - self.west()
    }

    /// Center as `(latitude, longitude)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.south() + self.north()) / 2.0,
            (self.west() + self.east()) / 2.0,
        )
    }

    /// Corners as `(latitude, longitude)`: south-west, north-west, north-east, south-east.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.south(), self.west()),
            (self.north(), self.west()),
            (self.north(), self.east()),
            (self.south(), self.east()),
        ]
    }

    /// Whether the point lies inside or on the boundary.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.south()
            && latitude <= self.north()
            && longitude >= self.west()
            && longitude <= self.east()
    }

    /// Whether `other` lies entirely inside this rectangle.
    pub fn contains_rect(&self, other: &GeoRect) -> bool {
        self.south() <= other.south()
            && self.west() <= other.west()
            && self.north() >= other.north()
            && self.east() >= other.east()
    }

    /// Whether the two rectangles share at least one point.
    pub fn intersects(&self, other: &GeoRect) -> bool {
        !(self.north() < other.south()
            || self.south() > other.north()
            || self.east() < other.west()
            || self.west() > other.east())
    }
}

impl From<Rect> for GeoRect {
    fn from(rect: Rect) -> Self {
        Self::from_rect(rect)
    }
}

impl From<GeoRect> for Rect {
    fn from(rect: GeoRect) -> Self {
        rect.rect
    }
}
