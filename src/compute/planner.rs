//! Turns a radius query into batches of key ranges and filters the results.

use alfalfa_types::code::GeoCode;
use alfalfa_types::range::KeyRange;
use log::debug;

use crate::compute::geometry::{EARTH_RADIUS_METERS, GeoCircle};
use crate::compute::partition::{CoveringStats, QuadCell, covering};
use crate::config::{Config, RangeOverflow};
use crate::error::{AlfalfaError, Result};
use crate::item::GeoEntity;
use crate::location::{Coordinate, GeoLocation};

/// Plans radius queries against a store that scans key ranges.
///
/// # Examples
///
/// ```
/// use alfalfa::{Config, RangeQueryPlanner};
///
/// let planner = RangeQueryPlanner::new(&Config::default());
/// let plan = planner.plan(37.756235, -122.47727, 10_000.0).unwrap();
/// assert!(plan.range_count() > 0);
/// assert!(plan.batches().iter().all(|batch| batch.len() <= 4));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQueryPlanner {
    limit: usize,
    overflow: RangeOverflow,
    coalesce: bool,
}

impl RangeQueryPlanner {
    pub fn new(config: &Config) -> Self {
        Self {
            limit: config.max_ranges_per_scan.max(1),
            overflow: config.range_overflow,
            coalesce: config.coalesce_ranges,
        }
    }

    /// Lower the per-scan limit to the backend's, if it has one.
    pub fn with_backend_limit(mut self, limit: Option<usize>) -> Self {
        if let Some(limit) = limit {
            self.limit = self.limit.min(limit.max(1));
        }
        self
    }

    /// Key ranges sent per scan.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Plan a query for everything strictly closer than `max_meters` to the
    /// given point.
    pub fn plan(&self, latitude: f64, longitude: f64, max_meters: f64) -> Result<QueryPlan> {
        let center = Coordinate::new(latitude, longitude)?;
        let circle = GeoCircle::new(center, max_meters)?;

        let covering = covering(&circle);
        let mut ranges: Vec<KeyRange> = covering.cells.iter().map(QuadCell::key_range).collect();
        let cell_ranges = ranges.len();
        if self.coalesce {
            ranges = coalesce(ranges);
        }

        let batches = self.batch(ranges)?;

        debug!(
            "plan for {} m at {}: container depth {}, {} cells, {} ranges after coalescing, {} scans",
            max_meters,
            center,
            covering.stats.container_depth,
            cell_ranges,
            batches.iter().map(Vec::len).sum::<usize>(),
            batches.len()
        );

        Ok(QueryPlan {
            circle,
            cells: covering.cells,
            batches,
            stats: covering.stats,
        })
    }

    fn batch(&self, ranges: Vec<KeyRange>) -> Result<Vec<Vec<KeyRange>>> {
        if ranges.len() > self.limit && self.overflow == RangeOverflow::Reject {
            return Err(AlfalfaError::CapacityExceeded {
                requested: ranges.len(),
                limit: self.limit,
            });
        }

        Ok(ranges.chunks(self.limit).map(<[KeyRange]>::to_vec).collect())
    }
}

impl Default for RangeQueryPlanner {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

/// Sort ranges and merge the ones that overlap or abut.
///
/// # Examples
///
/// ```
/// use alfalfa::compute::planner::coalesce;
/// use alfalfa_types::code::GeoCode;
/// use alfalfa_types::range::KeyRange;
///
/// let ranges = vec![
///     KeyRange::new(GeoCode::new(8), GeoCode::new(15)),
///     KeyRange::new(GeoCode::new(0), GeoCode::new(7)),
///     KeyRange::new(GeoCode::new(20), GeoCode::new(23)),
/// ];
/// let merged = coalesce(ranges);
/// assert_eq!(merged.len(), 2);
/// assert_eq!(merged[0], KeyRange::new(GeoCode::new(0), GeoCode::new(15)));
/// ```
pub fn coalesce(mut ranges: Vec<KeyRange>) -> Vec<KeyRange> {
    ranges.sort_unstable();
    let mut merged: Vec<KeyRange> = Vec::with_capacity(ranges.len());

    for range in ranges {
        match merged.last_mut() {
            Some(last) if last.touches(&range) => *last = last.union(&range),
            _ => merged.push(range),
        }
    }

    merged
}

/// Key ranges to scan for one radius query, and the filter for its results.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    circle: GeoCircle,
    cells: Vec<QuadCell>,
    batches: Vec<Vec<KeyRange>>,
    stats: CoveringStats,
}

impl QueryPlan {
    pub fn center(&self) -> Coordinate {
        self.circle.center()
    }

    pub fn radius_meters(&self) -> f64 {
        self.circle.radius_meters()
    }

    pub fn circle(&self) -> &GeoCircle {
        &self.circle
    }

    /// Covering cells, disjoint and in ascending code order.
    pub fn cells(&self) -> &[QuadCell] {
        &self.cells
    }

    /// Every key range, in scan order.
    pub fn ranges(&self) -> impl Iterator<Item = &KeyRange> {
        self.batches.iter().flatten()
    }

    pub fn range_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }

    /// Ranges grouped into scans of at most the planner's limit.
    pub fn batches(&self) -> &[Vec<KeyRange>] {
        &self.batches
    }

    pub fn stats(&self) -> &CoveringStats {
        &self.stats
    }

    /// Whether a scan of this plan would return records stored under `code`.
    pub fn contains_code(&self, code: GeoCode) -> bool {
        self.ranges().any(|range| range.contains(code))
    }

    /// Great-circle distance in meters from the query center.
    pub fn distance_to(&self, location: &GeoLocation) -> f64 {
        let center = GeoLocation::from(self.center());
        center.radians_from(location) * EARTH_RADIUS_METERS
    }

    /// Whether `location` is strictly inside the radius.
    pub fn accepts(&self, location: &GeoLocation) -> bool {
        self.distance_to(location) < self.radius_meters()
    }

    /// Keep the candidates strictly closer than the radius.
    pub fn filter<'a, R, I>(&'a self, candidates: I) -> impl Iterator<Item = R> + 'a
    where
        R: GeoEntity,
        I: IntoIterator<Item = R>,
        I::IntoIter: 'a,
    {
        candidates
            .into_iter()
            .filter(move |candidate| self.accepts(&candidate.location()))
    }

    /// Like [`QueryPlan::filter`], pairing each kept candidate with its distance.
    pub fn filter_with_distance<'a, R, I>(
        &'a self,
        candidates: I,
    ) -> impl Iterator<Item = (R, f64)> + 'a
    where
        R: GeoEntity,
        I: IntoIterator<Item = R>,
        I::IntoIter: 'a,
    {
        let radius = self.radius_meters();
        candidates
            .into_iter()
            .map(move |candidate| {
                let meters = self.distance_to(&candidate.location());
                (candidate, meters)
            })
            .filter(move |(_, meters)| *meters < radius)
    }
}
