//! Radius queries over a storage backend.
//!
//! This module defines [`GeoStore`], which stages writes for a backend and
//! answers "everything within N meters of here" by planning key ranges,
//! scanning them in batches and filtering the candidates by exact distance.

use log::debug;

use crate::compute::planner::{QueryPlan, RangeQueryPlanner};
use crate::config::Config;
use crate::error::{AlfalfaError, Result};
use crate::item::{EntityKey, GeoEntity, GeoItem};
use crate::storage::{MemoryBackend, StorageBackend, StorageOp};

#[cfg(feature = "sync")]
mod sync;

#[cfg(feature = "sync")]
pub use sync::SyncGeoStore;

/// A located-record store over a sorted key-value backend.
///
/// Writes are staged with [`upsert`](GeoStore::upsert) and
/// [`delete`](GeoStore::delete) and reach the backend on
/// [`save_changes`](GeoStore::save_changes). Queries always read the backend,
/// never the staged writes.
///
/// # Thread Safety
///
/// `GeoStore` takes `&mut self` for writes and has no interior locking. Enable
/// the `sync` feature for `SyncGeoStore`, or wrap it yourself.
///
/// # Examples
///
/// ```rust
/// use alfalfa::{GeoItem, GeoStore};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = GeoStore::memory();
///
/// store.upsert([
///     GeoItem::at(37.756240, -122.47727, "surf shop")?,
///     GeoItem::at(37.756235, -121.0, "far away")?,
/// ]);
/// store.save_changes()?;
///
/// let nearby: Vec<GeoItem> = store.query_near(37.756235, -122.47727, 10_000.0)?.collect();
/// assert_eq!(nearby.len(), 1);
/// assert_eq!(nearby[0].payload().as_ref(), b"surf shop");
/// # Ok(())
/// # }
/// ```
pub struct GeoStore<B: StorageBackend = MemoryBackend<GeoItem>> {
    backend: B,
    config: Config,
    planner: RangeQueryPlanner,
    pending: Vec<StorageOp<B::Record>>,
}

impl GeoStore<MemoryBackend<GeoItem>> {
    /// In-memory store with the default configuration.
    pub fn memory() -> Self {
        Self::new(MemoryBackend::new())
    }
}

impl<B: StorageBackend> GeoStore<B> {
    /// Store over `backend` with the default configuration.
    pub fn new(backend: B) -> Self {
        let config = Config::default();
        let planner = RangeQueryPlanner::new(&config).with_backend_limit(backend.max_ranges_per_scan());
        Self {
            backend,
            config,
            planner,
            pending: Vec::new(),
        }
    }

    /// Store over `backend` with a validated configuration.
    pub fn with_config(backend: B, config: Config) -> Result<Self> {
        config.validate().map_err(AlfalfaError::InvalidInput)?;

        let planner = RangeQueryPlanner::new(&config).with_backend_limit(backend.max_ranges_per_scan());
        Ok(Self {
            backend,
            config,
            planner,
            pending: Vec::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Give up the store and return its backend. Staged writes are dropped.
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Stage inserts or replacements.
    pub fn upsert<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = B::Record>,
    {
        self.pending.extend(records.into_iter().map(StorageOp::Upsert));
    }

    /// Stage deletes of the given records.
    pub fn delete<'a, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'a B::Record>,
        B::Record: 'a,
    {
        self.pending
            .extend(records.into_iter().map(|record| StorageOp::Delete(record.key())));
    }

    /// Stage a delete by key.
    pub fn delete_key(&mut self, key: EntityKey) {
        self.pending.push(StorageOp::Delete(key));
    }

    /// Number of staged writes.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Drop every staged write, returning how many there were.
    pub fn discard_changes(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    /// Send staged writes to the backend in one batch.
    ///
    /// On failure the backend's error is returned unchanged and the writes
    /// stay staged.
    pub fn save_changes(&mut self) -> Result<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let count = self.pending.len();
        self.backend.apply(self.pending.clone())?;
        self.pending.clear();

        debug!("saved {} staged writes", count);
        Ok(count)
    }

    /// Plan a radius query without running it.
    pub fn plan(&self, latitude: f64, longitude: f64, max_meters: f64) -> Result<QueryPlan> {
        self.planner.plan(latitude, longitude, max_meters)
    }

    /// Records strictly closer than `max_meters` to the given point.
    ///
    /// Order follows the key order of the scanned ranges.
    pub fn query_near(
        &self,
        latitude: f64,
        longitude: f64,
        max_meters: f64,
    ) -> Result<impl Iterator<Item = B::Record> + use<B>> {
        let plan = self.plan(latitude, longitude, max_meters)?;
        let candidates = self.scan(&plan)?;
        let found: Vec<B::Record> = plan.filter(candidates).collect();
        Ok(found.into_iter())
    }

    /// Up to `limit` records within `max_meters`, nearest first, with their
    /// distances in meters.
    pub fn query_near_sorted(
        &self,
        latitude: f64,
        longitude: f64,
        max_meters: f64,
        limit: usize,
    ) -> Result<Vec<(B::Record, f64)>> {
        let plan = self.plan(latitude, longitude, max_meters)?;
        let candidates = self.scan(&plan)?;

        let mut found: Vec<(B::Record, f64)> = plan.filter_with_distance(candidates).collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1));
        found.truncate(limit);
        Ok(found)
    }

    /// Number of records strictly closer than `max_meters`.
    pub fn count_near(&self, latitude: f64, longitude: f64, max_meters: f64) -> Result<usize> {
        let plan = self.plan(latitude, longitude, max_meters)?;
        let candidates = self.scan(&plan)?;
        Ok(plan.filter(candidates).count())
    }

    /// Close the backend. Staged writes are dropped.
    pub fn close(&mut self) -> Result<()> {
        self.pending.clear();
        self.backend.close()
    }

    fn scan(&self, plan: &QueryPlan) -> Result<Vec<B::Record>> {
        let mut candidates = Vec::new();
        for batch in plan.batches() {
            candidates.extend(self.backend.scan(batch)?);
        }

        debug!(
            "scanned {} ranges in {} requests, {} candidates",
            plan.range_count(),
            plan.batches().len(),
            candidates.len()
        );
        Ok(candidates)
    }
}

impl<B: StorageBackend + Default> Default for GeoStore<B> {
    fn default() -> Self {
        Self::new(B::default())
    }
}
