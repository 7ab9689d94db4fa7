//! Thread-safe wrapper for concurrent store access.
//!
//! Enable the `sync` feature to use this module:
//!
//! ```toml
//! [dependencies]
//! alfalfa = { version = "0.1", features = ["sync"] }
//! ```
//!
//! # Examples
//!
//! ```rust
//! use alfalfa::{GeoItem, SyncGeoStore};
//! use std::thread;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SyncGeoStore::memory();
//! let writer = store.clone();
//!
//! let handle = thread::spawn(move || {
//!     writer.upsert([GeoItem::at(37.756240, -122.47727, "pier").unwrap()]);
//!     writer.save_changes().unwrap();
//! });
//! handle.join().unwrap();
//!
//! assert_eq!(store.count_near(37.756235, -122.47727, 1_000.0)?, 1);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use parking_lot::RwLock;

use super::GeoStore;
use crate::compute::planner::QueryPlan;
use crate::error::Result;
use crate::item::{EntityKey, GeoItem};
use crate::storage::{MemoryBackend, StorageBackend};

/// Thread-safe wrapper around `GeoStore` using `Arc<RwLock<GeoStore>>`.
///
/// Queries take the read lock and run concurrently. Staging and saving take
/// the write lock. Clones share the same store.
pub struct SyncGeoStore<B: StorageBackend = MemoryBackend<GeoItem>> {
    inner: Arc<RwLock<GeoStore<B>>>,
}

impl<B: StorageBackend> Clone for SyncGeoStore<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SyncGeoStore<MemoryBackend<GeoItem>> {
    /// In-memory store with the default configuration.
    pub fn memory() -> Self {
        Self::new(GeoStore::memory())
    }
}

impl<B: StorageBackend> SyncGeoStore<B> {
    pub fn new(store: GeoStore<B>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn upsert<I>(&self, records: I)
    where
        I: IntoIterator<Item = B::Record>,
    {
        self.inner.write().upsert(records);
    }

    pub fn delete<'a, I>(&self, records: I)
    where
        I: IntoIterator<Item = &'a B::Record>,
        B::Record: 'a,
    {
        self.inner.write().delete(records);
    }

    pub fn delete_key(&self, key: EntityKey) {
        self.inner.write().delete_key(key);
    }

    pub fn pending(&self) -> usize {
        self.inner.read().pending()
    }

    pub fn discard_changes(&self) -> usize {
        self.inner.write().discard_changes()
    }

    pub fn save_changes(&self) -> Result<usize> {
        self.inner.write().save_changes()
    }

    pub fn plan(&self, latitude: f64, longitude: f64, max_meters: f64) -> Result<QueryPlan> {
        self.inner.read().plan(latitude, longitude, max_meters)
    }

    /// Records strictly closer than `max_meters`, collected under the read lock.
    pub fn query_near(
        &self,
        latitude: f64,
        longitude: f64,
        max_meters: f64,
    ) -> Result<Vec<B::Record>> {
        Ok(self
            .inner
            .read()
            .query_near(latitude, longitude, max_meters)?
            .collect())
    }

    pub fn query_near_sorted(
        &self,
        latitude: f64,
        longitude: f64,
        max_meters: f64,
        limit: usize,
    ) -> Result<Vec<(B::Record, f64)>> {
        self.inner
            .read()
            .query_near_sorted(latitude, longitude, max_meters, limit)
    }

    pub fn count_near(&self, latitude: f64, longitude: f64, max_meters: f64) -> Result<usize> {
        self.inner.read().count_near(latitude, longitude, max_meters)
    }

    /// Run `f` with shared access to the underlying store.
    pub fn with_read<T>(&self, f: impl FnOnce(&GeoStore<B>) -> T) -> T {
        f(&self.inner.read())
    }

    /// Run `f` with exclusive access to the underlying store.
    pub fn with_write<T>(&self, f: impl FnOnce(&mut GeoStore<B>) -> T) -> T {
        f(&mut self.inner.write())
    }

    pub fn close(&self) -> Result<()> {
        self.inner.write().close()
    }
}
