//! Storage backend abstraction.
//!
//! A backend is a sorted key-value store that can scan several inclusive key
//! ranges in one request and apply a batch of writes. Keys are
//! [`EntityKey`]s: the record's hex code as partition, its id as row.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use alfalfa_types::range::KeyRange;

use crate::error::{AlfalfaError, Result};
use crate::item::{EntityKey, GeoEntity, GeoItem};

/// Trait for storage backend implementations.
pub trait StorageBackend: Send + Sync {
    /// Record type stored by the backend
    type Record: GeoEntity;

    /// Fetch every record whose key falls in any of `ranges`.
    ///
    /// Backends that cap the number of ranges per request return
    /// [`AlfalfaError::CapacityExceeded`] when `ranges` is longer.
    fn scan(&self, ranges: &[KeyRange]) -> Result<Vec<Self::Record>>;

    /// Apply a batch of writes.
    fn apply(&mut self, ops: Vec<StorageOp<Self::Record>>) -> Result<()>;

    /// Maximum ranges accepted by a single [`scan`](Self::scan), if bounded.
    fn max_ranges_per_scan(&self) -> Option<usize> {
        None
    }

    /// Get the total number of records
    fn len(&self) -> Result<usize>;

    /// Check if the storage is empty
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Get storage statistics
    fn stats(&self) -> Result<StorageStats>;

    /// Close the storage backend
    fn close(&mut self) -> Result<()>;
}

/// Write operation for batch processing
#[derive(Debug, Clone, PartialEq)]
pub enum StorageOp<R> {
    /// Insert or replace a record under its key
    Upsert(R),
    /// Delete the record stored under a key
    Delete(EntityKey),
}

/// Storage backend statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Total number of records
    pub key_count: usize,
    /// Scan requests served
    pub scans: u64,
    /// Key ranges across all scans
    pub ranges_scanned: u64,
    /// Write operations applied
    pub operations_count: u64,
}

/// In-memory storage backend using BTreeMap.
///
/// Partition keys are the hex codes, so range scans run over the same byte
/// order an external table store would use.
pub struct MemoryBackend<R: GeoEntity = GeoItem> {
    data: BTreeMap<EntityKey, R>,
    scan_limit: Option<usize>,
    closed: bool,
    scans: AtomicU64,
    ranges_scanned: AtomicU64,
    operations_count: u64,
}

impl<R: GeoEntity> MemoryBackend<R> {
    /// Create a new in-memory storage backend
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
            scan_limit: None,
            closed: false,
            scans: AtomicU64::new(0),
            ranges_scanned: AtomicU64::new(0),
            operations_count: 0,
        }
    }

    /// Reject scans of more than `limit` ranges, like stores that cap the
    /// range predicates of one request.
    pub fn with_scan_limit(mut self, limit: usize) -> Self {
        assert!(limit > 0, "Scan limit must be greater than zero");
        self.scan_limit = Some(limit);
        self
    }

    /// Look up a record by key.
    pub fn get(&self, key: &EntityKey) -> Option<&R> {
        self.data.get(key)
    }

    /// Iterate records in key order.
    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.data.values()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(AlfalfaError::StoreClosed);
        }
        Ok(())
    }
}

impl<R: GeoEntity> Default for MemoryBackend<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: GeoEntity> StorageBackend for MemoryBackend<R> {
    type Record = R;

    fn scan(&self, ranges: &[KeyRange]) -> Result<Vec<R>> {
        self.ensure_open()?;

        if let Some(limit) = self.scan_limit
            && ranges.len() > limit
        {
            return Err(AlfalfaError::CapacityExceeded {
                requested: ranges.len(),
                limit,
            });
        }

        self.scans.fetch_add(1, Ordering::Relaxed);
        self.ranges_scanned
            .fetch_add(ranges.len() as u64, Ordering::Relaxed);

        let mut records = Vec::new();
        for range in ranges {
            let start = EntityKey::range_start(range);
            let end = EntityKey::range_end(range);
            records.extend(self.data.range(start..=end).map(|(_, record)| record.clone()));
        }

        Ok(records)
    }

    fn apply(&mut self, ops: Vec<StorageOp<R>>) -> Result<()> {
        self.ensure_open()?;

        for op in ops {
            match op {
                StorageOp::Upsert(record) => {
                    self.data.insert(record.key(), record);
                }
                StorageOp::Delete(key) => {
                    self.data.remove(&key);
                }
            }
            self.operations_count += 1;
        }

        Ok(())
    }

    fn max_ranges_per_scan(&self) -> Option<usize> {
        self.scan_limit
    }

    fn len(&self) -> Result<usize> {
        Ok(self.data.len())
    }

    fn stats(&self) -> Result<StorageStats> {
        Ok(StorageStats {
            key_count: self.data.len(),
            scans: self.scans.load(Ordering::Relaxed),
            ranges_scanned: self.ranges_scanned.load(Ordering::Relaxed),
            operations_count: self.operations_count,
        })
    }

    fn close(&mut self) -> Result<()> {
        self.data.clear();
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alfalfa_types::code::GeoCode;

    fn item(latitude: f64, longitude: f64) -> GeoItem {
        GeoItem::at(latitude, longitude, "test").unwrap()
    }

    fn range_of(items: &[&GeoItem]) -> KeyRange {
        let codes: Vec<GeoCode> = items.iter().map(|i| i.location().code()).collect();
        KeyRange::new(
            *codes.iter().min().unwrap(),
            *codes.iter().max().unwrap(),
        )
    }

    #[test]
    fn test_memory_backend_basic_ops() {
        let mut backend = MemoryBackend::new();
        assert!(backend.is_empty().unwrap());

        let a = item(10.0, 10.0);
        let b = item(-10.0, -10.0);
        backend
            .apply(vec![StorageOp::Upsert(a.clone()), StorageOp::Upsert(b.clone())])
            .unwrap();
        assert_eq!(backend.len().unwrap(), 2);
        assert_eq!(backend.get(&a.key()), Some(&a));

        backend.apply(vec![StorageOp::Delete(a.key())]).unwrap();
        assert_eq!(backend.len().unwrap(), 1);
        assert!(backend.get(&a.key()).is_none());

        let stats = backend.stats().unwrap();
        assert_eq!(stats.key_count, 1);
        assert_eq!(stats.operations_count, 3);
    }

    #[test]
    fn test_upsert_replaces_same_key() {
        let mut backend = MemoryBackend::new();
        let a = item(10.0, 10.0);
        backend.apply(vec![StorageOp::Upsert(a.clone())]).unwrap();
        backend.apply(vec![StorageOp::Upsert(a.clone())]).unwrap();
        assert_eq!(backend.len().unwrap(), 1);
    }

    #[test]
    fn test_scan_ranges() {
        let mut backend = MemoryBackend::new();
        let near = item(37.756235, -122.47727);
        let also_near = item(37.756240, -122.47727);
        let far = item(-33.8688, 151.2093);
        backend
            .apply(vec![
                StorageOp::Upsert(near.clone()),
                StorageOp::Upsert(also_near.clone()),
                StorageOp::Upsert(far.clone()),
            ])
            .unwrap();

        let found = backend.scan(&[range_of(&[&near, &also_near])]).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|i| i.id() != far.id()));

        let single = KeyRange::new(far.location().code(), far.location().code());
        assert_eq!(backend.scan(&[single]).unwrap(), vec![far]);

        assert!(backend.scan(&[]).unwrap().is_empty());

        let stats = backend.stats().unwrap();
        assert_eq!(stats.scans, 3);
        assert_eq!(stats.ranges_scanned, 2);
    }

    #[test]
    fn test_scan_limit() {
        let backend = MemoryBackend::<GeoItem>::new().with_scan_limit(4);
        assert_eq!(backend.max_ranges_per_scan(), Some(4));

        let range = KeyRange::new(GeoCode::MIN, GeoCode::MAX);
        assert!(backend.scan(&[range; 4]).is_ok());

        let err = backend.scan(&[range; 5]).unwrap_err();
        assert!(matches!(
            err,
            AlfalfaError::CapacityExceeded {
                requested: 5,
                limit: 4
            }
        ));
    }

    #[test]
    fn test_closed_backend() {
        let mut backend = MemoryBackend::new();
        backend.apply(vec![StorageOp::Upsert(item(0.0, 0.0))]).unwrap();
        backend.close().unwrap();

        assert!(matches!(
            backend.scan(&[]),
            Err(AlfalfaError::StoreClosed)
        ));
        assert!(matches!(
            backend.apply(vec![]),
            Err(AlfalfaError::StoreClosed)
        ));
    }
}
