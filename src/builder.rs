//! Store builder for flexible configuration.

use crate::config::{Config, RangeOverflow};
use crate::error::{AlfalfaError, Result};
use crate::item::GeoItem;
use crate::storage::{MemoryBackend, StorageBackend};
use crate::store::GeoStore;

/// Builder for `GeoStore` configuration.
///
/// # Examples
///
/// ```rust
/// use alfalfa::{GeoItem, GeoStoreBuilder, MemoryBackend, RangeOverflow};
///
/// let store = GeoStoreBuilder::new()
///     .max_ranges_per_scan(8)
///     .range_overflow(RangeOverflow::Reject)
///     .build(MemoryBackend::<GeoItem>::new().with_scan_limit(4))
///     .unwrap();
///
/// assert_eq!(store.config().max_ranges_per_scan, 8);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GeoStoreBuilder {
    config: Config,
}

impl GeoStoreBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Maximum key ranges per scan request. Zero is rejected by `build`.
    pub fn max_ranges_per_scan(mut self, limit: usize) -> Self {
        self.config.max_ranges_per_scan = limit;
        self
    }

    pub fn range_overflow(mut self, overflow: RangeOverflow) -> Self {
        self.config.range_overflow = overflow;
        self
    }

    pub fn coalesce_ranges(mut self, coalesce: bool) -> Self {
        self.config.coalesce_ranges = coalesce;
        self
    }

    /// Load the configuration from JSON.
    pub fn config_json(mut self, json: &str) -> Result<Self> {
        self.config = Config::from_json(json)?;
        Ok(self)
    }

    /// Validate the configuration and build a store over `backend`.
    pub fn build<B: StorageBackend>(self, backend: B) -> Result<GeoStore<B>> {
        self.config.validate().map_err(AlfalfaError::InvalidInput)?;
        GeoStore::with_config(backend, self.config)
    }

    /// Build an in-memory store.
    pub fn build_memory(self) -> Result<GeoStore<MemoryBackend<GeoItem>>> {
        self.build(MemoryBackend::new())
    }
}
