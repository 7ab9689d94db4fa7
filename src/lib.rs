//! Geospatial radius queries over sorted key-value stores.
//!
//! Each record is stored under the hex form of a 64-bit Z-order code of its
//! location. A query for everything within N meters of a point is planned as
//! a handful of contiguous key ranges, scanned in batches the store accepts,
//! and filtered by exact great-circle distance.
//!
//! ```rust
//! use alfalfa::{GeoItem, GeoStore};
//!
//! let mut store = GeoStore::memory();
//! store.upsert([
//!     GeoItem::at(37.756240, -122.47727, "north")?,
//!     GeoItem::at(37.756235, -121.0, "far")?,
//! ]);
//! store.save_changes()?;
//!
//! let nearby = store.count_near(37.756235, -122.47727, 10_000.0)?;
//! assert_eq!(nearby, 1);
//! # Ok::<(), alfalfa::AlfalfaError>(())
//! ```

pub mod builder;
pub mod compute;
pub mod config;
pub mod error;
pub mod item;
pub mod location;
pub mod storage;
pub mod store;

pub use builder::GeoStoreBuilder;
pub use config::{Config, RangeOverflow};
pub use error::{AlfalfaError, Result};
pub use item::{EntityKey, GeoEntity, GeoItem};
pub use location::{Coordinate, GeoLocation};
pub use store::GeoStore;

#[cfg(feature = "sync")]
pub use store::SyncGeoStore;

pub use compute::geometry::{DistanceUnit, GeoCircle, haversine_distance};
pub use compute::partition::{CoveringStats, QuadCell, covering_cells};
pub use compute::planner::{QueryPlan, RangeQueryPlanner};

pub use storage::{MemoryBackend, StorageBackend, StorageOp, StorageStats};

pub use alfalfa_types::code::GeoCode;
pub use alfalfa_types::range::KeyRange;
pub use alfalfa_types::rect::GeoRect;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{AlfalfaError, GeoStore, GeoStoreBuilder, Result};

    pub use crate::{Coordinate, GeoCode, GeoLocation, KeyRange};

    pub use crate::{DistanceUnit, QueryPlan, RangeQueryPlanner};

    pub use crate::{Config, RangeOverflow};

    pub use crate::{GeoEntity, GeoItem};

    pub use crate::{MemoryBackend, StorageBackend};

    #[cfg(feature = "sync")]
    pub use crate::SyncGeoStore;
}
