//! Located records and the keys they are stored under.

use std::fmt;
use std::time::{Duration, SystemTime};

use alfalfa_types::code::GeoCode;
use alfalfa_types::range::KeyRange;
use bytes::Bytes;
use uuid::Uuid;

use crate::error::{AlfalfaError, Result};
use crate::location::GeoLocation;

/// A record with a location and a stable identity.
///
/// Records are stored under an [`EntityKey`]: the hex key of the location's
/// code as partition, the id as row. Moving a record changes its partition.
pub trait GeoEntity: Clone + Send + Sync {
    fn location(&self) -> GeoLocation;

    fn id(&self) -> Uuid;

    /// Storage key of this record.
    fn key(&self) -> EntityKey {
        EntityKey::new(self.location().code(), self.id())
    }
}

/// Partition and row key of a stored record.
///
/// Ordering is by partition, then row. Partitions are fixed-width uppercase
/// hex, so byte order matches code order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKey {
    pub partition: Bytes,
    pub row: Uuid,
}

impl EntityKey {
    pub fn new(code: GeoCode, row: Uuid) -> Self {
        Self {
            partition: Bytes::from(code.to_key()),
            row,
        }
    }

    /// The code the partition key names.
    pub fn code(&self) -> Result<GeoCode> {
        let key = std::str::from_utf8(&self.partition)
            .map_err(|e| AlfalfaError::InvalidKey(e.to_string()))?;
        Ok(GeoCode::from_key(key)?)
    }

    /// First key of `range`.
    pub fn range_start(range: &KeyRange) -> Self {
        Self::new(range.min, Uuid::nil())
    }

    /// Last key of `range`.
    pub fn range_end(range: &KeyRange) -> Self {
        Self::new(range.max, Uuid::from_u128(u128::MAX))
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", String::from_utf8_lossy(&self.partition), self.row)
    }
}

/// A located payload with a random id and a creation time.
///
/// # Examples
///
/// ```
/// use alfalfa::{GeoEntity, GeoItem, GeoLocation};
///
/// let location = GeoLocation::from_coordinates(45.0, 90.0).unwrap();
/// let item = GeoItem::new(location, "tea house");
/// assert_eq!(item.partition_key(), "F000000000000000");
/// assert_eq!(item.payload().as_ref(), b"tea house");
/// assert_eq!(item.key().code().unwrap(), location.code());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GeoItem {
    id: Uuid,
    created: SystemTime,
    location: GeoLocation,
    payload: Bytes,
}

impl GeoItem {
    /// New item with a fresh v4 id, created now.
    pub fn new(location: GeoLocation, payload: impl Into<Bytes>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created: SystemTime::now(),
            location,
            payload: payload.into(),
        }
    }

    /// Validate the coordinates and create an item there.
    pub fn at(latitude: f64, longitude: f64, payload: impl Into<Bytes>) -> Result<Self> {
        Ok(Self::new(
            GeoLocation::from_coordinates(latitude, longitude)?,
            payload,
        ))
    }

    /// Rebuild a stored item from its parts.
    pub fn from_parts(
        id: Uuid,
        created: SystemTime,
        location: GeoLocation,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            id,
            created,
            location,
            payload: payload.into(),
        }
    }

    /// Rebuild a stored item whose location is known only by its partition key.
    pub fn from_key(
        partition_key: &str,
        id: Uuid,
        created: SystemTime,
        payload: impl Into<Bytes>,
    ) -> Result<Self> {
        Ok(Self::from_parts(
            id,
            created,
            GeoLocation::from_key(partition_key)?,
            payload,
        ))
    }

    pub fn created(&self) -> SystemTime {
        self.created
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Hex key of the item's code.
    pub fn partition_key(&self) -> String {
        self.location.key()
    }

    /// Move the item. Its storage key changes with it.
    pub fn relocate(&mut self, location: GeoLocation) {
        self.location = location;
    }

    /// Time since creation; zero if the clock went backwards.
    pub fn age(&self) -> Duration {
        self.created.elapsed().unwrap_or_default()
    }
}

impl GeoEntity for GeoItem {
    fn location(&self) -> GeoLocation {
        self.location
    }

    fn id(&self) -> Uuid {
        self.id
    }
}
