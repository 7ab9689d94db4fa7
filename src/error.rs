//! Error types shared across the crate.

use thiserror::Error;

/// Result alias used throughout Alfalfa.
pub type Result<T> = std::result::Result<T, AlfalfaError>;

/// Errors reported by coordinate validation, query planning and store access.
///
/// "Cannot split further" during partitioning is not an error and never
/// surfaces here. Backend failures are carried through unchanged in
/// [`AlfalfaError::Backend`].
#[derive(Debug, Error)]
pub enum AlfalfaError {
    /// Latitude outside [-90, 90] or not finite.
    #[error("Latitude out of range [-90.0, 90.0]: {0}")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180] or not finite.
    #[error("Longitude out of range [-180.0, 180.0]: {0}")]
    InvalidLongitude(f64),

    /// Any other rejected argument (negative radius, bad config, ...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A stored key that is not a 16-digit hex code.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// More key ranges than the store accepts in one scan. Recoverable by batching.
    #[error("Scan of {requested} key ranges exceeds the store limit of {limit} per request")]
    CapacityExceeded {
        /// Ranges in the rejected request
        requested: usize,
        /// Ranges the store accepts per request
        limit: usize,
    },

    /// The store was closed before the operation.
    #[error("Store is closed")]
    StoreClosed,

    /// Failure raised by a storage backend.
    #[error("Backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// JSON (de)serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AlfalfaError {
    /// Wrap an arbitrary backend error.
    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend(err.into())
    }

    /// Whether the error is a per-request range limit, fixable by batching.
    pub fn is_capacity_error(&self) -> bool {
        matches!(self, Self::CapacityExceeded { .. })
    }
}

impl From<alfalfa_types::code::ParseGeoCodeError> for AlfalfaError {
    fn from(err: alfalfa_types::code::ParseGeoCodeError) -> Self {
        Self::InvalidKey(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            AlfalfaError::InvalidLatitude(91.0).to_string(),
            "Latitude out of range [-90.0, 90.0]: 91"
        );
        assert_eq!(
            AlfalfaError::CapacityExceeded {
                requested: 6,
                limit: 4
            }
            .to_string(),
            "Scan of 6 key ranges exceeds the store limit of 4 per request"
        );
    }

    #[test]
    fn test_capacity_is_distinguishable() {
        let capacity = AlfalfaError::CapacityExceeded {
            requested: 5,
            limit: 4,
        };
        assert!(capacity.is_capacity_error());
        assert!(!AlfalfaError::InvalidLatitude(100.0).is_capacity_error());
        assert!(!AlfalfaError::backend("disk on fire").is_capacity_error());
    }

    #[test]
    fn test_backend_error_keeps_source() {
        let io = std::io::Error::other("connection reset");
        let err = AlfalfaError::backend(io);
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "Backend error: connection reset");
    }

    #[test]
    fn test_parse_error_conversion() {
        let err: AlfalfaError = alfalfa_types::code::GeoCode::from_key("XYZ")
            .unwrap_err()
            .into();
        assert!(matches!(err, AlfalfaError::InvalidKey(_)));
    }
}
