//! Validation for geographic coordinates and query radii.

use crate::error::{AlfalfaError, Result};

/// Validates a latitude lies within [-90.0, 90.0].
///
/// Out-of-range values are rejected, never clamped.
///
/// # Examples
///
/// ```
/// use alfalfa::compute::validation::validate_latitude;
///
/// assert!(validate_latitude(90.0).is_ok());
/// assert!(validate_latitude(-90.0).is_ok());
/// assert!(validate_latitude(90.0001).is_err());
/// assert!(validate_latitude(f64::NAN).is_err());
/// ```
pub fn validate_latitude(latitude: f64) -> Result<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(AlfalfaError::InvalidLatitude(latitude));
    }
    Ok(())
}

/// Validates a longitude lies within [-180.0, 180.0].
pub fn validate_longitude(longitude: f64) -> Result<()> {
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(AlfalfaError::InvalidLongitude(longitude));
    }
    Ok(())
}

/// Validates a search radius in meters is finite and not negative.
///
/// # Examples
///
/// ```
/// use alfalfa::compute::validation::validate_radius;
///
/// assert!(validate_radius(0.0).is_ok());
/// assert!(validate_radius(10_000.0).is_ok());
/// assert!(validate_radius(-1.0).is_err());
/// assert!(validate_radius(f64::INFINITY).is_err());
/// ```
pub fn validate_radius(meters: f64) -> Result<()> {
    if !meters.is_finite() {
        return Err(AlfalfaError::InvalidInput(format!(
            "Radius must be finite, got: {}",
            meters
        )));
    }

    if meters < 0.0 {
        return Err(AlfalfaError::InvalidInput(format!(
            "Radius must not be negative, got: {}",
            meters
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_latitudes() {
        for lat in [-90.0, -45.5, 0.0, 37.756235, 90.0] {
            assert!(validate_latitude(lat).is_ok(), "{} should be valid", lat);
        }
    }

    #[test]
    fn test_invalid_latitudes() {
        for lat in [-90.1, 90.1, 180.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                validate_latitude(lat),
                Err(AlfalfaError::InvalidLatitude(_))
            ));
        }
    }

    #[test]
    fn test_longitudes() {
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(180.0).is_ok());
        assert!(validate_longitude(-122.47727).is_ok());

        assert!(matches!(
            validate_longitude(180.5),
            Err(AlfalfaError::InvalidLongitude(_))
        ));
        assert!(matches!(
            validate_longitude(f64::NAN),
            Err(AlfalfaError::InvalidLongitude(_))
        ));
    }

    #[test]
    fn test_radius() {
        assert!(validate_radius(0.0).is_ok());
        assert!(validate_radius(1e7).is_ok());
        assert!(matches!(
            validate_radius(-0.5),
            Err(AlfalfaError::InvalidInput(_))
        ));
        assert!(validate_radius(f64::NAN).is_err());
    }
}
