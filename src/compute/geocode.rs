//! Latitude/longitude to Z-order code transform.
//!
//! Each axis is offset into a non-negative interval (`[0, 180)` for latitude,
//! `[0, 360)` for longitude) and quantised to 32 bits by repeated halving.
//! The two 32-bit values are then interleaved, longitude bit first, from the
//! most significant bit down. The result sorts so that codes sharing a 2N-bit
//! prefix fall in the same depth-N quadtree cell.

use alfalfa_types::code::GeoCode;

use crate::location::Coordinate;

/// Latitude span of one grid step (`180 / 2^32` degrees).
pub const LATITUDE_STEP: f64 = LATITUDE_SPAN / AXIS_CELLS;

/// Longitude span of one grid step (`360 / 2^32` degrees).
pub const LONGITUDE_STEP: f64 = LONGITUDE_SPAN / AXIS_CELLS;

pub(crate) const LATITUDE_SPAN: f64 = 180.0;
pub(crate) const LONGITUDE_SPAN: f64 = 360.0;

const AXIS_BITS: u32 = 32;
const AXIS_CELLS: f64 = 4_294_967_296.0;

/// Encode a coordinate pair into its Z-order code.
///
/// Inputs are expected to be validated already. Values past either end of an
/// axis saturate to the first or last grid line rather than wrapping.
///
/// # Examples
///
/// ```
/// use alfalfa::compute::geocode::encode;
///
/// assert_eq!(encode(45.0, 90.0).value(), 0xF000_0000_0000_0000);
/// assert_eq!(encode(-90.0, -180.0).value(), 0);
/// ```
pub fn encode(latitude: f64, longitude: f64) -> GeoCode {
    let lat_bits = quantize(latitude + LATITUDE_SPAN / 2.0, LATITUDE_SPAN);
    let lon_bits = quantize(longitude + LONGITUDE_SPAN / 2.0, LONGITUDE_SPAN);
    GeoCode::new(interleave(lat_bits, lon_bits))
}

/// Encode a validated [`Coordinate`].
pub fn encode_coordinate(coordinate: &Coordinate) -> GeoCode {
    encode(coordinate.latitude(), coordinate.longitude())
}

/// Decode a code to the `(latitude, longitude)` of its grid point.
///
/// The grid point is the south-west corner of the code's grid cell, so a
/// round trip through [`encode`] is exact to one grid step per axis.
///
/// # Examples
///
/// ```
/// use alfalfa::compute::geocode::decode;
/// use alfalfa_types::code::GeoCode;
///
/// assert_eq!(decode(GeoCode::new(0xF000_0000_0000_0000)), (45.0, 90.0));
/// ```
pub fn decode(code: GeoCode) -> (f64, f64) {
    decode_raw(code.value())
}

/// Decode a raw code value, including the sentinel value.
pub(crate) fn decode_raw(code: u64) -> (f64, f64) {
    let (lat_bits, lon_bits) = deinterleave(code);
    let latitude = f64::from(lat_bits) * LATITUDE_STEP - LATITUDE_SPAN / 2.0;
    let longitude = f64::from(lon_bits) * LONGITUDE_STEP - LONGITUDE_SPAN / 2.0;
    (latitude, longitude)
}

/// Quantise `offset` within `[0, span)` to a 32-bit fixed-point fraction.
///
/// Each step compares the remainder against half of the previous magnitude.
/// All magnitudes are powers of two times the span and the remainder stays
/// below twice the current magnitude, so every subtraction is exact.
fn quantize(offset: f64, span: f64) -> u32 {
    let mut remainder = offset;
    let mut magnitude = span / 2.0;
    let mut bits = 0u32;

    for bit in (0..AXIS_BITS).rev() {
        if remainder >= magnitude {
            bits |= 1 << bit;
            remainder -= magnitude;
        }
        magnitude /= 2.0;
    }

    bits
}

/// Interleave latitude bits into even positions and longitude bits into odd ones.
fn interleave(lat_bits: u32, lon_bits: u32) -> u64 {
    (spread(lon_bits) << 1) | spread(lat_bits)
}

fn deinterleave(code: u64) -> (u32, u32) {
    (compact(code), compact(code >> 1))
}

/// Spread the 32 bits of `x` into the even bit positions of a `u64`.
fn spread(x: u32) -> u64 {
    let mut x = u64::from(x);
    x = (x | (x << 16)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x << 8)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & 0x5555_5555_5555_5555;
    x
}

/// Gather the even bit positions of `x` back into a `u32`.
fn compact(x: u64) -> u32 {
    let mut x = x & 0x5555_5555_5555_5555;
    x = (x | (x >> 1)) & 0x3333_3333_3333_3333;
    x = (x | (x >> 2)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x >> 4)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x >> 8)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x >> 16)) & 0x0000_0000_FFFF_FFFF;
    x as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_fixture() {
        assert_eq!(encode(45.0, 90.0).value(), 0xF000_0000_0000_0000);
    }

    #[test]
    fn test_decode_fixture() {
        let (lat, lon) = decode(GeoCode::new(0xF000_0000_0000_0000));
        assert_eq!(lat, 45.0);
        assert_eq!(lon, 90.0);
    }

    #[test]
    fn test_grid_corners() {
        assert_eq!(encode(-90.0, -180.0), GeoCode::MIN);
        assert_eq!(decode(GeoCode::MIN), (-90.0, -180.0));

        // Origin is the midpoint of both axes: only the top bit of each is set.
        assert_eq!(encode(0.0, 0.0).value(), 0xC000_0000_0000_0000);
        assert_eq!(decode(GeoCode::new(0xC000_0000_0000_0000)), (0.0, 0.0));
    }

    #[test]
    fn test_north_east_corner_avoids_sentinel() {
        // Both axes saturate to all ones, which would be the sentinel.
        let code = encode(90.0, 180.0);
        assert!(!code.is_unspecified());
        assert_eq!(code, GeoCode::MAX);
    }

    #[test]
    fn test_quadrant_bits() {
        // Top bit pair is (longitude, latitude) half of the world.
        assert_eq!(encode(45.0, 90.0).value() >> 62, 0b11);
        assert_eq!(encode(45.0, -90.0).value() >> 62, 0b01);
        assert_eq!(encode(-45.0, 90.0).value() >> 62, 0b10);
        assert_eq!(encode(-45.0, -90.0).value() >> 62, 0b00);
    }

    #[test]
    fn test_round_trip_within_one_step() {
        let samples = [
            (37.756235, -122.47727),
            (-33.8688, 151.2093),
            (51.5074, -0.1278),
            (0.0, 0.0),
            (89.999999, 179.999999),
            (-89.999999, -179.999999),
            (12.345678901, -98.765432109),
        ];

        for (lat, lon) in samples {
            let (dlat, dlon) = decode(encode(lat, lon));
            assert!(
                lat - dlat > -1e-9 && lat - dlat < LATITUDE_STEP,
                "latitude {} decoded to {}",
                lat,
                dlat
            );
            assert!(
                lon - dlon > -1e-9 && lon - dlon < LONGITUDE_STEP,
                "longitude {} decoded to {}",
                lon,
                dlon
            );
        }
    }

    #[test]
    fn test_decoded_grid_points_are_fixed_points() {
        // Grid points on coarse dyadic lines survive the offset arithmetic exactly.
        for raw in [
            0u64,
            0x3C00_0000_0000_0000,
            0xC000_0000_0000_0000,
            0xF000_0000_0000_0000,
        ] {
            let code = GeoCode::new(raw);
            let (lat, lon) = decode(code);
            assert_eq!(encode(lat, lon), code, "grid point of {:016X}", raw);
        }
    }

    #[test]
    fn test_interleave_round_trip() {
        for (lat, lon) in [(0u32, 0u32), (u32::MAX, 0), (0, u32::MAX), (0xDEAD_BEEF, 0x1234_5678)] {
            assert_eq!(deinterleave(interleave(lat, lon)), (lat, lon));
        }
        assert_eq!(interleave(0, 1), 0b10);
        assert_eq!(interleave(1, 0), 0b01);
    }

    #[test]
    fn test_out_of_range_longitude_saturates() {
        assert_eq!(encode(0.0, -200.0).value() & 0xAAAA_AAAA_AAAA_AAAA, 0);
        assert_eq!(
            encode(0.0, 200.0).value() & 0xAAAA_AAAA_AAAA_AAAA,
            0xAAAA_AAAA_AAAA_AAAA
        );
    }

    #[test]
    fn test_shared_prefix_means_shared_cell() {
        // Two points in the same 1/4 x 1/4 world cell share their top 4 bits.
        let a = encode(60.0, 100.0).value();
        let b = encode(80.0, 170.0).value();
        let c = encode(10.0, 100.0).value();
        assert_eq!(a >> 60, b >> 60);
        assert_ne!(a >> 60, c >> 60);
    }
}
