use alfalfa::compute::geocode::{LATITUDE_STEP, LONGITUDE_STEP, decode, encode};
use alfalfa::compute::geometry::{GeoCircle, overlaps};
use alfalfa::compute::partition::{QuadCell, covering};
use alfalfa::{Coordinate, GeoCode, GeoLocation, GeoRect, RangeQueryPlanner};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SEED: u64 = 0x5EED_A1FA;

fn random_coordinate(rng: &mut StdRng) -> (f64, f64) {
    (rng.gen_range(-90.0..=90.0), rng.gen_range(-180.0..=180.0))
}

/// Point at `meters` from `(lat, lon)` along `bearing` (radians).
fn destination(lat: f64, lon: f64, meters: f64, bearing: f64) -> (f64, f64) {
    let d = meters / 6_371_000.0;
    let phi = lat.to_radians();
    let lat2 = (phi.sin() * d.cos() + phi.cos() * d.sin() * bearing.cos()).asin();
    let lon2 = lon.to_radians()
        + (bearing.sin() * d.sin() * phi.cos()).atan2(d.cos() - phi.sin() * lat2.sin());

    let mut lon2 = lon2.to_degrees();
    if lon2 > 180.0 {
        lon2 -= 360.0;
    } else if lon2 < -180.0 {
        lon2 += 360.0;
    }
    (lat2.to_degrees().clamp(-90.0, 90.0), lon2.clamp(-180.0, 180.0))
}

#[test]
fn test_round_trip_within_one_step() {
    let mut rng = StdRng::seed_from_u64(SEED);
    for _ in 0..10_000 {
        let (lat, lon) = random_coordinate(&mut rng);
        let (dlat, dlon) = decode(encode(lat, lon));
        assert!((lat - dlat).abs() <= LATITUDE_STEP, "lat {} -> {}", lat, dlat);
        assert!((lon - dlon).abs() <= LONGITUDE_STEP, "lon {} -> {}", lon, dlon);
    }
}

#[test]
fn test_code_order_within_a_cell() {
    // Codes inside a cell stay inside its key range, whatever the depth.
    let mut rng = StdRng::seed_from_u64(SEED + 1);
    for _ in 0..1_000 {
        let (lat, lon) = random_coordinate(&mut rng);
        let code = encode(lat, lon);
        let depth = rng.gen_range(0..=32);
        let cell = QuadCell::at_depth(code, depth);
        assert!(cell.key_range().contains(code));
        assert!(cell.contains_code(code));
    }
}

/// Top `2 * depth` bits of a code.
fn prefix(code: GeoCode, depth: u32) -> u64 {
    match depth {
        0 => 0,
        d => code.value() >> (64 - 2 * d),
    }
}

#[test]
fn test_shared_prefix_iff_same_cell() {
    let mut rng = StdRng::seed_from_u64(SEED + 6);
    let (mut shared, mut apart) = (0, 0);

    for _ in 0..20_000 {
        let a = GeoCode::new(rng.r#gen());
        // Flipping one bit of `a` keeps the pair close enough to straddle cell
        // boundaries at every depth; unrelated codes cover the rest.
        let b = if rng.gen_bool(0.5) {
            GeoCode::new(a.value() ^ (1u64 << rng.gen_range(0..64u32)))
        } else {
            GeoCode::new(rng.r#gen())
        };
        let depth = rng.gen_range(0..=32);

        let cell = QuadCell::at_depth(a, depth).bounds();
        let (lat, lon) = decode(b);
        let inside = cell.south() <= lat
            && lat < cell.north()
            && cell.west() <= lon
            && lon < cell.east();

        let same_prefix = prefix(a, depth) == prefix(b, depth);
        assert_eq!(
            same_prefix, inside,
            "{} and {} at depth {}: decoded ({}, {}) vs {:?}",
            a, b, depth, lat, lon, cell
        );

        if same_prefix {
            shared += 1;
        } else {
            apart += 1;
        }
    }

    assert!(shared > 1_000 && apart > 1_000);
}

#[test]
fn test_overlap_has_no_false_negatives() {
    let mut rng = StdRng::seed_from_u64(SEED + 2);

    for _ in 0..300 {
        let (lat, lon) = (rng.gen_range(-80.0..80.0), rng.gen_range(-170.0..170.0));
        let radius = rng.gen_range(100.0..200_000.0);
        let circle = GeoCircle::new(Coordinate::new(lat, lon).unwrap(), radius).unwrap();

        let south = lat + rng.gen_range(-3.0..3.0);
        let west = lon + rng.gen_range(-3.0..3.0);
        let rect = GeoRect::new(
            south,
            west,
            south + rng.gen_range(0.01..2.0),
            west + rng.gen_range(0.01..2.0),
        );

        if overlaps(&rect, &circle) {
            continue;
        }

        // Rejected: no sampled point of the rectangle may be inside the circle.
        for i in 0..=20 {
            for j in 0..=20 {
                let p_lat = rect.south() + rect.height() * f64::from(i) / 20.0;
                let p_lon = rect.west() + rect.width() * f64::from(j) / 20.0;
                assert!(
                    !circle.contains(p_lat, p_lon),
                    "{:?} rejected but ({}, {}) is inside the circle",
                    rect,
                    p_lat,
                    p_lon
                );
            }
        }
    }
}

#[test]
fn test_covering_holds_every_point_inside_the_circle() {
    let mut rng = StdRng::seed_from_u64(SEED + 3);

    for _ in 0..100 {
        let (lat, lon) = (rng.gen_range(-85.0..85.0), rng.gen_range(-179.0..179.0));
        let radius = rng.gen_range(10.0..500_000.0);
        let circle = GeoCircle::new(Coordinate::new(lat, lon).unwrap(), radius).unwrap();
        let cells = covering(&circle).cells;

        for _ in 0..50 {
            let meters = radius * rng.gen_range(0.0..0.999);
            let bearing = rng.gen_range(0.0..std::f64::consts::TAU);
            let (p_lat, p_lon) = destination(lat, lon, meters, bearing);
            let code = encode(p_lat, p_lon);

            assert!(
                cells.iter().any(|cell| cell.contains_code(code)),
                "({}, {}) at {} m from ({}, {}) escaped the covering",
                p_lat,
                p_lon,
                meters,
                lat,
                lon
            );
        }
    }
}

#[test]
fn test_covering_cells_are_disjoint() {
    let mut rng = StdRng::seed_from_u64(SEED + 4);

    for _ in 0..200 {
        let (lat, lon) = random_coordinate(&mut rng);
        let radius = rng.gen_range(0.0..1_000_000.0);
        let circle = GeoCircle::new(Coordinate::new(lat, lon).unwrap(), radius).unwrap();
        let cells = covering(&circle).cells;

        assert!(!cells.is_empty());
        for pair in cells.windows(2) {
            assert!(pair[0].max_code() < pair[1].min_code());
        }
    }
}

#[test]
fn test_planner_never_drops_a_match() {
    let mut rng = StdRng::seed_from_u64(SEED + 5);
    let planner = RangeQueryPlanner::default();

    for _ in 0..100 {
        let (lat, lon) = (rng.gen_range(-85.0..85.0), rng.gen_range(-179.0..179.0));
        let radius = rng.gen_range(50.0..50_000.0);
        let plan = planner.plan(lat, lon, radius).unwrap();
        let center = GeoLocation::from_coordinates(lat, lon).unwrap();

        for _ in 0..20 {
            let meters = radius * rng.gen_range(0.0..0.999);
            let (p_lat, p_lon) = destination(lat, lon, meters, rng.gen_range(0.0..6.28));
            let point = GeoLocation::from_coordinates(p_lat, p_lon).unwrap();

            if point.meters_from(&center) < radius {
                assert!(plan.contains_code(point.code()));
                assert!(plan.accepts(&point));
            }
        }
    }
}

#[test]
fn test_angle_fixtures() {
    let a = GeoLocation::from_coordinates(45.0, 90.0).unwrap();
    let antipode = GeoLocation::from_coordinates(-45.0, -90.0).unwrap();
    let origin = GeoLocation::from_coordinates(0.0, 0.0).unwrap();

    assert!((a.radians_from(&antipode) - std::f64::consts::PI).abs() < 1e-7);
    assert!((a.radians_from(&origin) - std::f64::consts::FRAC_PI_2).abs() < 1e-15);
}
