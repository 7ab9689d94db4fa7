//! Nearby Search Example
//!
//! Stores a few San Francisco landmarks and asks which ones lie within a few
//! kilometers of Ocean Beach. Run with `RUST_LOG=debug` to see the query plan.

use alfalfa::{GeoItem, GeoStoreBuilder, MemoryBackend, RangeOverflow};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    println!("=== Nearby Search with Alfalfa ===\n");

    // A backend that, like many table stores, takes at most 4 key ranges per scan
    let mut store = GeoStoreBuilder::new()
        .range_overflow(RangeOverflow::Batch)
        .build(MemoryBackend::<GeoItem>::new().with_scan_limit(4))?;

    let landmarks = [
        ("Cliff House", 37.778434, -122.513988),
        ("Golden Gate Park windmill", 37.770400, -122.509600),
        ("San Francisco Zoo", 37.732900, -122.502800),
        ("Twin Peaks", 37.754400, -122.447700),
        ("Ferry Building", 37.795500, -122.393700),
        ("Oakland City Hall", 37.805300, -122.272500),
    ];

    store.upsert(
        landmarks
            .iter()
            .map(|&(name, lat, lon)| GeoItem::at(lat, lon, name))
            .collect::<Result<Vec<_>, _>>()?,
    );
    println!("1. Staged {} landmarks", store.pending());
    println!("   Saved {} writes\n", store.save_changes()?);

    let (lat, lon) = (37.756235, -122.47727);

    for radius in [3_000.0, 6_000.0, 20_000.0] {
        let plan = store.plan(lat, lon, radius)?;
        println!(
            "2. Within {:.0} m of Ocean Beach: {} cells, {} key ranges, {} scans",
            radius,
            plan.cells().len(),
            plan.range_count(),
            plan.batches().len()
        );

        for (item, meters) in store.query_near_sorted(lat, lon, radius, 10)? {
            println!(
                "   {:>6.0} m  {}",
                meters,
                String::from_utf8_lossy(item.payload())
            );
        }
        println!();
    }

    let stats = alfalfa::StorageBackend::stats(store.backend())?;
    println!(
        "3. Backend served {} scans over {} ranges",
        stats.scans, stats.ranges_scanned
    );

    Ok(())
}
