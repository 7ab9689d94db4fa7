//! Compute layer for radius query planning.
//!
//! This module separates the geometry and key-space algorithms from storage
//! concerns. It provides:
//! - The latitude/longitude to Z-order code transform
//! - Spherical distances and the circle/rectangle overlap test
//! - Quadtree partitioning of a query circle into cells
//! - Planning of key-range scans and filtering of their results
//!
//! Nothing here touches a backend; the store layer feeds plans to one.

pub mod geocode;
pub mod geometry;
pub mod partition;
pub mod planner;
pub mod validation;
