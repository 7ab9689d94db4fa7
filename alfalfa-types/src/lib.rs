//! # alfalfa-types
//!
//! Core value types for the Alfalfa geospatial range index.
//!
//! This crate provides the plain values that describe the sortable key space:
//!
//! - **Codes**: `GeoCode`, the 64-bit Z-order code and its hex key form
//! - **Ranges**: `KeyRange`, inclusive code bounds handed to a backing store
//! - **Rectangles**: `GeoRect`, latitude/longitude rectangles
//!
//! All types are serializable with Serde; rectangles are built on top of the
//! `geo` crate's primitives.
//!
//! ## Examples
//!
//! ```rust
//! use alfalfa_types::code::GeoCode;
//! use alfalfa_types::range::KeyRange;
//!
//! let code = GeoCode::new(0xF000_0000_0000_0000);
//! assert_eq!(code.to_key(), "F000000000000000");
//!
//! let range = KeyRange::new(GeoCode::new(0xF000_0000_0000_0000), GeoCode::new(0xF0FF_FFFF_FFFF_FFFF));
//! assert!(range.contains(code));
//! ```

pub mod code;
pub mod range;
pub mod rect;
