#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pure polygon geometry for farm and field boundaries.
//!
//! All functions are synchronous and operate on plain coordinate slices
//! from `farm_map_farm_models`. Polygons here are small (tens of vertices,
//! drawn by hand or detected from imagery), so the O(n²) validity check
//! and the sampling-based containment ratio are cheap enough to run on
//! every edit.
//!
//! Area math uses a local equirectangular projection about the ring's mean
//! latitude rather than geodesic integration — accurate to well under 1%
//! for farm-scale polygons (a few km across), which is all this subsystem
//! promises.

pub mod containment;
pub mod measure;
pub mod ring;

pub use containment::{containment_ratio, contains};
pub use measure::{
    EARTH_RADIUS_M, SQ_M_PER_ACRE, SQ_M_PER_HECTARE, area_sq_m, bounding_region, centroid,
    to_acres, to_acres_rounded, to_hectares, to_hectares_rounded,
};
pub use ring::{is_valid, ring_is_valid};

use thiserror::Error;

/// Reasons a boundary ring fails validation.
///
/// All variants belong to the recoverable invalid-geometry class: the
/// caller rejects the ring and prompts a re-draw rather than storing it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// Fewer than three vertices.
    #[error("ring has {count} vertices, need at least 3")]
    TooFewVertices {
        /// Number of vertices in the rejected ring.
        count: usize,
    },

    /// A vertex lies outside the valid WGS84 coordinate range.
    #[error("vertex {index} is outside the valid coordinate range")]
    CoordinateOutOfRange {
        /// Index of the offending vertex.
        index: usize,
    },

    /// Two consecutive vertices are identical (including the implicit
    /// closing edge from last back to first).
    #[error("duplicate consecutive vertex at index {index}")]
    DuplicateVertex {
        /// Index of the first vertex of the duplicate pair.
        index: usize,
    },

    /// The ring encloses no area (all vertices collinear).
    #[error("ring is degenerate: vertices are collinear")]
    DegenerateRing,

    /// Two non-adjacent edges of the ring cross or overlap.
    #[error("ring self-intersects: edge {first} crosses edge {second}")]
    SelfIntersection {
        /// Index of the first edge (edge i starts at vertex i).
        first: usize,
        /// Index of the second edge.
        second: usize,
    },
}
