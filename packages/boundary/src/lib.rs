#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Boundary drafting, containment gating, and the per-farm field registry.
//!
//! This crate owns the editing workflow between raw vertex input and
//! persisted field records:
//!
//! 1. [`draft::BoundaryDraft`] collects vertices while the user draws and
//!    commits them into a validated polygon.
//! 2. [`gate`] accepts or rejects boundaries: farm boundaries get area
//!    computed and replace the previous one; field boundaries must nest
//!    inside the farm boundary within a configurable tolerance.
//! 3. [`registry::FieldRegistry`] is the single mutable collection of one
//!    farm's fields — names, colors, boundaries, dirty state for the
//!    persistence synchronizer.
//! 4. [`palette`] assigns each field a stable display color in creation
//!    order.
//!
//! Everything here is synchronous and rendering-agnostic; the UI layer
//! feeds vertex streams in and reads plain data back out.

pub mod draft;
pub mod gate;
pub mod palette;
pub mod registry;

use thiserror::Error;
use uuid::Uuid;

/// Errors from boundary acceptance and registry operations.
///
/// All variants are recoverable: the operation is rejected, prior state is
/// kept, and the reason is reported for the UI to act on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundaryError {
    /// The submitted ring failed geometric validation; the user must
    /// redraw.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(#[from] farm_map_geometry::GeometryError),

    /// A field boundary was submitted before the farm has an outer
    /// boundary to nest it in.
    #[error("farm has no outer boundary yet")]
    NoFarmBoundary,

    /// The field boundary falls outside the farm boundary beyond the
    /// configured tolerance.
    #[error("field boundary is outside the farm boundary (fraction outside: {outside_fraction:.2})")]
    OutOfBounds {
        /// Sampled fraction of the field lying outside the farm boundary.
        outside_fraction: f64,
    },

    /// No field with the given id exists in the registry.
    #[error("unknown field: {0}")]
    UnknownField(Uuid),
}
