#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! `DuckDB` persistence for farm and field boundary records.
//!
//! Boundaries are stored as `GeoJSON` geometry in plain TEXT columns (no
//! spatial extension); everything else is ordinary scalar columns keyed
//! by TEXT UUIDs. The farm `DuckDB` lives at `data/farms.duckdb`.
//!
//! Writes are `INSERT OR REPLACE` upserts, so reapplying the same payload
//! yields the same stored state and the synchronizer can retry freely.

pub mod fields_db;
pub mod geojson;
pub mod paths;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Duckdb(#[from] duckdb::Error),

    /// Filesystem error creating the data directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}
