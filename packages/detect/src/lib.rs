#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Client for the satellite field-outline detection service.
//!
//! Translates a bounding region plus detection options into a request to
//! the external outline-detection API and maps its polygon results into
//! [`DetectedField`](farm_map_farm_models::DetectedField) candidates.
//!
//! Detection is best-effort: any network or service failure surfaces as
//! [`DetectError::Unavailable`] after one automatic retry, and callers
//! must fall back to manual drawing rather than block on it. Returned
//! confidence scores are advisory only — candidates still pass through
//! the farm boundary gate like any hand-drawn polygon, and areas are
//! always recomputed locally so there is a single source of truth for
//! area math.
//!
//! The service endpoint is configured via a TOML file under `services/`
//! embedded at compile time (see [`service_registry`]).

pub mod outline;
pub mod service_registry;
pub mod session;

use thiserror::Error;

/// Errors from the detection client.
#[derive(Debug, Error)]
pub enum DetectError {
    /// HTTP request failed (non-transient transport error).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The detection service could not be reached or answered with a
    /// failure status, after the single automatic retry. Callers should
    /// offer manual drawing as the fallback.
    #[error("Detection unavailable: {message}")]
    Unavailable {
        /// What went wrong, for logs and the UI.
        message: String,
    },
}
