//! Compile-time registry of detection service configurations.
//!
//! The outline-detection endpoint is defined in a TOML file under
//! `services/`, embedded at compile time and exposed via
//! [`all_services`] and [`enabled_service`].

use serde::Deserialize;

/// A detection service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionService {
    /// Unique identifier (e.g., `"outline_api"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this service is available for detection requests.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// API base URL.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

const fn default_true() -> bool {
    true
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[("outline_api", include_str!("../services/outline_api.toml"))];

/// Returns all detection service configurations (enabled and disabled).
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time
/// guarantee since the configs are embedded).
#[must_use]
pub fn all_services() -> Vec<DetectionService> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse detection service '{name}': {e}"))
        })
        .collect()
}

/// Returns the first enabled detection service, if any.
#[must_use]
pub fn enabled_service() -> Option<DetectionService> {
    all_services().into_iter().find(|s| s.enabled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_services() {
        let services = all_services();
        assert_eq!(services.len(), SERVICE_TOMLS.len());
    }

    #[test]
    fn all_services_have_required_fields() {
        for svc in &all_services() {
            assert!(!svc.id.is_empty(), "Service has empty id");
            assert!(!svc.name.is_empty(), "Service {} has empty name", svc.id);
            assert!(
                !svc.base_url.is_empty(),
                "Service {} has empty base_url",
                svc.id
            );
            assert!(svc.timeout_ms > 0, "Service {} has zero timeout", svc.id);
        }
    }

    #[test]
    fn default_service_is_enabled() {
        let svc = enabled_service().expect("no enabled detection service");
        assert_eq!(svc.id, "outline_api");
    }
}
