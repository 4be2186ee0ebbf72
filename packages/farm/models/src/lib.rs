#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Farm, field, and boundary geometry types.
//!
//! These are the shared data records for the boundary-management subsystem:
//! farms with an optional outer boundary, fields nested inside a farm, and
//! the polygon/coordinate primitives both are drawn from. Geometry math
//! lives in `farm_map_geometry`; these types carry no behavior beyond
//! construction and simple accessors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// A geographic point in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Latitude in decimal degrees, valid range [-90, 90].
    pub latitude: f64,
    /// Longitude in decimal degrees, valid range [-180, 180].
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude and longitude in decimal degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` if both components are within the valid WGS84 range.
    #[must_use]
    pub fn is_in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A single closed ring of coordinates outlining a farm or field.
///
/// The ring is implicitly closing: the first vertex is NOT repeated at the
/// end. Validity (vertex count, duplicates, self-intersection) is enforced
/// by `farm_map_geometry::ring_is_valid`, not by construction, so that
/// in-progress and externally sourced rings can be represented before
/// validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Polygon {
    /// Ordered ring vertices, implicitly closed.
    pub vertices: Vec<Coordinate>,
}

impl Polygon {
    /// Creates a polygon from an ordered vertex list.
    #[must_use]
    pub const fn new(vertices: Vec<Coordinate>) -> Self {
        Self { vertices }
    }

    /// Number of vertices in the ring.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns `true` if the ring has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// An axis-aligned geographic bounding region in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingRegion {
    /// Northern latitude limit.
    pub north: f64,
    /// Southern latitude limit.
    pub south: f64,
    /// Eastern longitude limit.
    pub east: f64,
    /// Western longitude limit.
    pub west: f64,
}

/// A farm record with its optional outer boundary.
///
/// The boundary may be absent at creation and drawn later. `area_sq_m` is
/// the authoritative computed area of the boundary when one exists;
/// display units (hectares/acres) are derived from it on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Farm {
    /// Stable farm identity.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Primary location (e.g. the farmstead), independent of the boundary.
    pub location: Coordinate,
    /// Outer boundary ring, if one has been drawn.
    pub boundary: Option<Polygon>,
    /// Computed boundary area in square meters (full precision).
    pub area_sq_m: Option<f64>,
    /// Owner reference key, resolved by the accounts system.
    pub owner_ref: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Farm {
    /// Creates a farm with no boundary at the given location.
    #[must_use]
    pub fn new(name: impl Into<String>, location: Coordinate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            location,
            boundary: None,
            area_sq_m: None,
            owner_ref: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A field record nested inside a farm.
///
/// `farm_id` is a lookup key back to the owning farm, never an ownership
/// edge. A field may exist as a record before its shape is drawn, so the
/// boundary and the values computed from it are optional. `metadata` is an
/// opaque blob (crop type, status, ...) passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Stable field identity.
    pub id: Uuid,
    /// Owning farm's identity.
    pub farm_id: Uuid,
    /// Display name.
    pub name: String,
    /// Field boundary ring, if one has been drawn or detected.
    pub boundary: Option<Polygon>,
    /// Computed boundary area in square meters (full precision).
    pub area_sq_m: Option<f64>,
    /// Approximate boundary centroid (arithmetic vertex mean).
    pub centroid: Option<Coordinate>,
    /// Assigned display color (hex, e.g. `"#3cb44b"`), stable per field.
    pub color: String,
    /// Opaque crop/status metadata, not interpreted by this subsystem.
    pub metadata: serde_json::Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Field {
    /// Creates a field with no boundary, owned by the given farm.
    #[must_use]
    pub fn new(farm_id: Uuid, name: impl Into<String>, color: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            farm_id,
            name: name.into(),
            boundary: None,
            area_sq_m: None,
            centroid: None,
            color: color.into(),
            metadata: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A candidate field returned by the boundary-detection service.
///
/// The area is always computed locally from the polygon; any area the
/// service reports is discarded so there is a single source of truth for
/// area math. The confidence score is advisory only and never bypasses
/// the farm boundary containment check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedField {
    /// Detected boundary ring.
    pub boundary: Polygon,
    /// Detection confidence in [0, 1], clamped on read.
    pub confidence: f64,
    /// Locally computed area in square meters.
    pub area_sq_m: f64,
}

/// Detection sensitivity requested from the boundary-detection service.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Sensitivity {
    /// Fewer, larger candidate fields.
    Low,
    /// Balanced detection.
    Medium,
    /// More, smaller candidate fields.
    High,
}

/// Options forwarded to the boundary-detection service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionOptions {
    /// Detection sensitivity.
    pub sensitivity: Sensitivity,
    /// Minimum candidate size in hectares, if limited.
    pub min_field_size_ha: Option<f64>,
    /// Maximum candidate size in hectares, if limited.
    pub max_field_size_ha: Option<f64>,
    /// Exclude water bodies from candidates.
    pub exclude_water: bool,
    /// Exclude urban areas from candidates.
    pub exclude_urban: bool,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            sensitivity: Sensitivity::Medium,
            min_field_size_ha: None,
            max_field_size_ha: None,
            exclude_water: true,
            exclude_urban: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_range_check() {
        assert!(Coordinate::new(40.0, -90.0).is_in_range());
        assert!(Coordinate::new(-90.0, 180.0).is_in_range());
        assert!(!Coordinate::new(90.1, 0.0).is_in_range());
        assert!(!Coordinate::new(0.0, -180.5).is_in_range());
    }

    #[test]
    fn sensitivity_serializes_lowercase() {
        let json = serde_json::to_string(&Sensitivity::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
        assert_eq!(Sensitivity::High.as_ref(), "high");
        assert_eq!("low".parse::<Sensitivity>().unwrap(), Sensitivity::Low);
    }

    #[test]
    fn field_starts_without_boundary() {
        let farm = Farm::new("Maple Hollow", Coordinate::new(40.0, -90.0));
        let field = Field::new(farm.id, "North 40", "#e6194b");
        assert_eq!(field.farm_id, farm.id);
        assert!(field.boundary.is_none());
        assert!(field.area_sq_m.is_none());
        assert_eq!(field.metadata, serde_json::Value::Null);
    }

    #[test]
    fn detection_options_default() {
        let opts = DetectionOptions::default();
        assert_eq!(opts.sensitivity, Sensitivity::Medium);
        assert!(opts.exclude_water);
        assert!(opts.exclude_urban);
        assert!(opts.min_field_size_ha.is_none());
    }

    #[test]
    fn farm_round_trips_through_json() {
        let mut farm = Farm::new("Cedar Creek", Coordinate::new(41.5, -93.6));
        farm.boundary = Some(Polygon::new(vec![
            Coordinate::new(41.5, -93.6),
            Coordinate::new(41.501, -93.6),
            Coordinate::new(41.501, -93.599),
        ]));
        let json = serde_json::to_string(&farm).unwrap();
        assert!(json.contains("\"ownerRef\""));
        let back: Farm = serde_json::from_str(&json).unwrap();
        assert_eq!(back, farm);
    }
}
