#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory spatial index for field hit-testing.
//!
//! Builds an R-tree over a snapshot of a farm's field boundaries and
//! answers "which field is at this point" for map taps: envelope
//! pre-filter first, then an exact point-in-polygon test. Rebuild the
//! index whenever the registry's boundaries change — construction is
//! cheap at farm scale.

use farm_map_farm_models::Field;
use geo::{Contains, Polygon as GeoPolygon};
use rstar::{AABB, RTree, RTreeObject};
use uuid::Uuid;

/// A field boundary stored in the R-tree with its metadata.
struct FieldEntry {
    field_id: Uuid,
    area_sq_m: f64,
    envelope: AABB<[f64; 2]>,
    polygon: GeoPolygon<f64>,
}

impl RTreeObject for FieldEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Pre-built spatial index over one farm's field boundaries.
pub struct FieldIndex {
    fields: RTree<FieldEntry>,
}

impl FieldIndex {
    /// Builds the index from a field snapshot.
    ///
    /// Fields without a boundary are skipped — they have no shape to hit.
    #[must_use]
    pub fn build(fields: &[Field]) -> Self {
        let entries: Vec<FieldEntry> = fields
            .iter()
            .filter_map(|field| {
                let boundary = field.boundary.as_ref()?;
                let polygon = to_geo_polygon(boundary);
                let envelope = compute_envelope(&polygon);
                Some(FieldEntry {
                    field_id: field.id,
                    area_sq_m: field.area_sq_m.unwrap_or(f64::MAX),
                    envelope,
                    polygon,
                })
            })
            .collect();

        log::debug!("built field index over {} boundaries", entries.len());
        Self {
            fields: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed boundaries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.size()
    }

    /// `true` when no boundaries are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.size() == 0
    }

    /// Look up the field at a point.
    ///
    /// Overlapping boundaries can happen transiently while a user
    /// redraws; the smallest area wins so inner shapes stay selectable.
    #[must_use]
    pub fn locate(&self, latitude: f64, longitude: f64) -> Option<Uuid> {
        let point = geo::Point::new(longitude, latitude);
        let query_env = AABB::from_point([longitude, latitude]);

        let mut best: Option<&FieldEntry> = None;

        for entry in self.fields.locate_in_envelope_intersecting(&query_env) {
            if entry.polygon.contains(&point) {
                match best {
                    None => best = Some(entry),
                    Some(current) if entry.area_sq_m < current.area_sq_m => {
                        best = Some(entry);
                    }
                    _ => {}
                }
            }
        }

        best.map(|e| e.field_id)
    }
}

/// Converts an implicitly-closed boundary ring to a closed [`GeoPolygon`].
fn to_geo_polygon(boundary: &farm_map_farm_models::Polygon) -> GeoPolygon<f64> {
    let coords: Vec<(f64, f64)> = boundary
        .vertices
        .iter()
        .map(|v| (v.longitude, v.latitude))
        .collect();
    GeoPolygon::new(coords.into(), vec![])
}

/// Compute the bounding box envelope for a [`GeoPolygon`].
fn compute_envelope(polygon: &GeoPolygon<f64>) -> AABB<[f64; 2]> {
    use geo::BoundingRect;

    polygon.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}
