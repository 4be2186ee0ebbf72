//! Farm boundary gate: acceptance rules for farm and field boundaries.
//!
//! A farm's outer boundary can always replace the previous one (the gate
//! reports which dependent fields the new boundary orphans, and the
//! caller decides what to do with them — there is no automatic cascade).
//! A field boundary is only accepted when a farm boundary exists and the
//! field nests inside it within the configured tolerance.

use chrono::Utc;
use farm_map_farm_models::{Farm, Field, Polygon};
use farm_map_geometry::{area_sq_m, centroid, containment_ratio, contains, ring_is_valid};
use uuid::Uuid;

use crate::BoundaryError;

/// Containment tolerance for field boundaries.
///
/// A field is accepted when its centroid lies inside the farm boundary
/// AND at most `tolerance` of its sampled points fall outside — the slack
/// absorbs hand-drawing imprecision along shared edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainmentPolicy {
    /// Maximum fraction of the field allowed outside the farm boundary.
    pub tolerance: f64,
}

impl Default for ContainmentPolicy {
    fn default() -> Self {
        Self { tolerance: 0.05 }
    }
}

/// Validates and installs a farm's outer boundary, replacing any previous
/// one, and recomputes the stored area.
///
/// Existing fields are NOT cascaded: the ids of fields whose boundaries
/// now fail containment under `policy` are returned as warnings for the
/// caller to re-validate, detach, or delete.
///
/// # Errors
///
/// [`BoundaryError::InvalidGeometry`] if the ring fails validation; the
/// farm is left untouched.
pub fn accept_farm_boundary(
    farm: &mut Farm,
    polygon: Polygon,
    fields: &[Field],
    policy: &ContainmentPolicy,
) -> Result<Vec<Uuid>, BoundaryError> {
    ring_is_valid(&polygon.vertices)?;

    let area = area_sq_m(&polygon.vertices);
    farm.area_sq_m = Some(area);
    farm.boundary = Some(polygon);
    farm.updated_at = Utc::now();
    log::info!(
        "farm {} boundary replaced, area {:.0} m²",
        farm.id,
        area
    );

    let warnings: Vec<Uuid> = fields
        .iter()
        .filter(|field| {
            field
                .boundary
                .as_ref()
                .is_some_and(|b| !field_is_contained(farm, b, policy))
        })
        .map(|field| field.id)
        .collect();

    if !warnings.is_empty() {
        log::warn!(
            "farm {} boundary change leaves {} field(s) outside tolerance",
            farm.id,
            warnings.len()
        );
    }

    Ok(warnings)
}

/// Validates a field boundary against the farm's outer boundary and
/// returns the updated field record.
///
/// The input `field` is not mutated; on success the returned copy carries
/// the new boundary, computed area, centroid, and a fresh `updated_at`.
/// On any error the caller simply keeps its prior record, so a rejected
/// redraw never clobbers the previous boundary.
///
/// # Errors
///
/// [`BoundaryError::NoFarmBoundary`] when the farm has no outer boundary;
/// [`BoundaryError::InvalidGeometry`] when the ring fails validation;
/// [`BoundaryError::OutOfBounds`] when containment exceeds the policy
/// tolerance.
pub fn accept_field_boundary(
    farm: &Farm,
    field: &Field,
    polygon: Polygon,
    policy: &ContainmentPolicy,
) -> Result<Field, BoundaryError> {
    let Some(farm_boundary) = farm.boundary.as_ref() else {
        return Err(BoundaryError::NoFarmBoundary);
    };

    ring_is_valid(&polygon.vertices)?;

    let outside_fraction = containment_ratio(&farm_boundary.vertices, &polygon.vertices);
    let center = centroid(&polygon.vertices);
    let centroid_inside =
        center.is_some_and(|c| contains(&farm_boundary.vertices, &c));

    if !centroid_inside || outside_fraction > policy.tolerance {
        return Err(BoundaryError::OutOfBounds { outside_fraction });
    }

    let mut updated = field.clone();
    updated.area_sq_m = Some(area_sq_m(&polygon.vertices));
    updated.centroid = center;
    updated.boundary = Some(polygon);
    updated.updated_at = Utc::now();
    Ok(updated)
}

fn field_is_contained(farm: &Farm, boundary: &Polygon, policy: &ContainmentPolicy) -> bool {
    let Some(farm_boundary) = farm.boundary.as_ref() else {
        return false;
    };
    let centroid_inside = centroid(&boundary.vertices)
        .is_some_and(|c| contains(&farm_boundary.vertices, &c));
    centroid_inside
        && containment_ratio(&farm_boundary.vertices, &boundary.vertices) <= policy.tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use farm_map_farm_models::Coordinate;

    fn c(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng)
    }

    fn farm_with_square_boundary() -> Farm {
        let mut farm = Farm::new("Test Farm", c(40.0005, -89.9995));
        let ring = Polygon::new(vec![
            c(40.000, -90.000),
            c(40.001, -90.000),
            c(40.001, -89.999),
            c(40.000, -89.999),
        ]);
        accept_farm_boundary(&mut farm, ring, &[], &ContainmentPolicy::default()).unwrap();
        farm
    }

    fn inner_square() -> Polygon {
        Polygon::new(vec![
            c(40.0004, -89.9996),
            c(40.0006, -89.9996),
            c(40.0006, -89.9994),
            c(40.0004, -89.9994),
        ])
    }

    #[test]
    fn field_boundary_without_farm_boundary_is_rejected() {
        let farm = Farm::new("Bare Farm", c(40.0, -90.0));
        let field = Field::new(farm.id, "Field 1", "#e6194b");
        let result =
            accept_field_boundary(&farm, &field, inner_square(), &ContainmentPolicy::default());
        assert_eq!(result.unwrap_err(), BoundaryError::NoFarmBoundary);
    }

    #[test]
    fn invalid_polygon_is_rejected_even_with_farm_boundary() {
        let farm = farm_with_square_boundary();
        let field = Field::new(farm.id, "Field 1", "#e6194b");
        let bad = Polygon::new(vec![c(40.0004, -89.9996), c(40.0006, -89.9996)]);
        assert!(matches!(
            accept_field_boundary(&farm, &field, bad, &ContainmentPolicy::default()),
            Err(BoundaryError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn contained_field_is_accepted_with_area_and_centroid() {
        let farm = farm_with_square_boundary();
        let field = Field::new(farm.id, "Field 1", "#e6194b");
        let updated =
            accept_field_boundary(&farm, &field, inner_square(), &ContainmentPolicy::default())
                .unwrap();
        assert!(updated.boundary.is_some());
        let area = updated.area_sq_m.unwrap();
        // ~22m x ~17m square at this latitude.
        assert!(area > 200.0 && area < 500.0, "unexpected area {area}");
        let center = updated.centroid.unwrap();
        assert!((center.latitude - 40.0005).abs() < 1e-6);
        // Original record untouched.
        assert!(field.boundary.is_none());
    }

    #[test]
    fn field_outside_farm_is_rejected() {
        let farm = farm_with_square_boundary();
        let field = Field::new(farm.id, "Field 1", "#e6194b");
        let outside = Polygon::new(vec![
            c(41.000, -89.000),
            c(41.001, -89.000),
            c(41.001, -88.999),
            c(41.000, -88.999),
        ]);
        match accept_field_boundary(&farm, &field, outside, &ContainmentPolicy::default()) {
            Err(BoundaryError::OutOfBounds { outside_fraction }) => {
                assert!((outside_fraction - 1.0).abs() < f64::EPSILON);
            }
            other => panic!("expected OutOfBounds, got {other:?}"),
        }
    }

    #[test]
    fn straddling_field_is_rejected_by_tolerance() {
        let farm = farm_with_square_boundary();
        let field = Field::new(farm.id, "Field 1", "#e6194b");
        // Half in, half out across the eastern edge.
        let straddling = Polygon::new(vec![
            c(40.0004, -89.9992),
            c(40.0006, -89.9992),
            c(40.0006, -89.9986),
            c(40.0004, -89.9986),
        ]);
        assert!(matches!(
            accept_field_boundary(&farm, &field, straddling, &ContainmentPolicy::default()),
            Err(BoundaryError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn loose_tolerance_accepts_straddling_field() {
        let farm = farm_with_square_boundary();
        let field = Field::new(farm.id, "Field 1", "#e6194b");
        // Mostly inside, nudged just over the western edge.
        let nudged = Polygon::new(vec![
            c(40.0004, -90.00005),
            c(40.0006, -90.00005),
            c(40.0006, -89.9994),
            c(40.0004, -89.9994),
        ]);
        let loose = ContainmentPolicy { tolerance: 0.5 };
        assert!(accept_field_boundary(&farm, &field, nudged, &loose).is_ok());
    }

    #[test]
    fn farm_boundary_replacement_flags_orphaned_fields() {
        let mut farm = farm_with_square_boundary();
        let field = Field::new(farm.id, "Field 1", "#e6194b");
        let field =
            accept_field_boundary(&farm, &field, inner_square(), &ContainmentPolicy::default())
                .unwrap();

        // Shrink the farm to a sliver on the west side; the field no
        // longer fits.
        let sliver = Polygon::new(vec![
            c(40.000, -90.000),
            c(40.001, -90.000),
            c(40.001, -89.99995),
            c(40.000, -89.99995),
        ]);
        let warnings = accept_farm_boundary(
            &mut farm,
            sliver,
            std::slice::from_ref(&field),
            &ContainmentPolicy::default(),
        )
        .unwrap();
        assert_eq!(warnings, vec![field.id]);
        // The field record itself is untouched; cascading is the caller's
        // decision.
        assert!(field.boundary.is_some());
    }

    #[test]
    fn invalid_farm_boundary_leaves_farm_untouched() {
        let mut farm = farm_with_square_boundary();
        let before = farm.clone();
        let bowtie = Polygon::new(vec![
            c(40.000, -90.000),
            c(40.001, -89.999),
            c(40.001, -90.000),
            c(40.000, -89.999),
        ]);
        assert!(matches!(
            accept_farm_boundary(&mut farm, bowtie, &[], &ContainmentPolicy::default()),
            Err(BoundaryError::InvalidGeometry(_))
        ));
        assert_eq!(farm, before);
    }
}
