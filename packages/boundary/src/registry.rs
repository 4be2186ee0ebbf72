#![allow(clippy::module_name_repetitions)]
//! Per-farm field registry.
//!
//! The registry is the only mutable shared structure for one farm's
//! editing session: it owns the farm record and its fields, allocates
//! colors in creation order, routes every boundary change through the
//! farm boundary gate, and tracks which records have unsaved changes so
//! the persistence synchronizer knows what to push.
//!
//! Mutation happens only through the operations below; reads are always
//! consistent with the last completed operation. Repeated boundary sets
//! on the same field are last-write-wins — this is a single-user editing
//! session, not a shared document.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use farm_map_farm_models::{Coordinate, DetectedField, Farm, Field, Polygon};
use farm_map_geometry::{centroid, contains};
use uuid::Uuid;

use crate::gate::{self, ContainmentPolicy};
use crate::{BoundaryError, palette};

/// Outcome of merging a detected field set into the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Ids of fields created from detected candidates.
    pub added: Vec<Uuid>,
    /// Candidates dropped because they overlap an existing field above
    /// the threshold.
    pub skipped_overlapping: usize,
    /// Candidates rejected by the farm boundary gate.
    pub rejected: usize,
    /// Existing fields retained through the merge (always all of them).
    pub retained: usize,
}

/// One farm's field set: identity, names, boundaries, colors, dirty state.
#[derive(Debug)]
pub struct FieldRegistry {
    farm: Farm,
    fields: BTreeMap<Uuid, Field>,
    /// Field ids in creation order; colors are allocated in this order.
    order: Vec<Uuid>,
    dirty: BTreeSet<Uuid>,
    farm_dirty: bool,
    pending_deletes: Vec<Uuid>,
    policy: ContainmentPolicy,
}

impl FieldRegistry {
    /// Creates a registry for a farm that has not been persisted yet.
    #[must_use]
    pub fn new(farm: Farm) -> Self {
        Self {
            farm,
            fields: BTreeMap::new(),
            order: Vec::new(),
            dirty: BTreeSet::new(),
            farm_dirty: true,
            pending_deletes: Vec::new(),
            policy: ContainmentPolicy::default(),
        }
    }

    /// Rebuilds a registry from records already in the store.
    ///
    /// Everything starts clean; `fields` must be in creation order.
    #[must_use]
    pub fn from_store(farm: Farm, fields: Vec<Field>) -> Self {
        let order: Vec<Uuid> = fields.iter().map(|f| f.id).collect();
        let fields: BTreeMap<Uuid, Field> = fields.into_iter().map(|f| (f.id, f)).collect();
        Self {
            farm,
            fields,
            order,
            dirty: BTreeSet::new(),
            farm_dirty: false,
            pending_deletes: Vec::new(),
            policy: ContainmentPolicy::default(),
        }
    }

    /// Overrides the containment tolerance.
    #[must_use]
    pub const fn with_policy(mut self, policy: ContainmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The farm record.
    #[must_use]
    pub const fn farm(&self) -> &Farm {
        &self.farm
    }

    /// Looks up a field by id.
    #[must_use]
    pub fn field(&self, id: Uuid) -> Option<&Field> {
        self.fields.get(&id)
    }

    /// Fields in creation order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.order.iter().filter_map(|id| self.fields.get(id))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` when the farm has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Creates a field with no boundary and the next palette color in
    /// farm-scoped creation order.
    pub fn add_field(&mut self, name: impl Into<String>) -> &Field {
        let used: Vec<String> = self.fields().map(|f| f.color.clone()).collect();
        let color = palette::next_color(&used);
        let field = Field::new(self.farm.id, name, color);
        let id = field.id;
        log::debug!("field {id} created with color {color}");
        self.order.push(id);
        self.dirty.insert(id);
        self.fields.insert(id, field);
        &self.fields[&id]
    }

    /// Installs a new farm outer boundary via the gate, returning the ids
    /// of fields that no longer fit (no automatic cascade).
    ///
    /// # Errors
    ///
    /// [`BoundaryError::InvalidGeometry`] if the ring fails validation;
    /// the previous boundary is kept.
    pub fn set_farm_boundary(&mut self, polygon: Polygon) -> Result<Vec<Uuid>, BoundaryError> {
        let fields: Vec<Field> = self.fields().cloned().collect();
        let warnings = gate::accept_farm_boundary(&mut self.farm, polygon, &fields, &self.policy)?;
        self.farm_dirty = true;
        Ok(warnings)
    }

    /// Sets a field's boundary via the gate.
    ///
    /// On error the field's prior boundary (if any) is untouched.
    /// Repeated calls on the same field are last-write-wins.
    ///
    /// # Errors
    ///
    /// [`BoundaryError::UnknownField`] for a bad id, otherwise whatever
    /// the gate rejects with ([`BoundaryError::NoFarmBoundary`],
    /// [`BoundaryError::InvalidGeometry`], [`BoundaryError::OutOfBounds`]).
    pub fn set_field_boundary(
        &mut self,
        id: Uuid,
        polygon: Polygon,
    ) -> Result<&Field, BoundaryError> {
        let field = self
            .fields
            .get(&id)
            .ok_or(BoundaryError::UnknownField(id))?;
        let updated = gate::accept_field_boundary(&self.farm, field, polygon, &self.policy)?;
        self.dirty.insert(id);
        self.fields.insert(id, updated);
        Ok(&self.fields[&id])
    }

    /// Renames a field.
    ///
    /// # Errors
    ///
    /// [`BoundaryError::UnknownField`] for a bad id.
    pub fn rename(&mut self, id: Uuid, name: impl Into<String>) -> Result<(), BoundaryError> {
        let field = self
            .fields
            .get_mut(&id)
            .ok_or(BoundaryError::UnknownField(id))?;
        field.name = name.into();
        field.updated_at = Utc::now();
        self.dirty.insert(id);
        Ok(())
    }

    /// Overrides a field's assigned color.
    ///
    /// # Errors
    ///
    /// [`BoundaryError::UnknownField`] for a bad id.
    pub fn recolor(&mut self, id: Uuid, color: impl Into<String>) -> Result<(), BoundaryError> {
        let field = self
            .fields
            .get_mut(&id)
            .ok_or(BoundaryError::UnknownField(id))?;
        field.color = color.into();
        field.updated_at = Utc::now();
        self.dirty.insert(id);
        Ok(())
    }

    /// Removes a field and queues its id for store deletion.
    ///
    /// Other fields keep their colors — colors are stable per field, not
    /// per position.
    ///
    /// # Errors
    ///
    /// [`BoundaryError::UnknownField`] for a bad id.
    pub fn remove(&mut self, id: Uuid) -> Result<Field, BoundaryError> {
        let field = self
            .fields
            .remove(&id)
            .ok_or(BoundaryError::UnknownField(id))?;
        self.order.retain(|other| *other != id);
        self.dirty.remove(&id);
        self.pending_deletes.push(id);
        Ok(field)
    }

    /// Merges a detected field set into the registry.
    ///
    /// Detected candidates carry no identity, so existing fields are
    /// never matched-and-replaced: all of them are retained, unsaved
    /// edits included. A candidate whose ring overlaps an existing
    /// field's boundary above `overlap_threshold` (fraction of the
    /// candidate inside the existing field) is dropped as a duplicate;
    /// the rest are added as new fields, each routed through the gate
    /// like any manual boundary — detection confidence never bypasses
    /// containment.
    pub fn replace_all(
        &mut self,
        detected: Vec<DetectedField>,
        overlap_threshold: f64,
    ) -> MergeReport {
        let mut report = MergeReport {
            retained: self.fields.len(),
            ..MergeReport::default()
        };

        for candidate in detected {
            let duplicate_of = self.fields().find(|existing| {
                existing.boundary.as_ref().is_some_and(|boundary| {
                    overlap_fraction(&boundary.vertices, &candidate.boundary.vertices)
                        > overlap_threshold
                })
            });
            if let Some(existing) = duplicate_of {
                log::debug!(
                    "detected candidate overlaps existing field {} above {overlap_threshold}, skipping",
                    existing.id
                );
                report.skipped_overlapping += 1;
                continue;
            }

            let name = format!("Field {}", self.order.len() + 1);
            let id = self.add_field(name).id;
            let result = self
                .set_field_boundary(id, candidate.boundary)
                .map(|_| ());
            match result {
                Ok(()) => {
                    if let Some(field) = self.fields.get_mut(&id) {
                        field.metadata = serde_json::json!({
                            "detectionConfidence": candidate.confidence,
                        });
                    }
                    report.added.push(id);
                }
                Err(err) => {
                    log::warn!("detected candidate rejected by boundary gate: {err}");
                    // Roll back the placeholder record; it never existed
                    // as far as the store is concerned.
                    self.fields.remove(&id);
                    self.order.retain(|other| *other != id);
                    self.dirty.remove(&id);
                    report.rejected += 1;
                }
            }
        }

        report
    }

    /// Ids of fields with unsaved changes, in creation order.
    #[must_use]
    pub fn dirty_ids(&self) -> Vec<Uuid> {
        self.order
            .iter()
            .filter(|id| self.dirty.contains(id))
            .copied()
            .collect()
    }

    /// `true` when the farm record itself has unsaved changes.
    #[must_use]
    pub const fn farm_dirty(&self) -> bool {
        self.farm_dirty
    }

    /// Ids removed in memory but not yet deleted from the store.
    #[must_use]
    pub fn pending_deletes(&self) -> Vec<Uuid> {
        self.pending_deletes.clone()
    }

    /// Marks a field as persisted.
    pub fn mark_field_synced(&mut self, id: Uuid) {
        self.dirty.remove(&id);
    }

    /// Marks the farm record as persisted.
    pub fn mark_farm_synced(&mut self) {
        self.farm_dirty = false;
    }

    /// Marks a pending deletion as applied to the store.
    pub fn mark_delete_synced(&mut self, id: Uuid) {
        self.pending_deletes.retain(|other| *other != id);
    }
}

/// Fraction of `candidate` overlapping `existing`, sampled at strictly
/// interior points (centroid plus points midway from the centroid to each
/// vertex). Interior samples keep an exact re-detection of an existing
/// boundary from landing on the edge, where a ray-cast answer is
/// arbitrary.
#[allow(clippy::cast_precision_loss)]
fn overlap_fraction(existing: &[Coordinate], candidate: &[Coordinate]) -> f64 {
    let Some(center) = centroid(candidate) else {
        return 0.0;
    };
    let mut samples = vec![center];
    for vertex in candidate {
        samples.push(Coordinate::new(
            f64::midpoint(center.latitude, vertex.latitude),
            f64::midpoint(center.longitude, vertex.longitude),
        ));
    }
    let inside = samples.iter().filter(|p| contains(existing, p)).count();
    inside as f64 / samples.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::PALETTE;
    use farm_map_farm_models::Coordinate;

    fn c(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng)
    }

    fn farm_square() -> Polygon {
        Polygon::new(vec![
            c(40.000, -90.000),
            c(40.001, -90.000),
            c(40.001, -89.999),
            c(40.000, -89.999),
        ])
    }

    fn registry_with_boundary() -> FieldRegistry {
        let farm = Farm::new("Test Farm", c(40.0005, -89.9995));
        let mut registry = FieldRegistry::new(farm);
        registry.set_farm_boundary(farm_square()).unwrap();
        registry
    }

    /// A small square inside the farm, offset from its southwest corner
    /// by (dlat, dlng) degrees.
    fn inner_square(dlat: f64, dlng: f64) -> Polygon {
        let (lat, lng) = (40.000 + dlat, -90.000 + dlng);
        Polygon::new(vec![
            c(lat, lng),
            c(lat + 0.0002, lng),
            c(lat + 0.0002, lng + 0.0002),
            c(lat, lng + 0.0002),
        ])
    }

    #[test]
    fn colors_assigned_in_creation_order_and_stable_after_remove() {
        let mut registry = registry_with_boundary();
        let first = registry.add_field("Field 1").id;
        let second = registry.add_field("Field 2").id;
        assert_eq!(registry.field(first).unwrap().color, PALETTE[0]);
        assert_eq!(registry.field(second).unwrap().color, PALETTE[1]);

        registry.remove(first).unwrap();
        // Deleting the first field does not renumber the second.
        assert_eq!(registry.field(second).unwrap().color, PALETTE[1]);
    }

    #[test]
    fn colors_injective_up_to_palette_then_cycle() {
        let mut registry = registry_with_boundary();
        let mut seen = Vec::new();
        for i in 0..PALETTE.len() {
            let color = registry.add_field(format!("Field {i}")).color.clone();
            assert!(!seen.contains(&color), "color {color} reused early");
            seen.push(color);
        }
        let eleventh = registry.add_field("Field 11").color.clone();
        assert_eq!(eleventh, PALETTE[0]);
    }

    #[test]
    fn scenario_two_fields_in_farm_square() {
        let mut registry = registry_with_boundary();

        let first = registry.add_field("North Paddock").id;
        registry
            .set_field_boundary(first, inner_square(0.0004, 0.0004))
            .unwrap();
        let field = registry.field(first).unwrap();
        let hectares = farm_map_geometry::to_hectares(field.area_sq_m.unwrap());
        // 0.0002° is ~22m of latitude and ~17m of longitude at 40°N.
        assert!(
            hectares > 0.03 && hectares < 0.05,
            "unexpected hectares {hectares}"
        );
        assert_eq!(field.color, PALETTE[0]);

        let second = registry.add_field("South Paddock").id;
        assert_eq!(registry.field(second).unwrap().color, PALETTE[1]);

        registry.remove(first).unwrap();
        assert_eq!(registry.field(second).unwrap().color, PALETTE[1]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn set_boundary_failure_keeps_prior_boundary() {
        let mut registry = registry_with_boundary();
        let id = registry.add_field("Field 1").id;
        let good = inner_square(0.0004, 0.0004);
        registry.set_field_boundary(id, good.clone()).unwrap();

        let outside = Polygon::new(vec![
            c(41.0, -89.0),
            c(41.001, -89.0),
            c(41.001, -88.999),
            c(41.0, -88.999),
        ]);
        assert!(matches!(
            registry.set_field_boundary(id, outside),
            Err(BoundaryError::OutOfBounds { .. })
        ));
        assert_eq!(registry.field(id).unwrap().boundary.as_ref(), Some(&good));
    }

    #[test]
    fn set_boundary_is_last_write_wins() {
        let mut registry = registry_with_boundary();
        let id = registry.add_field("Field 1").id;
        registry
            .set_field_boundary(id, inner_square(0.0001, 0.0001))
            .unwrap();
        let second = inner_square(0.0005, 0.0005);
        registry.set_field_boundary(id, second.clone()).unwrap();
        assert_eq!(
            registry.field(id).unwrap().boundary.as_ref(),
            Some(&second)
        );
    }

    #[test]
    fn unknown_field_operations_fail() {
        let mut registry = registry_with_boundary();
        let ghost = Uuid::new_v4();
        assert_eq!(
            registry.rename(ghost, "x"),
            Err(BoundaryError::UnknownField(ghost))
        );
        assert_eq!(
            registry.recolor(ghost, "#ffffff"),
            Err(BoundaryError::UnknownField(ghost))
        );
        assert!(matches!(
            registry.remove(ghost),
            Err(BoundaryError::UnknownField(_))
        ));
    }

    #[test]
    fn dirty_tracking_follows_mutations() {
        let mut registry = registry_with_boundary();
        assert!(registry.farm_dirty());
        registry.mark_farm_synced();

        let id = registry.add_field("Field 1").id;
        assert_eq!(registry.dirty_ids(), vec![id]);
        registry.mark_field_synced(id);
        assert!(registry.dirty_ids().is_empty());

        registry.rename(id, "Renamed").unwrap();
        assert_eq!(registry.dirty_ids(), vec![id]);
        registry.mark_field_synced(id);

        registry.remove(id).unwrap();
        assert_eq!(registry.pending_deletes(), vec![id]);
        registry.mark_delete_synced(id);
        assert!(registry.pending_deletes().is_empty());
    }

    #[test]
    fn from_store_starts_clean() {
        let farm = Farm::new("Stored Farm", c(40.0, -90.0));
        let fields = vec![
            Field::new(farm.id, "A", PALETTE[0]),
            Field::new(farm.id, "B", PALETTE[1]),
        ];
        let ids: Vec<Uuid> = fields.iter().map(|f| f.id).collect();
        let registry = FieldRegistry::from_store(farm, fields);
        assert!(!registry.farm_dirty());
        assert!(registry.dirty_ids().is_empty());
        assert_eq!(
            registry.fields().map(|f| f.id).collect::<Vec<_>>(),
            ids
        );
    }

    #[test]
    fn merge_keeps_manual_field_and_skips_overlapping_candidates() {
        let mut registry = registry_with_boundary();

        // Manually drawn field with unsaved edits (dirty).
        let manual_boundary = inner_square(0.0004, 0.0004);
        let manual = registry.add_field("Hand Drawn").id;
        registry
            .set_field_boundary(manual, manual_boundary.clone())
            .unwrap();
        assert!(registry.dirty_ids().contains(&manual));

        let overlapping_a = DetectedField {
            boundary: manual_boundary.clone(),
            confidence: 0.9,
            area_sq_m: 0.0,
        };
        let overlapping_b = DetectedField {
            // Same square shifted a hair; still mostly inside the manual
            // field.
            boundary: inner_square(0.00041, 0.00041),
            confidence: 0.8,
            area_sq_m: 0.0,
        };
        let fresh = DetectedField {
            boundary: inner_square(0.0001, 0.0001),
            confidence: 0.7,
            area_sq_m: 0.0,
        };

        let report = registry.replace_all(vec![overlapping_a, overlapping_b, fresh], 0.5);

        assert_eq!(report.skipped_overlapping, 2);
        assert_eq!(report.added.len(), 1);
        assert_eq!(report.retained, 1);
        // The manual field survived with its unsaved boundary intact.
        let manual_field = registry.field(manual).unwrap();
        assert_eq!(manual_field.boundary.as_ref(), Some(&manual_boundary));
        assert!(registry.dirty_ids().contains(&manual));
        assert_eq!(registry.len(), 2);

        // The new field carries the advisory confidence tag.
        let added = registry.field(report.added[0]).unwrap();
        assert!(
            (added.metadata["detectionConfidence"].as_f64().unwrap() - 0.7).abs() < f64::EPSILON
        );
    }

    #[test]
    fn merge_routes_candidates_through_gate() {
        let mut registry = registry_with_boundary();
        let outside = DetectedField {
            boundary: Polygon::new(vec![
                c(41.0, -89.0),
                c(41.001, -89.0),
                c(41.001, -88.999),
                c(41.0, -88.999),
            ]),
            confidence: 0.99,
            area_sq_m: 0.0,
        };
        let report = registry.replace_all(vec![outside], 0.5);
        assert_eq!(report.rejected, 1);
        assert!(report.added.is_empty());
        assert!(registry.is_empty());
    }
}
