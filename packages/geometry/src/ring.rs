#![allow(clippy::module_name_repetitions)]
//! Boundary ring validation.
//!
//! A valid ring has at least 3 vertices, all inside the WGS84 coordinate
//! range, no duplicate consecutive vertices (the ring closes implicitly,
//! so "consecutive" includes last-to-first), a non-zero enclosed area, and
//! no pair of non-adjacent edges that cross or overlap.

use farm_map_farm_models::Coordinate;

use crate::GeometryError;

/// Two coordinates closer than this (in degrees) are the same vertex.
/// 1e-9° is well under a millimeter on the ground.
const VERTEX_EPSILON_DEG: f64 = 1e-9;

/// Degree-space shoelace sums below this are treated as zero area.
/// Corresponds to a ring roughly a centimeter across.
const DEGENERATE_AREA_DEG2: f64 = 1e-14;

/// Validates a boundary ring, returning the first failure found.
///
/// Checks run cheapest-first: vertex count, coordinate range, duplicate
/// consecutive vertices, degenerate (collinear) rings, then the O(n²)
/// pairwise non-adjacent segment intersection test.
///
/// # Errors
///
/// Returns the corresponding [`GeometryError`] variant for the first
/// violated invariant.
pub fn ring_is_valid(vertices: &[Coordinate]) -> Result<(), GeometryError> {
    let n = vertices.len();
    if n < 3 {
        return Err(GeometryError::TooFewVertices { count: n });
    }

    for (index, vertex) in vertices.iter().enumerate() {
        if !vertex.is_in_range() {
            return Err(GeometryError::CoordinateOutOfRange { index });
        }
    }

    for index in 0..n {
        if same_vertex(&vertices[index], &vertices[(index + 1) % n]) {
            return Err(GeometryError::DuplicateVertex { index });
        }
    }

    // Edge i runs from vertex i to vertex (i + 1) % n. Edges sharing a
    // vertex are adjacent and may legitimately touch there. This runs
    // before the degeneracy check: a symmetric bowtie encloses zero
    // signed area and would otherwise be misreported as degenerate.
    for first in 0..n {
        for second in (first + 1)..n {
            if second == first + 1 || (first == 0 && second == n - 1) {
                continue;
            }
            let a = &vertices[first];
            let b = &vertices[(first + 1) % n];
            let c = &vertices[second];
            let d = &vertices[(second + 1) % n];
            if segments_intersect(a, b, c, d) {
                return Err(GeometryError::SelfIntersection { first, second });
            }
        }
    }

    if shoelace_deg2(vertices).abs() < DEGENERATE_AREA_DEG2 {
        return Err(GeometryError::DegenerateRing);
    }

    Ok(())
}

/// Convenience wrapper: `true` iff [`ring_is_valid`] passes.
#[must_use]
pub fn is_valid(vertices: &[Coordinate]) -> bool {
    ring_is_valid(vertices).is_ok()
}

fn same_vertex(a: &Coordinate, b: &Coordinate) -> bool {
    (a.latitude - b.latitude).abs() < VERTEX_EPSILON_DEG
        && (a.longitude - b.longitude).abs() < VERTEX_EPSILON_DEG
}

/// Twice the signed ring area in degree-space, computed relative to the
/// first vertex to avoid cancellation at large raw coordinates. Only used
/// to detect degenerate rings; real area math lives in [`crate::measure`].
fn shoelace_deg2(vertices: &[Coordinate]) -> f64 {
    let n = vertices.len();
    let origin = &vertices[0];
    let mut sum = 0.0;
    for i in 0..n {
        let a = &vertices[i];
        let b = &vertices[(i + 1) % n];
        let (ax, ay) = (a.longitude - origin.longitude, a.latitude - origin.latitude);
        let (bx, by) = (b.longitude - origin.longitude, b.latitude - origin.latitude);
        sum += ax * by - bx * ay;
    }
    sum
}

/// Orientation of the ordered triple (a, b, c): positive for
/// counter-clockwise, negative for clockwise, zero for collinear.
fn orientation(a: &Coordinate, b: &Coordinate, c: &Coordinate) -> f64 {
    (b.longitude - a.longitude) * (c.latitude - a.latitude)
        - (b.latitude - a.latitude) * (c.longitude - a.longitude)
}

/// Returns `true` if `p` lies on segment a-b, assuming collinearity.
fn on_segment(a: &Coordinate, b: &Coordinate, p: &Coordinate) -> bool {
    p.longitude <= a.longitude.max(b.longitude) + VERTEX_EPSILON_DEG
        && p.longitude >= a.longitude.min(b.longitude) - VERTEX_EPSILON_DEG
        && p.latitude <= a.latitude.max(b.latitude) + VERTEX_EPSILON_DEG
        && p.latitude >= a.latitude.min(b.latitude) - VERTEX_EPSILON_DEG
}

/// Segment intersection test including collinear overlap and endpoint
/// touches. Non-adjacent ring edges must not meet at all, so any contact
/// counts as an intersection.
fn segments_intersect(a: &Coordinate, b: &Coordinate, c: &Coordinate, d: &Coordinate) -> bool {
    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);

    if o1 * o2 < 0.0 && o3 * o4 < 0.0 {
        return true;
    }

    (o1.abs() < f64::EPSILON && on_segment(a, b, c))
        || (o2.abs() < f64::EPSILON && on_segment(a, b, d))
        || (o3.abs() < f64::EPSILON && on_segment(c, d, a))
        || (o4.abs() < f64::EPSILON && on_segment(c, d, b))
}
