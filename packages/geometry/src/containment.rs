//! Point-in-polygon and polygon containment tests.

use farm_map_farm_models::Coordinate;

use crate::measure::centroid;

/// Ray-casting point-in-polygon test.
///
/// Casts a ray eastward from the point and counts edge crossings; an odd
/// count means the point is inside. Points exactly on an edge land on
/// whichever side floating-point puts them — the containment tolerance in
/// the boundary gate absorbs that imprecision.
#[must_use]
pub fn contains(ring: &[Coordinate], point: &Coordinate) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let (px, py) = (point.longitude, point.latitude);
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (ix, iy) = (ring[i].longitude, ring[i].latitude);
        let (jx, jy) = (ring[j].longitude, ring[j].latitude);
        if ((iy > py) != (jy > py)) && (px < (jx - ix) * (py - iy) / (jy - iy) + ix) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Approximate fraction of `inner` lying outside `outer`, in [0, 1].
///
/// Samples the inner ring's vertices, edge midpoints, and centroid against
/// the outer ring and returns the outside fraction. This is a documented
/// simplification of exact polygon clipping: at the vertex counts involved
/// here it resolves well below the 5% default tolerance used by the farm
/// boundary gate.
///
/// A degenerate `inner` or `outer` (fewer than 3 vertices) counts as fully
/// outside.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn containment_ratio(outer: &[Coordinate], inner: &[Coordinate]) -> f64 {
    let n = inner.len();
    if n < 3 || outer.len() < 3 {
        return 1.0;
    }

    let mut samples = Vec::with_capacity(2 * n + 1);
    for i in 0..n {
        let a = &inner[i];
        let b = &inner[(i + 1) % n];
        samples.push(*a);
        samples.push(Coordinate::new(
            f64::midpoint(a.latitude, b.latitude),
            f64::midpoint(a.longitude, b.longitude),
        ));
    }
    if let Some(center) = centroid(inner) {
        samples.push(center);
    }

    let outside = samples.iter().filter(|p| !contains(outer, p)).count();
    outside as f64 / samples.len() as f64
}
