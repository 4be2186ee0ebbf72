//! Area, centroid, bounding region, and unit conversions.

use farm_map_farm_models::{BoundingRegion, Coordinate};

/// Mean Earth radius in meters (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Square meters per acre.
pub const SQ_M_PER_ACRE: f64 = 4_046.86;

/// Square meters per hectare.
pub const SQ_M_PER_HECTARE: f64 = 10_000.0;

/// Computes the area of a boundary ring in square meters.
///
/// Vertices are projected onto a local tangent plane (equirectangular
/// about the ring's mean latitude — the cos(latitude) factor corrects the
/// longitude distortion at that latitude) and the planar shoelace formula
/// is applied. For farm-scale rings (up to a few km across) this is
/// accurate to well under 1% of the true spherical area.
///
/// Degenerate rings (fewer than 3 vertices, or collinear) yield 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn area_sq_m(vertices: &[Coordinate]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }

    let origin = &vertices[0];
    let mean_lat = vertices.iter().map(|v| v.latitude).sum::<f64>() / n as f64;
    let cos_lat = mean_lat.to_radians().cos();

    // Project to meters relative to the first vertex; relative coordinates
    // keep the shoelace sum clear of floating-point cancellation.
    let project = |v: &Coordinate| -> (f64, f64) {
        let x = (v.longitude - origin.longitude).to_radians() * EARTH_RADIUS_M * cos_lat;
        let y = (v.latitude - origin.latitude).to_radians() * EARTH_RADIUS_M;
        (x, y)
    };

    let mut sum = 0.0;
    for i in 0..n {
        let (ax, ay) = project(&vertices[i]);
        let (bx, by) = project(&vertices[(i + 1) % n]);
        sum += ax * by - bx * ay;
    }

    (sum / 2.0).abs()
}

/// Converts square meters to acres (full precision).
#[must_use]
pub fn to_acres(sq_m: f64) -> f64 {
    sq_m / SQ_M_PER_ACRE
}

/// Converts square meters to hectares (full precision).
#[must_use]
pub fn to_hectares(sq_m: f64) -> f64 {
    sq_m / SQ_M_PER_HECTARE
}

/// Acres rounded to the nearest whole unit for display.
#[must_use]
pub fn to_acres_rounded(sq_m: f64) -> f64 {
    to_acres(sq_m).round()
}

/// Hectares rounded to the nearest whole unit for display.
#[must_use]
pub fn to_hectares_rounded(sq_m: f64) -> f64 {
    to_hectares(sq_m).round()
}

/// Arithmetic mean of the ring's vertices.
///
/// This is not the true area centroid, but for the small convex-ish
/// shapes farms draw it is close enough to anchor labels and run the
/// containment check. Returns `None` for an empty ring.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn centroid(vertices: &[Coordinate]) -> Option<Coordinate> {
    if vertices.is_empty() {
        return None;
    }
    let n = vertices.len() as f64;
    let lat = vertices.iter().map(|v| v.latitude).sum::<f64>() / n;
    let lng = vertices.iter().map(|v| v.longitude).sum::<f64>() / n;
    Some(Coordinate::new(lat, lng))
}

/// Axis-aligned bounding region of the ring, or `None` if it is empty.
#[must_use]
pub fn bounding_region(vertices: &[Coordinate]) -> Option<BoundingRegion> {
    let first = vertices.first()?;
    let mut region = BoundingRegion {
        north: first.latitude,
        south: first.latitude,
        east: first.longitude,
        west: first.longitude,
    };
    for v in &vertices[1..] {
        region.north = region.north.max(v.latitude);
        region.south = region.south.min(v.latitude);
        region.east = region.east.max(v.longitude);
        region.west = region.west.min(v.longitude);
    }
    Some(region)
}
