//! `GeoJSON` encoding for boundary columns.
//!
//! Boundary rings close implicitly in memory (no repeated final vertex)
//! but `GeoJSON` requires an explicit closing position, so encoding
//! appends it and decoding strips it. Positions are `[lng, lat]` per the
//! `GeoJSON` spec, the reverse of the in-memory (lat, lng) order.

use farm_map_farm_models::{Coordinate, Polygon};
use geojson::{GeoJson, Geometry, Value};

use crate::DbError;

/// Encodes a boundary ring as a `GeoJSON` `Polygon` geometry string.
///
/// # Errors
///
/// Returns [`DbError::Conversion`] if serialization fails.
pub fn polygon_to_geojson(polygon: &Polygon) -> Result<String, DbError> {
    let mut ring: Vec<Vec<f64>> = polygon
        .vertices
        .iter()
        .map(|v| vec![v.longitude, v.latitude])
        .collect();
    if let Some(first) = ring.first().cloned() {
        ring.push(first);
    }

    let geometry = Geometry::new(Value::Polygon(vec![ring]));
    serde_json::to_string(&geometry).map_err(|e| DbError::Conversion {
        message: format!("Failed to serialize boundary GeoJSON: {e}"),
    })
}

/// Decodes a `GeoJSON` `Polygon` geometry string into a boundary ring.
///
/// Only the exterior ring is read; farm and field boundaries have no
/// holes.
///
/// # Errors
///
/// Returns [`DbError::Conversion`] for malformed `GeoJSON` or a
/// non-`Polygon` geometry.
pub fn polygon_from_geojson(geojson_str: &str) -> Result<Polygon, DbError> {
    let geojson: GeoJson = geojson_str.parse().map_err(|e| DbError::Conversion {
        message: format!("Invalid boundary GeoJSON: {e}"),
    })?;

    let GeoJson::Geometry(geometry) = geojson else {
        return Err(DbError::Conversion {
            message: "Boundary GeoJSON is not a bare geometry".to_string(),
        });
    };

    let Value::Polygon(rings) = geometry.value else {
        return Err(DbError::Conversion {
            message: "Boundary GeoJSON is not a Polygon".to_string(),
        });
    };

    let exterior = rings.first().ok_or_else(|| DbError::Conversion {
        message: "Boundary GeoJSON polygon has no rings".to_string(),
    })?;

    let mut vertices = Vec::with_capacity(exterior.len());
    for position in exterior {
        if position.len() < 2 {
            return Err(DbError::Conversion {
                message: "Boundary GeoJSON position has fewer than 2 elements".to_string(),
            });
        }
        vertices.push(Coordinate::new(position[1], position[0]));
    }

    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }

    Ok(Polygon::new(vertices))
}
