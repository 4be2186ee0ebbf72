//! Farm and field record storage in `DuckDB`.
//!
//! Farms and fields are flat rows keyed by TEXT UUIDs with their boundary
//! rings as `GeoJSON` TEXT. Timestamps are RFC 3339 TEXT so that
//! creation-order reads are a plain `ORDER BY`. All writes are keyed
//! upserts: reapplying the same payload yields the same stored state.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use duckdb::Connection;
use farm_map_farm_models::{Coordinate, Farm, Field};
use uuid::Uuid;

use crate::DbError;
use crate::geojson::{polygon_from_geojson, polygon_to_geojson};

/// Opens (or creates) the farms `DuckDB` and ensures schema exists.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open(path: &Path) -> Result<Connection, DbError> {
    if let Some(parent) = path.parent() {
        crate::paths::ensure_dir(parent)?;
    }

    let conn = Connection::open(path)?;
    create_schema(&conn)?;
    log::debug!("opened farms database at {}", path.display());
    Ok(conn)
}

/// Opens the farms DB at the default path.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open_default() -> Result<Connection, DbError> {
    open(&crate::paths::farms_db_path())
}

/// Opens an in-memory farms DB with schema, for tests and ephemeral
/// sessions.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open_in_memory() -> Result<Connection, DbError> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

fn create_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS farms (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            location_lat DOUBLE NOT NULL,
            location_lng DOUBLE NOT NULL,
            boundary_geojson TEXT,
            area_sq_m DOUBLE,
            owner_ref TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS fields (
            id TEXT PRIMARY KEY,
            farm_id TEXT NOT NULL,
            name TEXT NOT NULL,
            boundary_geojson TEXT,
            area_sq_m DOUBLE,
            centroid_lat DOUBLE,
            centroid_lng DOUBLE,
            color TEXT NOT NULL,
            metadata_json TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );",
    )?;

    Ok(())
}

/// Upserts a farm row, returning the stored identity.
///
/// # Errors
///
/// Returns [`DbError`] if encoding or the write fails.
pub fn upsert_farm(conn: &Connection, farm: &Farm) -> Result<Uuid, DbError> {
    let boundary_geojson = farm
        .boundary
        .as_ref()
        .map(polygon_to_geojson)
        .transpose()?;

    let stored_id: String = conn
        .prepare(
            "INSERT OR REPLACE INTO farms (
                id, name, location_lat, location_lng, boundary_geojson,
                area_sq_m, owner_ref, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id",
        )?
        .query_row(
            duckdb::params![
                farm.id.to_string(),
                farm.name,
                farm.location.latitude,
                farm.location.longitude,
                boundary_geojson.as_deref(),
                farm.area_sq_m,
                farm.owner_ref.as_deref(),
                format_timestamp(farm.created_at),
                format_timestamp(farm.updated_at),
            ],
            |row| row.get(0),
        )?;

    parse_uuid(&stored_id)
}

/// Upserts a field row, returning the stored identity. A field is not
/// considered durable until this returns.
///
/// # Errors
///
/// Returns [`DbError`] if encoding or the write fails.
pub fn upsert_field(conn: &Connection, field: &Field) -> Result<Uuid, DbError> {
    let boundary_geojson = field
        .boundary
        .as_ref()
        .map(polygon_to_geojson)
        .transpose()?;
    let metadata_json = if field.metadata.is_null() {
        None
    } else {
        Some(
            serde_json::to_string(&field.metadata).map_err(|e| DbError::Conversion {
                message: format!("Failed to serialize field metadata: {e}"),
            })?,
        )
    };

    let stored_id: String = conn
        .prepare(
            "INSERT OR REPLACE INTO fields (
                id, farm_id, name, boundary_geojson, area_sq_m,
                centroid_lat, centroid_lng, color, metadata_json,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id",
        )?
        .query_row(
            duckdb::params![
                field.id.to_string(),
                field.farm_id.to_string(),
                field.name,
                boundary_geojson.as_deref(),
                field.area_sq_m,
                field.centroid.map(|c| c.latitude),
                field.centroid.map(|c| c.longitude),
                field.color,
                metadata_json.as_deref(),
                format_timestamp(field.created_at),
                format_timestamp(field.updated_at),
            ],
            |row| row.get(0),
        )?;

    parse_uuid(&stored_id)
}

/// Loads a farm by id, or `None` if it does not exist.
///
/// # Errors
///
/// Returns [`DbError`] if the query or row decoding fails.
pub fn load_farm(conn: &Connection, id: Uuid) -> Result<Option<Farm>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, location_lat, location_lng, boundary_geojson,
                area_sq_m, owner_ref, created_at, updated_at
         FROM farms WHERE id = ?",
    )?;
    stmt.raw_bind_parameter(1, id.to_string())?;
    stmt.raw_execute()?;

    let mut rows = stmt.raw_query();
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    let stored_id: String = row.get(0)?;
    let boundary_geojson: Option<String> = row.get(4)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;

    Ok(Some(Farm {
        id: parse_uuid(&stored_id)?,
        name: row.get(1)?,
        location: Coordinate::new(row.get(2)?, row.get(3)?),
        boundary: boundary_geojson
            .as_deref()
            .map(polygon_from_geojson)
            .transpose()?,
        area_sq_m: row.get(5)?,
        owner_ref: row.get(6)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    }))
}

/// Loads a farm's fields in creation order.
///
/// # Errors
///
/// Returns [`DbError`] if the query or row decoding fails.
pub fn load_fields(conn: &Connection, farm_id: Uuid) -> Result<Vec<Field>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT id, farm_id, name, boundary_geojson, area_sq_m,
                centroid_lat, centroid_lng, color, metadata_json,
                created_at, updated_at
         FROM fields WHERE farm_id = ?
         ORDER BY created_at, id",
    )?;
    stmt.raw_bind_parameter(1, farm_id.to_string())?;
    stmt.raw_execute()?;

    let mut fields = Vec::new();
    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next()? {
        let stored_id: String = row.get(0)?;
        let stored_farm_id: String = row.get(1)?;
        let boundary_geojson: Option<String> = row.get(3)?;
        let centroid_lat: Option<f64> = row.get(5)?;
        let centroid_lng: Option<f64> = row.get(6)?;
        let metadata_json: Option<String> = row.get(8)?;
        let created_at: String = row.get(9)?;
        let updated_at: String = row.get(10)?;

        let metadata = metadata_json.map_or(Ok(serde_json::Value::Null), |json| {
            serde_json::from_str(&json).map_err(|e| DbError::Conversion {
                message: format!("Invalid field metadata JSON: {e}"),
            })
        })?;

        fields.push(Field {
            id: parse_uuid(&stored_id)?,
            farm_id: parse_uuid(&stored_farm_id)?,
            name: row.get(2)?,
            boundary: boundary_geojson
                .as_deref()
                .map(polygon_from_geojson)
                .transpose()?,
            area_sq_m: row.get(4)?,
            centroid: centroid_lat
                .zip(centroid_lng)
                .map(|(lat, lng)| Coordinate::new(lat, lng)),
            color: row.get(7)?,
            metadata,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        });
    }

    Ok(fields)
}

/// Deletes a field row. Deleting a row that does not exist is a no-op.
///
/// # Errors
///
/// Returns [`DbError`] if the delete fails.
pub fn delete_field(conn: &Connection, id: Uuid) -> Result<(), DbError> {
    conn.execute(
        "DELETE FROM fields WHERE id = ?",
        duckdb::params![id.to_string()],
    )?;
    Ok(())
}

/// RFC 3339 with fixed microsecond precision so that TEXT ordering is
/// creation ordering.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Conversion {
            message: format!("Invalid stored timestamp '{raw}': {e}"),
        })
}

fn parse_uuid(raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Conversion {
        message: format!("Invalid stored id '{raw}': {e}"),
    })
}
