#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Reconciles the in-memory field registry with the farms database.
//!
//! The registry tracks which records have unsaved changes; the
//! synchronizer pushes exactly those — the farm row if dirty, every dirty
//! field, and queued deletions. Each write retries once on failure, then
//! the failure is reported per-record and the record STAYS dirty in
//! memory, so a flaky store never costs the user their drawing work. A
//! field is only marked durable once the store confirms its identity.
//!
//! [`hydrate`] goes the other way: it rebuilds a clean registry from the
//! store at the start of an editing session.

use duckdb::Connection;
use farm_map_boundary::registry::FieldRegistry;
use farm_map_database::{DbError, fields_db};
use thiserror::Error;
use uuid::Uuid;

/// Errors from registry/store reconciliation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Store operation failed.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] DbError),

    /// The requested farm does not exist in the store.
    #[error("Farm not found: {0}")]
    FarmNotFound(Uuid),
}

/// Per-record outcome of one synchronization pass.
///
/// Failed records remain dirty in the registry; calling
/// [`sync_registry`] again retries just those.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// The farm row was written this pass.
    pub farm_saved: bool,
    /// The farm row failed to write (message), and remains dirty.
    pub farm_error: Option<String>,
    /// Fields confirmed durable by the store this pass.
    pub saved: Vec<Uuid>,
    /// Queued deletions applied this pass.
    pub deleted: Vec<Uuid>,
    /// Records that failed after the retry: `(id, reason)`.
    pub failed: Vec<(Uuid, String)>,
}

impl SyncReport {
    /// `true` when every pushed record succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.farm_error.is_none()
    }
}

/// Pushes all unsaved registry state to the store.
///
/// Never fails as a whole: per-record failures (after one retry each)
/// are collected in the report and the corresponding records stay dirty.
pub fn sync_registry(conn: &Connection, registry: &mut FieldRegistry) -> SyncReport {
    let mut report = SyncReport::default();

    if registry.farm_dirty() {
        let result = with_retry("farm upsert", || {
            fields_db::upsert_farm(conn, registry.farm())
        });
        match result {
            Ok(_) => {
                registry.mark_farm_synced();
                report.farm_saved = true;
            }
            Err(err) => {
                log::error!("farm {} failed to persist: {err}", registry.farm().id);
                report.farm_error = Some(err.to_string());
            }
        }
    }

    for id in registry.dirty_ids() {
        let Some(field) = registry.field(id) else {
            continue;
        };
        let result = with_retry("field upsert", || fields_db::upsert_field(conn, field));
        match result {
            Ok(stored) if stored == id => {
                registry.mark_field_synced(id);
                report.saved.push(id);
            }
            Ok(stored) => {
                log::error!("store returned mismatched id {stored} for field {id}");
                report
                    .failed
                    .push((id, format!("store returned mismatched id {stored}")));
            }
            Err(err) => {
                log::error!("field {id} failed to persist: {err}");
                report.failed.push((id, err.to_string()));
            }
        }
    }

    for id in registry.pending_deletes() {
        let result = with_retry("field delete", || fields_db::delete_field(conn, id));
        match result {
            Ok(()) => {
                registry.mark_delete_synced(id);
                report.deleted.push(id);
            }
            Err(err) => {
                log::error!("field {id} failed to delete: {err}");
                report.failed.push((id, err.to_string()));
            }
        }
    }

    log::info!(
        "sync complete: {} saved, {} deleted, {} failed",
        report.saved.len(),
        report.deleted.len(),
        report.failed.len()
    );

    report
}

/// Rebuilds a clean registry from the store for an editing session.
///
/// # Errors
///
/// [`SyncError::FarmNotFound`] if no farm row exists for `farm_id`;
/// [`SyncError::Persistence`] if the reads fail.
pub fn hydrate(conn: &Connection, farm_id: Uuid) -> Result<FieldRegistry, SyncError> {
    let farm = fields_db::load_farm(conn, farm_id)?.ok_or(SyncError::FarmNotFound(farm_id))?;
    let fields = fields_db::load_fields(conn, farm_id)?;
    log::debug!("hydrated farm {farm_id} with {} fields", fields.len());
    Ok(FieldRegistry::from_store(farm, fields))
}

/// Runs a store operation, retrying once on failure. Transient `DuckDB`
/// errors (lock contention, interrupted I/O) usually clear on the second
/// attempt; anything else fails fast to the caller.
fn with_retry<T>(what: &str, op: impl Fn() -> Result<T, DbError>) -> Result<T, DbError> {
    match op() {
        Ok(value) => Ok(value),
        Err(first) => {
            log::warn!("{what} failed ({first}), retrying once");
            op()
        }
    }
}
