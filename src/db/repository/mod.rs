//! Repository layer: entity-scoped database operations.
//!
//! Every entity table carries `is_deleted`. Each sub-module exposes a
//! delete-blind `get_<entity>` (used before flipping the flag), a delete-aware
//! `get_active_<entity>`, and list queries that only ever return active rows.
//! Joined and grouped queries filter `is_deleted = 0` on every table they touch.

mod account;
mod diagnosis;
mod doctor;
mod examination;
mod hospital_record;
mod patient;

use rusqlite::{params, Connection};

use super::DatabaseError;

/// Tables that support soft deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftDeleteTable {
    Doctors,
    Patients,
    Diagnoses,
    Examinations,
    HospitalRecords,
    Roles,
}

impl SoftDeleteTable {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Doctors => "doctors",
            Self::Patients => "patients",
            Self::Diagnoses => "diagnoses",
            Self::Examinations => "examinations",
            Self::HospitalRecords => "hospital_records",
            Self::Roles => "roles",
        }
    }
}

/// Flip the `is_deleted` flag on a row. Returns `false` when no row has that id.
///
/// Marking an already deleted row succeeds and leaves it deleted.
pub fn soft_delete(
    conn: &Connection,
    table: SoftDeleteTable,
    id: i64,
) -> Result<bool, DatabaseError> {
    let sql = format!("UPDATE {} SET is_deleted = 1 WHERE id = ?1", table.as_str());
    let changed = conn.execute(&sql, params![id])?;
    Ok(changed > 0)
}

// Re-export all public items from sub-modules
pub use account::*;
pub use diagnosis::*;
pub use doctor::*;
pub use examination::*;
pub use hospital_record::*;
pub use patient::*;
