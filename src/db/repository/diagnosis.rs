use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

/// Map a diagnosis from `row` starting at column `start` (`id, description, is_deleted`).
pub(crate) fn diagnosis_from_row(row: &Row<'_>, start: usize) -> rusqlite::Result<Diagnosis> {
    Ok(Diagnosis {
        id: row.get(start)?,
        description: row.get(start + 1)?,
        deleted: row.get(start + 2)?,
    })
}

pub fn insert_diagnosis(conn: &Connection, description: &str) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO diagnoses (description) VALUES (?1)",
        params![description],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Delete-blind lookup.
pub fn get_diagnosis(conn: &Connection, id: i64) -> Result<Option<Diagnosis>, DatabaseError> {
    conn.query_row(
        "SELECT id, description, is_deleted FROM diagnoses WHERE id = ?1",
        params![id],
        |row| diagnosis_from_row(row, 0),
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn get_active_diagnosis(conn: &Connection, id: i64) -> Result<Option<Diagnosis>, DatabaseError> {
    conn.query_row(
        "SELECT id, description, is_deleted FROM diagnoses WHERE id = ?1 AND is_deleted = 0",
        params![id],
        |row| diagnosis_from_row(row, 0),
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Exact, case-sensitive match on description. Deleted rows match too:
/// the description column is unique across the whole table.
pub fn find_diagnosis_by_description(
    conn: &Connection,
    description: &str,
) -> Result<Option<Diagnosis>, DatabaseError> {
    conn.query_row(
        "SELECT id, description, is_deleted FROM diagnoses WHERE description = ?1",
        params![description],
        |row| diagnosis_from_row(row, 0),
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_active_diagnoses(conn: &Connection) -> Result<Vec<Diagnosis>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, description, is_deleted FROM diagnoses WHERE is_deleted = 0 ORDER BY id",
    )?;
    let rows = stmt.query_map([], |row| diagnosis_from_row(row, 0))?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn update_diagnosis(conn: &Connection, id: i64, description: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE diagnoses SET description = ?1 WHERE id = ?2",
        params![description, id],
    )?;
    Ok(())
}

/// Active diagnoses ranked by how many active examinations carry them.
/// Ties resolve to the lower diagnosis id. Unused diagnoses are omitted.
pub fn most_common_diagnoses(conn: &Connection) -> Result<Vec<DiagnosisCount>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT d.id, d.description, d.is_deleted, COUNT(e.id) AS frequency
         FROM diagnoses d
         JOIN examinations e ON e.diagnosis_id = d.id
         WHERE d.is_deleted = 0 AND e.is_deleted = 0
         GROUP BY d.id
         ORDER BY frequency DESC, d.id ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(DiagnosisCount {
            diagnosis: diagnosis_from_row(row, 0)?,
            count: row.get(3)?,
        })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
