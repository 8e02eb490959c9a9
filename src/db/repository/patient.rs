use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

/// Map a patient from `row` starting at column `start` (`id, first_name,
/// last_name, is_health_insurance_paid, personal_doctor_id, is_deleted`).
pub(crate) fn patient_from_row(row: &Row<'_>, start: usize) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(start)?,
        first_name: row.get(start + 1)?,
        last_name: row.get(start + 2)?,
        health_insurance_paid: row.get(start + 3)?,
        personal_doctor_id: row.get(start + 4)?,
        deleted: row.get(start + 5)?,
    })
}

const PATIENT_SELECT: &str = "SELECT p.id, p.first_name, p.last_name, p.is_health_insurance_paid,
        p.personal_doctor_id, p.is_deleted
 FROM patients p";

pub fn insert_patient(conn: &Connection, patient: &PatientData) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO patients (first_name, last_name, is_health_insurance_paid, personal_doctor_id)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            patient.first_name,
            patient.last_name,
            patient.health_insurance_paid,
            patient.personal_doctor_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Delete-blind lookup.
pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    conn.query_row(
        &format!("{PATIENT_SELECT} WHERE p.id = ?1"),
        params![id],
        |row| patient_from_row(row, 0),
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn get_active_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    conn.query_row(
        &format!("{PATIENT_SELECT} WHERE p.id = ?1 AND p.is_deleted = 0"),
        params![id],
        |row| patient_from_row(row, 0),
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_active_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    query_patients(
        conn,
        &format!("{PATIENT_SELECT} WHERE p.is_deleted = 0 ORDER BY p.id"),
        params![],
    )
}

/// Active patients whose personal doctor is `doctor_id`.
pub fn list_active_patients_by_personal_doctor(
    conn: &Connection,
    doctor_id: i64,
) -> Result<Vec<Patient>, DatabaseError> {
    query_patients(
        conn,
        &format!(
            "{PATIENT_SELECT} WHERE p.personal_doctor_id = ?1 AND p.is_deleted = 0 ORDER BY p.id"
        ),
        params![doctor_id],
    )
}

/// Distinct active patients with at least one active examination carrying `diagnosis_id`.
pub fn list_active_patients_with_diagnosis(
    conn: &Connection,
    diagnosis_id: i64,
) -> Result<Vec<Patient>, DatabaseError> {
    query_patients(
        conn,
        "SELECT DISTINCT p.id, p.first_name, p.last_name, p.is_health_insurance_paid,
                p.personal_doctor_id, p.is_deleted
         FROM patients p
         JOIN examinations e ON e.patient_id = p.id
         WHERE e.diagnosis_id = ?1 AND e.is_deleted = 0 AND p.is_deleted = 0
         ORDER BY p.id",
        params![diagnosis_id],
    )
}

pub fn update_patient(conn: &Connection, id: i64, patient: &PatientData) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE patients
         SET first_name = ?1, last_name = ?2, is_health_insurance_paid = ?3, personal_doctor_id = ?4
         WHERE id = ?5",
        params![
            patient.first_name,
            patient.last_name,
            patient.health_insurance_paid,
            patient.personal_doctor_id,
            id,
        ],
    )?;
    Ok(())
}

fn query_patients(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| patient_from_row(row, 0))?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
