use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::doctor::doctor_from_row;
use super::patient::patient_from_row;
use crate::db::DatabaseError;
use crate::models::*;

fn record_from_row(row: &Row<'_>, start: usize) -> rusqlite::Result<HospitalRecord> {
    Ok(HospitalRecord {
        id: row.get(start)?,
        admission_date: row.get(start + 1)?,
        discharge_date: row.get(start + 2)?,
        patient_id: row.get(start + 3)?,
        doctor_id: row.get(start + 4)?,
        deleted: row.get(start + 5)?,
    })
}

const RECORD_SELECT: &str = "SELECT h.id, h.admission_date, h.discharge_date, h.patient_id,
        h.doctor_id, h.is_deleted
 FROM hospital_records h";

// Columns: record 0..=5, patient 6..=11, doctor 12..=16.
const DETAIL_SELECT: &str = "SELECT h.id, h.admission_date, h.discharge_date, h.patient_id,
        h.doctor_id, h.is_deleted,
        p.id, p.first_name, p.last_name, p.is_health_insurance_paid, p.personal_doctor_id, p.is_deleted,
        d.id, d.first_name, d.last_name, d.specialty, d.is_deleted
 FROM hospital_records h
 JOIN patients p ON p.id = h.patient_id
 JOIN doctors d ON d.id = h.doctor_id";

fn detail_from_row(row: &Row<'_>) -> rusqlite::Result<HospitalRecordDetail> {
    Ok(HospitalRecordDetail {
        record: record_from_row(row, 0)?,
        patient: patient_from_row(row, 6)?,
        doctor: doctor_from_row(row, 12)?,
    })
}

pub fn insert_hospital_record(
    conn: &Connection,
    record: &HospitalRecordData,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO hospital_records (admission_date, discharge_date, patient_id, doctor_id)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            record.admission_date,
            record.discharge_date,
            record.patient_id,
            record.doctor_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Delete-blind lookup.
pub fn get_hospital_record(
    conn: &Connection,
    id: i64,
) -> Result<Option<HospitalRecord>, DatabaseError> {
    conn.query_row(
        &format!("{RECORD_SELECT} WHERE h.id = ?1"),
        params![id],
        |row| record_from_row(row, 0),
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn get_active_hospital_record(
    conn: &Connection,
    id: i64,
) -> Result<Option<HospitalRecord>, DatabaseError> {
    conn.query_row(
        &format!("{RECORD_SELECT} WHERE h.id = ?1 AND h.is_deleted = 0"),
        params![id],
        |row| record_from_row(row, 0),
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn get_active_hospital_record_detail(
    conn: &Connection,
    id: i64,
) -> Result<Option<HospitalRecordDetail>, DatabaseError> {
    conn.query_row(
        &format!("{DETAIL_SELECT} WHERE h.id = ?1 AND h.is_deleted = 0"),
        params![id],
        detail_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_active_hospital_record_details(
    conn: &Connection,
) -> Result<Vec<HospitalRecordDetail>, DatabaseError> {
    query_details(
        conn,
        &format!("{DETAIL_SELECT} WHERE h.is_deleted = 0 ORDER BY h.id"),
        params![],
    )
}

/// Active records admitted within `[start, end]`.
pub fn list_active_hospital_record_details_admitted_between(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<HospitalRecordDetail>, DatabaseError> {
    query_details(
        conn,
        &format!(
            "{DETAIL_SELECT}
             WHERE h.admission_date BETWEEN ?1 AND ?2 AND h.is_deleted = 0
             ORDER BY h.admission_date, h.id"
        ),
        params![start, end],
    )
}

/// Active records admitted in the given calendar month.
pub fn list_active_hospital_record_details_in_month(
    conn: &Connection,
    year: i32,
    month: u32,
) -> Result<Vec<HospitalRecordDetail>, DatabaseError> {
    query_details(
        conn,
        &format!(
            "{DETAIL_SELECT}
             WHERE CAST(strftime('%Y', h.admission_date) AS INTEGER) = ?1
               AND CAST(strftime('%m', h.admission_date) AS INTEGER) = ?2
               AND h.is_deleted = 0
             ORDER BY h.admission_date, h.id"
        ),
        params![year, month],
    )
}

pub fn update_hospital_record(
    conn: &Connection,
    id: i64,
    record: &HospitalRecordData,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE hospital_records
         SET admission_date = ?1, discharge_date = ?2, patient_id = ?3, doctor_id = ?4
         WHERE id = ?5",
        params![
            record.admission_date,
            record.discharge_date,
            record.patient_id,
            record.doctor_id,
            id,
        ],
    )?;
    Ok(())
}

/// Month of `year` with the most active admissions. Ties go to the earlier month.
pub fn busiest_admission_month(
    conn: &Connection,
    year: i32,
) -> Result<Option<MonthCount>, DatabaseError> {
    conn.query_row(
        "SELECT CAST(strftime('%m', admission_date) AS INTEGER) AS month, COUNT(*) AS total
         FROM hospital_records
         WHERE CAST(strftime('%Y', admission_date) AS INTEGER) = ?1 AND is_deleted = 0
         GROUP BY month
         ORDER BY total DESC, month ASC
         LIMIT 1",
        params![year],
        |row| {
            Ok(MonthCount {
                month: row.get(0)?,
                count: row.get(1)?,
            })
        },
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Active doctor with the most active hospital records. Ties go to the lower id.
pub fn busiest_admitting_doctor(conn: &Connection) -> Result<Option<DoctorCount>, DatabaseError> {
    conn.query_row(
        "SELECT d.id, d.first_name, d.last_name, d.specialty, d.is_deleted, COUNT(h.id) AS total
         FROM hospital_records h
         JOIN doctors d ON d.id = h.doctor_id
         WHERE h.is_deleted = 0 AND d.is_deleted = 0
         GROUP BY d.id
         ORDER BY total DESC, d.id ASC
         LIMIT 1",
        [],
        |row| {
            Ok(DoctorCount {
                doctor: doctor_from_row(row, 0)?,
                count: row.get(5)?,
            })
        },
    )
    .optional()
    .map_err(DatabaseError::from)
}

fn query_details(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<HospitalRecordDetail>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, detail_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
