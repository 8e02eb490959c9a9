use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::diagnosis::diagnosis_from_row;
use super::doctor::doctor_from_row;
use super::patient::patient_from_row;
use crate::db::DatabaseError;
use crate::models::*;

fn examination_from_row(row: &Row<'_>, start: usize) -> rusqlite::Result<Examination> {
    Ok(Examination {
        id: row.get(start)?,
        examination_date: row.get(start + 1)?,
        treatment_description: row.get(start + 2)?,
        sick_leave_days: row.get(start + 3)?,
        sick_leave_start_date: row.get(start + 4)?,
        patient_id: row.get(start + 5)?,
        doctor_id: row.get(start + 6)?,
        diagnosis_id: row.get(start + 7)?,
        deleted: row.get(start + 8)?,
    })
}

const EXAMINATION_SELECT: &str = "SELECT e.id, e.examination_date, e.treatment_description,
        e.sick_leave_days, e.sick_leave_start_date, e.patient_id, e.doctor_id,
        e.diagnosis_id, e.is_deleted
 FROM examinations e";

// Columns: examination 0..=8, patient 9..=14, doctor 15..=19, diagnosis 20..=22.
const DETAIL_SELECT: &str = "SELECT e.id, e.examination_date, e.treatment_description,
        e.sick_leave_days, e.sick_leave_start_date, e.patient_id, e.doctor_id,
        e.diagnosis_id, e.is_deleted,
        p.id, p.first_name, p.last_name, p.is_health_insurance_paid, p.personal_doctor_id, p.is_deleted,
        d.id, d.first_name, d.last_name, d.specialty, d.is_deleted,
        g.id, g.description, g.is_deleted
 FROM examinations e
 JOIN patients p ON p.id = e.patient_id
 JOIN doctors d ON d.id = e.doctor_id
 JOIN diagnoses g ON g.id = e.diagnosis_id";

fn detail_from_row(row: &Row<'_>) -> rusqlite::Result<ExaminationDetail> {
    Ok(ExaminationDetail {
        examination: examination_from_row(row, 0)?,
        patient: patient_from_row(row, 9)?,
        doctor: doctor_from_row(row, 15)?,
        diagnosis: diagnosis_from_row(row, 20)?,
    })
}

pub fn insert_examination(conn: &Connection, exam: &ExaminationData) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO examinations (examination_date, treatment_description, sick_leave_days,
         sick_leave_start_date, patient_id, doctor_id, diagnosis_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            exam.examination_date,
            exam.treatment_description,
            exam.sick_leave_days,
            exam.sick_leave_start_date,
            exam.patient_id,
            exam.doctor_id,
            exam.diagnosis_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Delete-blind lookup.
pub fn get_examination(conn: &Connection, id: i64) -> Result<Option<Examination>, DatabaseError> {
    conn.query_row(
        &format!("{EXAMINATION_SELECT} WHERE e.id = ?1"),
        params![id],
        |row| examination_from_row(row, 0),
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn get_active_examination(
    conn: &Connection,
    id: i64,
) -> Result<Option<Examination>, DatabaseError> {
    conn.query_row(
        &format!("{EXAMINATION_SELECT} WHERE e.id = ?1 AND e.is_deleted = 0"),
        params![id],
        |row| examination_from_row(row, 0),
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn get_active_examination_detail(
    conn: &Connection,
    id: i64,
) -> Result<Option<ExaminationDetail>, DatabaseError> {
    conn.query_row(
        &format!("{DETAIL_SELECT} WHERE e.id = ?1 AND e.is_deleted = 0"),
        params![id],
        detail_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_active_examination_details(
    conn: &Connection,
) -> Result<Vec<ExaminationDetail>, DatabaseError> {
    query_details(
        conn,
        &format!("{DETAIL_SELECT} WHERE e.is_deleted = 0 ORDER BY e.id"),
        params![],
    )
}

/// Active examinations by `doctor_id` dated within `[start, end]`.
pub fn list_active_examination_details_by_doctor_between(
    conn: &Connection,
    doctor_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ExaminationDetail>, DatabaseError> {
    query_details(
        conn,
        &format!(
            "{DETAIL_SELECT}
             WHERE e.doctor_id = ?1 AND e.examination_date BETWEEN ?2 AND ?3 AND e.is_deleted = 0
             ORDER BY e.examination_date, e.id"
        ),
        params![doctor_id, start, end],
    )
}

pub fn list_active_examination_details_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<ExaminationDetail>, DatabaseError> {
    query_details(
        conn,
        &format!(
            "{DETAIL_SELECT} WHERE e.patient_id = ?1 AND e.is_deleted = 0
             ORDER BY e.examination_date, e.id"
        ),
        params![patient_id],
    )
}

pub fn update_examination(
    conn: &Connection,
    id: i64,
    exam: &ExaminationData,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE examinations
         SET examination_date = ?1, treatment_description = ?2, sick_leave_days = ?3,
             sick_leave_start_date = ?4, patient_id = ?5, doctor_id = ?6, diagnosis_id = ?7
         WHERE id = ?8",
        params![
            exam.examination_date,
            exam.treatment_description,
            exam.sick_leave_days,
            exam.sick_leave_start_date,
            exam.patient_id,
            exam.doctor_id,
            exam.diagnosis_id,
            id,
        ],
    )?;
    Ok(())
}

/// Active examination count per active doctor, in doctor id order.
/// Doctors without active examinations do not appear.
pub fn examination_counts_by_doctor(conn: &Connection) -> Result<Vec<DoctorCount>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT d.id, d.first_name, d.last_name, d.specialty, d.is_deleted, COUNT(e.id)
         FROM examinations e
         JOIN doctors d ON d.id = e.doctor_id
         WHERE e.is_deleted = 0 AND d.is_deleted = 0
         GROUP BY d.id
         ORDER BY d.id ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(DoctorCount {
            doctor: doctor_from_row(row, 0)?,
            count: row.get(5)?,
        })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

fn query_details(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<ExaminationDetail>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, detail_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{
        insert_diagnosis, insert_doctor, insert_patient, soft_delete, SoftDeleteTable,
    };
    use crate::db::sqlite::open_memory_database;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn doctor(conn: &Connection, last: &str) -> i64 {
        insert_doctor(
            conn,
            &DoctorData {
                first_name: "Robert".into(),
                last_name: last.into(),
                specialty: "Immunology".into(),
            },
        )
        .unwrap()
    }

    fn patient(conn: &Connection) -> i64 {
        insert_patient(
            conn,
            &PatientData {
                first_name: "John".into(),
                last_name: "Doe".into(),
                health_insurance_paid: true,
                personal_doctor_id: None,
            },
        )
        .unwrap()
    }

    fn exam_on(patient_id: i64, doctor_id: i64, diagnosis_id: i64, on: NaiveDate) -> ExaminationData {
        ExaminationData {
            examination_date: on,
            treatment_description: "Antivirals".into(),
            sick_leave_days: 5,
            sick_leave_start_date: on,
            patient_id,
            doctor_id,
            diagnosis_id,
        }
    }

    #[test]
    fn detail_joins_all_references() {
        let conn = open_memory_database().unwrap();
        let doc = doctor(&conn, "Chase");
        let pat = patient(&conn);
        let flu = insert_diagnosis(&conn, "Flu").unwrap();
        let id = insert_examination(&conn, &exam_on(pat, doc, flu, date(2025, 1, 10))).unwrap();

        let detail = get_active_examination_detail(&conn, id).unwrap().unwrap();
        assert_eq!(detail.examination.examination_date, date(2025, 1, 10));
        assert_eq!(detail.examination.sick_leave_days, 5);
        assert_eq!(detail.patient.id, pat);
        assert_eq!(detail.doctor.last_name, "Chase");
        assert_eq!(detail.diagnosis.description, "Flu");
    }

    #[test]
    fn deleted_examination_is_hidden_from_detail_and_list() {
        let conn = open_memory_database().unwrap();
        let doc = doctor(&conn, "Chase");
        let pat = patient(&conn);
        let flu = insert_diagnosis(&conn, "Flu").unwrap();
        let id = insert_examination(&conn, &exam_on(pat, doc, flu, date(2025, 1, 10))).unwrap();
        soft_delete(&conn, SoftDeleteTable::Examinations, id).unwrap();

        assert!(get_active_examination_detail(&conn, id).unwrap().is_none());
        assert!(list_active_examination_details(&conn).unwrap().is_empty());
        assert!(get_examination(&conn, id).unwrap().unwrap().deleted);
    }

    #[test]
    fn by_doctor_between_is_inclusive() {
        let conn = open_memory_database().unwrap();
        let chase = doctor(&conn, "Chase");
        let taub = doctor(&conn, "Taub");
        let pat = patient(&conn);
        let flu = insert_diagnosis(&conn, "Flu").unwrap();

        let first = insert_examination(&conn, &exam_on(pat, chase, flu, date(2025, 1, 1))).unwrap();
        let last = insert_examination(&conn, &exam_on(pat, chase, flu, date(2025, 1, 31))).unwrap();
        insert_examination(&conn, &exam_on(pat, chase, flu, date(2025, 2, 1))).unwrap();
        insert_examination(&conn, &exam_on(pat, taub, flu, date(2025, 1, 15))).unwrap();

        let ids: Vec<i64> = list_active_examination_details_by_doctor_between(
            &conn,
            chase,
            date(2025, 1, 1),
            date(2025, 1, 31),
        )
        .unwrap()
        .iter()
        .map(|d| d.examination.id)
        .collect();
        assert_eq!(ids, vec![first, last]);
    }

    #[test]
    fn counts_exclude_deleted_examinations_and_doctors() {
        let conn = open_memory_database().unwrap();
        let chase = doctor(&conn, "Chase");
        let taub = doctor(&conn, "Taub");
        let kutner = doctor(&conn, "Kutner");
        let pat = patient(&conn);
        let flu = insert_diagnosis(&conn, "Flu").unwrap();
        let on = date(2025, 4, 4);

        insert_examination(&conn, &exam_on(pat, chase, flu, on)).unwrap();
        insert_examination(&conn, &exam_on(pat, chase, flu, on)).unwrap();
        // Taub's only examination is deleted
        let t = insert_examination(&conn, &exam_on(pat, taub, flu, on)).unwrap();
        soft_delete(&conn, SoftDeleteTable::Examinations, t).unwrap();
        // Kutner is deleted but his examination is not
        insert_examination(&conn, &exam_on(pat, kutner, flu, on)).unwrap();
        soft_delete(&conn, SoftDeleteTable::Doctors, kutner).unwrap();

        let counts = examination_counts_by_doctor(&conn).unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].doctor.id, chase);
        assert_eq!(counts[0].count, 2);
    }

    #[test]
    fn counts_are_in_doctor_id_order() {
        let conn = open_memory_database().unwrap();
        let a = doctor(&conn, "Alpha");
        let b = doctor(&conn, "Beta");
        let pat = patient(&conn);
        let flu = insert_diagnosis(&conn, "Flu").unwrap();
        let on = date(2025, 4, 4);
        insert_examination(&conn, &exam_on(pat, b, flu, on)).unwrap();
        insert_examination(&conn, &exam_on(pat, b, flu, on)).unwrap();
        insert_examination(&conn, &exam_on(pat, a, flu, on)).unwrap();

        let ids: Vec<i64> = examination_counts_by_doctor(&conn)
            .unwrap()
            .iter()
            .map(|c| c.doctor.id)
            .collect();
        assert_eq!(ids, vec![a, b]);
    }
}
