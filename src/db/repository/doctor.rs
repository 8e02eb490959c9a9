use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

/// Map a doctor from `row` starting at column `start`
/// (`id, first_name, last_name, specialty, is_deleted`).
pub(crate) fn doctor_from_row(row: &Row<'_>, start: usize) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(start)?,
        first_name: row.get(start + 1)?,
        last_name: row.get(start + 2)?,
        specialty: row.get(start + 3)?,
        deleted: row.get(start + 4)?,
    })
}

pub fn insert_doctor(conn: &Connection, doctor: &DoctorData) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (first_name, last_name, specialty) VALUES (?1, ?2, ?3)",
        params![doctor.first_name, doctor.last_name, doctor.specialty],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Delete-blind lookup.
pub fn get_doctor(conn: &Connection, id: i64) -> Result<Option<Doctor>, DatabaseError> {
    conn.query_row(
        "SELECT id, first_name, last_name, specialty, is_deleted FROM doctors WHERE id = ?1",
        params![id],
        |row| doctor_from_row(row, 0),
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn get_active_doctor(conn: &Connection, id: i64) -> Result<Option<Doctor>, DatabaseError> {
    conn.query_row(
        "SELECT id, first_name, last_name, specialty, is_deleted
         FROM doctors WHERE id = ?1 AND is_deleted = 0",
        params![id],
        |row| doctor_from_row(row, 0),
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_active_doctors(conn: &Connection) -> Result<Vec<Doctor>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, specialty, is_deleted
         FROM doctors WHERE is_deleted = 0 ORDER BY id",
    )?;
    let rows = stmt.query_map([], |row| doctor_from_row(row, 0))?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn update_doctor(conn: &Connection, id: i64, doctor: &DoctorData) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE doctors SET first_name = ?1, last_name = ?2, specialty = ?3 WHERE id = ?4",
        params![doctor.first_name, doctor.last_name, doctor.specialty, id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{soft_delete, SoftDeleteTable};
    use crate::db::sqlite::open_memory_database;

    fn doctor(last: &str) -> DoctorData {
        DoctorData {
            first_name: "Test".into(),
            last_name: last.into(),
            specialty: "Surgery".into(),
        }
    }

    #[test]
    fn insert_assigns_increasing_ids() {
        let conn = open_memory_database().unwrap();
        let a = insert_doctor(&conn, &doctor("Alpha")).unwrap();
        let b = insert_doctor(&conn, &doctor("Beta")).unwrap();
        assert!(b > a);
        assert!(!get_doctor(&conn, a).unwrap().unwrap().deleted);
    }

    #[test]
    fn list_active_skips_deleted_and_orders_by_id() {
        let conn = open_memory_database().unwrap();
        let a = insert_doctor(&conn, &doctor("Alpha")).unwrap();
        let b = insert_doctor(&conn, &doctor("Beta")).unwrap();
        let c = insert_doctor(&conn, &doctor("Gamma")).unwrap();
        soft_delete(&conn, SoftDeleteTable::Doctors, b).unwrap();

        let ids: Vec<i64> = list_active_doctors(&conn).unwrap().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn update_replaces_all_fields() {
        let conn = open_memory_database().unwrap();
        let id = insert_doctor(&conn, &doctor("Alpha")).unwrap();
        update_doctor(
            &conn,
            id,
            &DoctorData {
                first_name: "James".into(),
                last_name: "Wilson".into(),
                specialty: "Oncology".into(),
            },
        )
        .unwrap();

        let stored = get_active_doctor(&conn, id).unwrap().unwrap();
        assert_eq!(stored.first_name, "James");
        assert_eq!(stored.last_name, "Wilson");
        assert_eq!(stored.specialty, "Oncology");
    }

    #[test]
    fn missing_doctor_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_doctor(&conn, 42).unwrap().is_none());
        assert!(get_active_doctor(&conn, 42).unwrap().is_none());
    }
}
