use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::diagnosis::DiagnosisResponse;
use super::doctor::DoctorResponse;
use super::patient::PatientSummary;
use super::validation::ValidationErrors;
use super::{
    delete_row, found, resolve_diagnosis, resolve_doctor, resolve_patient, ServiceError,
};
use crate::authorization::{self, Caller};
use crate::db::repository::{self as repo, SoftDeleteTable};
use crate::models::enums::EntityKind;
use crate::models::{ExaminationData, ExaminationDetail};

#[derive(Debug, Clone, Deserialize)]
pub struct ExaminationRequest {
    pub examination_date: NaiveDate,
    pub treatment_description: String,
    pub sick_leave_days: i64,
    pub sick_leave_start_date: NaiveDate,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub diagnosis_id: i64,
}

/// Edit payload. The patient is kept, but still re-resolved on save.
#[derive(Debug, Clone, Deserialize)]
pub struct ExaminationEditRequest {
    pub examination_date: NaiveDate,
    pub treatment_description: String,
    pub sick_leave_days: i64,
    pub sick_leave_start_date: NaiveDate,
    pub doctor_id: i64,
    pub diagnosis_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExaminationResponse {
    pub id: i64,
    pub examination_date: NaiveDate,
    pub treatment_description: String,
    pub sick_leave_days: u32,
    pub sick_leave_start_date: NaiveDate,
    pub patient: PatientSummary,
    pub doctor: DoctorResponse,
    pub diagnosis: DiagnosisResponse,
}

impl From<ExaminationDetail> for ExaminationResponse {
    fn from(d: ExaminationDetail) -> Self {
        Self {
            id: d.examination.id,
            examination_date: d.examination.examination_date,
            treatment_description: d.examination.treatment_description,
            sick_leave_days: d.examination.sick_leave_days,
            sick_leave_start_date: d.examination.sick_leave_start_date,
            patient: d.patient.into(),
            doctor: d.doctor.into(),
            diagnosis: d.diagnosis.into(),
        }
    }
}

fn validate_fields(treatment: &str, sick_leave_days: i64) -> Result<u32, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.not_blank("treatment_description", treatment);
    errors.non_negative("sick_leave_days", sick_leave_days);
    let days = u32::try_from(sick_leave_days).unwrap_or_default();
    if sick_leave_days > i64::from(u32::MAX) {
        errors.add("sick_leave_days", "is too large");
    }
    errors.into_result()?;
    Ok(days)
}

pub fn create_examination(
    conn: &Connection,
    req: &ExaminationRequest,
) -> Result<ExaminationResponse, ServiceError> {
    let sick_leave_days = validate_fields(&req.treatment_description, req.sick_leave_days)?;
    let patient = resolve_patient(conn, req.patient_id)?;
    let doctor = resolve_doctor(conn, req.doctor_id)?;
    let diagnosis = resolve_diagnosis(conn, req.diagnosis_id)?;

    let id = repo::insert_examination(
        conn,
        &ExaminationData {
            examination_date: req.examination_date,
            treatment_description: req.treatment_description.clone(),
            sick_leave_days,
            sick_leave_start_date: req.sick_leave_start_date,
            patient_id: patient.id,
            doctor_id: doctor.id,
            diagnosis_id: diagnosis.id,
        },
    )?;
    tracing::info!(
        examination_id = id,
        patient_id = patient.id,
        doctor_id = doctor.id,
        "examination created"
    );
    get_examination(conn, id)
}

pub fn get_examination(conn: &Connection, id: i64) -> Result<ExaminationResponse, ServiceError> {
    found(
        repo::get_active_examination_detail(conn, id)?,
        EntityKind::Examination,
        id,
    )
    .map(ExaminationResponse::from)
}

pub fn list_examinations(conn: &Connection) -> Result<Vec<ExaminationResponse>, ServiceError> {
    Ok(repo::list_active_examination_details(conn)?
        .into_iter()
        .map(ExaminationResponse::from)
        .collect())
}

/// Replace the editable fields and re-resolve all three references,
/// including the stored patient.
pub fn update_examination(
    conn: &Connection,
    id: i64,
    req: &ExaminationEditRequest,
) -> Result<ExaminationResponse, ServiceError> {
    let sick_leave_days = validate_fields(&req.treatment_description, req.sick_leave_days)?;
    let current = found(repo::get_active_examination(conn, id)?, EntityKind::Examination, id)?;
    let patient = resolve_patient(conn, current.patient_id)?;
    let doctor = resolve_doctor(conn, req.doctor_id)?;
    let diagnosis = resolve_diagnosis(conn, req.diagnosis_id)?;

    repo::update_examination(
        conn,
        id,
        &ExaminationData {
            examination_date: req.examination_date,
            treatment_description: req.treatment_description.clone(),
            sick_leave_days,
            sick_leave_start_date: req.sick_leave_start_date,
            patient_id: patient.id,
            doctor_id: doctor.id,
            diagnosis_id: diagnosis.id,
        },
    )?;
    tracing::info!(examination_id = id, "examination updated");
    get_examination(conn, id)
}

pub fn delete_examination(conn: &Connection, id: i64) -> Result<(), ServiceError> {
    delete_row(conn, SoftDeleteTable::Examinations, EntityKind::Examination, id)
}

/// Examinations by one doctor dated within `[start, end]`.
pub fn examinations_by_doctor_between(
    conn: &Connection,
    doctor_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ExaminationResponse>, ServiceError> {
    let mut errors = ValidationErrors::new();
    errors.date_order("end", start, end, "must not be before start");
    errors.into_result()?;
    resolve_doctor(conn, doctor_id)?;
    Ok(
        repo::list_active_examination_details_by_doctor_between(conn, doctor_id, start, end)?
            .into_iter()
            .map(ExaminationResponse::from)
            .collect(),
    )
}

pub fn examinations_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<ExaminationResponse>, ServiceError> {
    Ok(repo::list_active_examination_details_for_patient(conn, patient_id)?
        .into_iter()
        .map(ExaminationResponse::from)
        .collect())
}

/// Examinations of the patient linked to a PATIENT caller.
pub fn my_examinations(
    conn: &Connection,
    caller: &Caller,
) -> Result<Vec<ExaminationResponse>, ServiceError> {
    let patient_id = authorization::own_patient_id(caller)?;
    resolve_patient(conn, patient_id)?;
    examinations_for_patient(conn, patient_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::RoleName;
    use crate::services::diagnosis::delete_diagnosis;
    use crate::services::doctor::delete_doctor;
    use crate::services::fixtures::{self, date};
    use crate::services::patient::delete_patient;

    struct Clinic {
        conn: Connection,
        house: i64,
        john: i64,
        flu: i64,
    }

    fn clinic() -> Clinic {
        let conn = open_memory_database().unwrap();
        let house = fixtures::house(&conn);
        let john = fixtures::patient(&conn, "John", "Doe", Some(house));
        let flu = fixtures::diagnosis(&conn, "Flu");
        Clinic {
            conn,
            house,
            john,
            flu,
        }
    }

    fn request(c: &Clinic, on: NaiveDate) -> ExaminationRequest {
        ExaminationRequest {
            examination_date: on,
            treatment_description: "Rest and fluids".into(),
            sick_leave_days: 3,
            sick_leave_start_date: on,
            patient_id: c.john,
            doctor_id: c.house,
            diagnosis_id: c.flu,
        }
    }

    fn edit(doctor_id: i64, diagnosis_id: i64) -> ExaminationEditRequest {
        ExaminationEditRequest {
            examination_date: date(2025, 3, 2),
            treatment_description: "Antivirals".into(),
            sick_leave_days: 5,
            sick_leave_start_date: date(2025, 3, 2),
            doctor_id,
            diagnosis_id,
        }
    }

    #[test]
    fn house_examines_john_for_flu() {
        let c = clinic();
        create_examination(&c.conn, &request(&c, date(2025, 3, 1))).unwrap();

        let all = list_examinations(&c.conn).unwrap();
        assert_eq!(all.len(), 1);
        let exam = &all[0];
        assert_eq!(exam.doctor.last_name, "House");
        assert_eq!(exam.doctor.specialty, "Diagnostics");
        assert_eq!(exam.patient.first_name, "John");
        assert_eq!(exam.patient.last_name, "Doe");
        assert_eq!(exam.diagnosis.description, "Flu");
        assert_eq!(exam.sick_leave_days, 3);
    }

    #[test]
    fn deleted_diagnosis_is_rejected_without_writing() {
        let c = clinic();
        delete_diagnosis(&c.conn, c.flu).unwrap();
        let err = create_examination(&c.conn, &request(&c, date(2025, 3, 1))).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound { entity: EntityKind::Diagnosis, .. }
        ));
        assert!(list_examinations(&c.conn).unwrap().is_empty());
    }

    #[test]
    fn negative_sick_leave_is_invalid() {
        let c = clinic();
        let mut req = request(&c, date(2025, 3, 1));
        req.sick_leave_days = -2;
        assert!(matches!(
            create_examination(&c.conn, &req),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn update_replaces_doctor_and_diagnosis() {
        let c = clinic();
        let id = create_examination(&c.conn, &request(&c, date(2025, 3, 1))).unwrap().id;
        let wilson = fixtures::doctor(&c.conn, "James", "Wilson", "Oncology");
        let cold = fixtures::diagnosis(&c.conn, "Cold");

        let updated = update_examination(&c.conn, id, &edit(wilson, cold)).unwrap();
        assert_eq!(updated.doctor.id, wilson);
        assert_eq!(updated.diagnosis.description, "Cold");
        assert_eq!(updated.patient.id, c.john);
        assert_eq!(updated.treatment_description, "Antivirals");
    }

    #[test]
    fn update_fails_once_the_patient_is_deleted() {
        let c = clinic();
        let id = create_examination(&c.conn, &request(&c, date(2025, 3, 1))).unwrap().id;
        delete_patient(&c.conn, c.john).unwrap();

        let err = update_examination(&c.conn, id, &edit(c.house, c.flu)).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound { entity: EntityKind::Patient, id } if id == c.john
        ));
    }

    #[test]
    fn delete_then_get_is_not_found() {
        let c = clinic();
        let id = create_examination(&c.conn, &request(&c, date(2025, 3, 1))).unwrap().id;
        delete_examination(&c.conn, id).unwrap();
        assert!(matches!(
            get_examination(&c.conn, id),
            Err(ServiceError::NotFound { .. })
        ));
        assert!(repo::get_examination(&c.conn, id).unwrap().unwrap().deleted);
    }

    #[test]
    fn by_doctor_between_rejects_inverted_range() {
        let c = clinic();
        let err =
            examinations_by_doctor_between(&c.conn, c.house, date(2025, 2, 1), date(2025, 1, 1))
                .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn by_doctor_between_requires_active_doctor() {
        let c = clinic();
        create_examination(&c.conn, &request(&c, date(2025, 3, 1))).unwrap();
        let found =
            examinations_by_doctor_between(&c.conn, c.house, date(2025, 3, 1), date(2025, 3, 1))
                .unwrap();
        assert_eq!(found.len(), 1);

        delete_doctor(&c.conn, c.house).unwrap();
        assert!(examinations_by_doctor_between(
            &c.conn,
            c.house,
            date(2025, 3, 1),
            date(2025, 3, 1)
        )
        .is_err());
    }

    #[test]
    fn patient_sees_only_own_examinations() {
        let c = clinic();
        let jane = fixtures::patient(&c.conn, "Jane", "Roe", None);
        create_examination(&c.conn, &request(&c, date(2025, 3, 1))).unwrap();
        let mut other = request(&c, date(2025, 3, 2));
        other.patient_id = jane;
        create_examination(&c.conn, &other).unwrap();

        let caller = Caller {
            user_id: 9,
            username: "John Doe".into(),
            roles: vec![RoleName::Patient],
            doctor_id: None,
            patient_id: Some(c.john),
        };
        let mine = my_examinations(&c.conn, &caller).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].patient.id, c.john);
    }

    #[test]
    fn doctor_has_no_own_examinations() {
        let c = clinic();
        let caller = Caller {
            user_id: 2,
            username: "house".into(),
            roles: vec![RoleName::Doctor],
            doctor_id: Some(c.house),
            patient_id: None,
        };
        assert!(matches!(
            my_examinations(&c.conn, &caller),
            Err(ServiceError::Forbidden(_))
        ));
    }
}
