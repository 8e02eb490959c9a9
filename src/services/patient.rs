use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::doctor::DoctorResponse;
use super::examination::{self, ExaminationResponse};
use super::validation::ValidationErrors;
use super::{delete_row, found, resolve_diagnosis, resolve_doctor, ServiceError};
use crate::crypto::hash_password;
use crate::db::repository::{self as repo, SoftDeleteTable};
use crate::models::enums::{EntityKind, RoleName};
use crate::models::{Patient, PatientData, UserData};

#[derive(Debug, Clone, Deserialize)]
pub struct PatientRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub health_insurance_paid: bool,
    /// Absent or null clears the personal doctor on update.
    #[serde(default)]
    pub personal_doctor_id: Option<i64>,
}

impl PatientRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.name("first_name", &self.first_name);
        errors.name("last_name", &self.last_name);
        errors.into_result()
    }

    /// Resolve the personal doctor and build the row to persist.
    fn resolve(&self, conn: &Connection) -> Result<PatientData, ServiceError> {
        self.validate()?;
        let personal_doctor_id = match self.personal_doctor_id {
            Some(id) => Some(resolve_doctor(conn, id)?.id),
            None => None,
        };
        Ok(PatientData {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            health_insurance_paid: self.health_insurance_paid,
            personal_doctor_id,
        })
    }
}

/// Patient without its personal doctor, for nesting inside other responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub health_insurance_paid: bool,
}

impl From<Patient> for PatientSummary {
    fn from(p: Patient) -> Self {
        Self {
            id: p.id,
            first_name: p.first_name,
            last_name: p.last_name,
            health_insurance_paid: p.health_insurance_paid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub health_insurance_paid: bool,
    pub personal_doctor: Option<DoctorResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientWithExaminations {
    pub patient: PatientSummary,
    pub examinations: Vec<ExaminationResponse>,
}

/// A deleted personal doctor is shown as absent.
fn to_response(conn: &Connection, p: Patient) -> Result<PatientResponse, ServiceError> {
    let personal_doctor = match p.personal_doctor_id {
        Some(id) => repo::get_active_doctor(conn, id)?.map(DoctorResponse::from),
        None => None,
    };
    Ok(PatientResponse {
        id: p.id,
        first_name: p.first_name,
        last_name: p.last_name,
        health_insurance_paid: p.health_insurance_paid,
        personal_doctor,
    })
}

fn to_responses(
    conn: &Connection,
    patients: Vec<Patient>,
) -> Result<Vec<PatientResponse>, ServiceError> {
    patients.into_iter().map(|p| to_response(conn, p)).collect()
}

fn taken(username: &str) -> ServiceError {
    ServiceError::AlreadyExists(format!("Username '{username}' is already taken"))
}

fn username_taken(err: crate::db::DatabaseError, username: &str) -> ServiceError {
    if err.is_unique_violation() {
        taken(username)
    } else {
        err.into()
    }
}

/// Create a patient and its PATIENT login, named `"<first> <last>"`.
///
/// Both rows are written in one transaction.
pub fn create_patient(
    conn: &Connection,
    req: &PatientRequest,
    initial_password: &str,
) -> Result<PatientResponse, ServiceError> {
    let data = req.resolve(conn)?;
    let username = format!("{} {}", data.first_name, data.last_name);
    if repo::find_user_by_username(conn, &username)?.is_some() {
        return Err(taken(&username));
    }
    let role = repo::find_role_by_authority(conn, RoleName::Patient.as_str())?
        .filter(|r| !r.deleted)
        .ok_or_else(|| ServiceError::Conflict(format!("{} role is not available", RoleName::Patient)))?;

    let tx = conn.unchecked_transaction()?;
    let id = repo::insert_patient(&tx, &data)?;
    let user_id = repo::insert_user(
        &tx,
        &UserData {
            username: username.clone(),
            password_hash: hash_password(initial_password),
            enabled: true,
            doctor_id: None,
            patient_id: Some(id),
        },
    )
    .map_err(|e| username_taken(e, &username))?;
    repo::replace_user_roles(&tx, user_id, &[role.id])?;
    tx.commit()?;

    tracing::info!(patient_id = id, user_id, "patient created");
    get_patient(conn, id)
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<PatientResponse, ServiceError> {
    let patient = found(repo::get_active_patient(conn, id)?, EntityKind::Patient, id)?;
    to_response(conn, patient)
}

pub fn list_patients(conn: &Connection) -> Result<Vec<PatientResponse>, ServiceError> {
    to_responses(conn, repo::list_active_patients(conn)?)
}

/// Replace every field. A missing `personal_doctor_id` clears the link.
pub fn update_patient(
    conn: &Connection,
    id: i64,
    req: &PatientRequest,
) -> Result<PatientResponse, ServiceError> {
    found(repo::get_active_patient(conn, id)?, EntityKind::Patient, id)?;
    let data = req.resolve(conn)?;
    repo::update_patient(conn, id, &data)?;
    tracing::info!(patient_id = id, "patient updated");
    get_patient(conn, id)
}

pub fn delete_patient(conn: &Connection, id: i64) -> Result<(), ServiceError> {
    delete_row(conn, SoftDeleteTable::Patients, EntityKind::Patient, id)
}

/// Patients with at least one active examination carrying `diagnosis_id`.
pub fn patients_by_diagnosis(
    conn: &Connection,
    diagnosis_id: i64,
) -> Result<Vec<PatientResponse>, ServiceError> {
    resolve_diagnosis(conn, diagnosis_id)?;
    to_responses(conn, repo::list_active_patients_with_diagnosis(conn, diagnosis_id)?)
}

pub fn patients_by_personal_doctor(
    conn: &Connection,
    doctor_id: i64,
) -> Result<Vec<PatientResponse>, ServiceError> {
    resolve_doctor(conn, doctor_id)?;
    to_responses(conn, repo::list_active_patients_by_personal_doctor(conn, doctor_id)?)
}

pub fn patients_with_examinations(
    conn: &Connection,
) -> Result<Vec<PatientWithExaminations>, ServiceError> {
    repo::list_active_patients(conn)?
        .into_iter()
        .map(|patient| -> Result<PatientWithExaminations, ServiceError> {
            let examinations = examination::examinations_for_patient(conn, patient.id)?;
            Ok(PatientWithExaminations {
                patient: patient.into(),
                examinations,
            })
        })
        .collect()
}
