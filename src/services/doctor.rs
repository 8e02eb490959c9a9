use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::patient::PatientSummary;
use super::validation::ValidationErrors;
use super::{delete_row, found, ServiceError};
use crate::db::repository::{self as repo, SoftDeleteTable};
use crate::models::enums::EntityKind;
use crate::models::{Doctor, DoctorData};

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorRequest {
    pub first_name: String,
    pub last_name: String,
    pub specialty: String,
}

impl DoctorRequest {
    fn validate(&self) -> Result<DoctorData, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.name("first_name", &self.first_name);
        errors.name("last_name", &self.last_name);
        errors.name("specialty", &self.specialty);
        errors.into_result()?;
        Ok(DoctorData {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            specialty: self.specialty.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub specialty: String,
}

impl From<Doctor> for DoctorResponse {
    fn from(d: Doctor) -> Self {
        Self {
            id: d.id,
            first_name: d.first_name,
            last_name: d.last_name,
            specialty: d.specialty,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorWithPatients {
    pub doctor: DoctorResponse,
    pub patients: Vec<PatientSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorExaminationCount {
    pub doctor: DoctorResponse,
    pub examination_count: i64,
}

pub fn create_doctor(conn: &Connection, req: &DoctorRequest) -> Result<DoctorResponse, ServiceError> {
    let data = req.validate()?;
    let id = repo::insert_doctor(conn, &data)?;
    tracing::info!(doctor_id = id, "doctor created");
    get_doctor(conn, id)
}

pub fn get_doctor(conn: &Connection, id: i64) -> Result<DoctorResponse, ServiceError> {
    found(repo::get_active_doctor(conn, id)?, EntityKind::Doctor, id).map(DoctorResponse::from)
}

pub fn list_doctors(conn: &Connection) -> Result<Vec<DoctorResponse>, ServiceError> {
    Ok(repo::list_active_doctors(conn)?
        .into_iter()
        .map(DoctorResponse::from)
        .collect())
}

pub fn update_doctor(
    conn: &Connection,
    id: i64,
    req: &DoctorRequest,
) -> Result<DoctorResponse, ServiceError> {
    let data = req.validate()?;
    found(repo::get_active_doctor(conn, id)?, EntityKind::Doctor, id)?;
    repo::update_doctor(conn, id, &data)?;
    tracing::info!(doctor_id = id, "doctor updated");
    get_doctor(conn, id)
}

pub fn delete_doctor(conn: &Connection, id: i64) -> Result<(), ServiceError> {
    delete_row(conn, SoftDeleteTable::Doctors, EntityKind::Doctor, id)
}

/// Every active doctor with the active patients registered to them.
pub fn doctors_with_patients(conn: &Connection) -> Result<Vec<DoctorWithPatients>, ServiceError> {
    repo::list_active_doctors(conn)?
        .into_iter()
        .map(|doctor| -> Result<DoctorWithPatients, ServiceError> {
            let patients = repo::list_active_patients_by_personal_doctor(conn, doctor.id)?
                .into_iter()
                .map(PatientSummary::from)
                .collect();
            Ok(DoctorWithPatients {
                doctor: doctor.into(),
                patients,
            })
        })
        .collect()
}

pub fn examination_counts(conn: &Connection) -> Result<Vec<DoctorExaminationCount>, ServiceError> {
    Ok(repo::examination_counts_by_doctor(conn)?
        .into_iter()
        .map(|c| DoctorExaminationCount {
            doctor: c.doctor.into(),
            examination_count: c.count,
        })
        .collect())
}
