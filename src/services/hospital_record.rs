use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::doctor::DoctorResponse;
use super::patient::PatientSummary;
use super::validation::ValidationErrors;
use super::{delete_row, found, resolve_doctor, resolve_patient, ServiceError};
use crate::db::repository::{self as repo, SoftDeleteTable};
use crate::models::enums::EntityKind;
use crate::models::{HospitalRecordData, HospitalRecordDetail};

#[derive(Debug, Clone, Deserialize)]
pub struct HospitalRecordRequest {
    pub admission_date: NaiveDate,
    pub discharge_date: NaiveDate,
    pub patient_id: i64,
    pub doctor_id: i64,
}

/// Edit payload. The patient is kept, but still re-resolved on save.
#[derive(Debug, Clone, Deserialize)]
pub struct HospitalRecordEditRequest {
    pub admission_date: NaiveDate,
    pub discharge_date: NaiveDate,
    pub doctor_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HospitalRecordResponse {
    pub id: i64,
    pub admission_date: NaiveDate,
    pub discharge_date: NaiveDate,
    pub patient: PatientSummary,
    pub doctor: DoctorResponse,
}

impl From<HospitalRecordDetail> for HospitalRecordResponse {
    fn from(d: HospitalRecordDetail) -> Self {
        Self {
            id: d.record.id,
            admission_date: d.record.admission_date,
            discharge_date: d.record.discharge_date,
            patient: d.patient.into(),
            doctor: d.doctor.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthWithHospitalRecords {
    pub year: i32,
    pub month: u32,
    pub record_count: i64,
    pub records: Vec<HospitalRecordResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorWithMostRecords {
    pub doctor_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub specialty: String,
    pub record_count: i64,
}

fn validate_stay(admission: NaiveDate, discharge: NaiveDate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.date_order(
        "discharge_date",
        admission,
        discharge,
        "must not be before admission_date",
    );
    errors.into_result()
}

pub fn create_hospital_record(
    conn: &Connection,
    req: &HospitalRecordRequest,
) -> Result<HospitalRecordResponse, ServiceError> {
    validate_stay(req.admission_date, req.discharge_date)?;
    let patient = resolve_patient(conn, req.patient_id)?;
    let doctor = resolve_doctor(conn, req.doctor_id)?;

    let id = repo::insert_hospital_record(
        conn,
        &HospitalRecordData {
            admission_date: req.admission_date,
            discharge_date: req.discharge_date,
            patient_id: patient.id,
            doctor_id: doctor.id,
        },
    )?;
    tracing::info!(hospital_record_id = id, patient_id = patient.id, "hospital record created");
    get_hospital_record(conn, id)
}

pub fn get_hospital_record(
    conn: &Connection,
    id: i64,
) -> Result<HospitalRecordResponse, ServiceError> {
    found(
        repo::get_active_hospital_record_detail(conn, id)?,
        EntityKind::HospitalRecord,
        id,
    )
    .map(HospitalRecordResponse::from)
}

pub fn list_hospital_records(
    conn: &Connection,
) -> Result<Vec<HospitalRecordResponse>, ServiceError> {
    Ok(repo::list_active_hospital_record_details(conn)?
        .into_iter()
        .map(HospitalRecordResponse::from)
        .collect())
}

pub fn update_hospital_record(
    conn: &Connection,
    id: i64,
    req: &HospitalRecordEditRequest,
) -> Result<HospitalRecordResponse, ServiceError> {
    validate_stay(req.admission_date, req.discharge_date)?;
    let current = found(
        repo::get_active_hospital_record(conn, id)?,
        EntityKind::HospitalRecord,
        id,
    )?;
    let patient = resolve_patient(conn, current.patient_id)?;
    let doctor = resolve_doctor(conn, req.doctor_id)?;

    repo::update_hospital_record(
        conn,
        id,
        &HospitalRecordData {
            admission_date: req.admission_date,
            discharge_date: req.discharge_date,
            patient_id: patient.id,
            doctor_id: doctor.id,
        },
    )?;
    tracing::info!(hospital_record_id = id, "hospital record updated");
    get_hospital_record(conn, id)
}

pub fn delete_hospital_record(conn: &Connection, id: i64) -> Result<(), ServiceError> {
    delete_row(conn, SoftDeleteTable::HospitalRecords, EntityKind::HospitalRecord, id)
}

/// Records admitted within `[start, end]`.
pub fn hospital_records_admitted_between(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<HospitalRecordResponse>, ServiceError> {
    let mut errors = ValidationErrors::new();
    errors.date_order("end", start, end, "must not be before start");
    errors.into_result()?;
    Ok(
        repo::list_active_hospital_record_details_admitted_between(conn, start, end)?
            .into_iter()
            .map(HospitalRecordResponse::from)
            .collect(),
    )
}

/// Month of `today`'s year with the most admissions, and its records.
pub fn month_with_most_hospital_records(
    conn: &Connection,
    today: NaiveDate,
) -> Result<MonthWithHospitalRecords, ServiceError> {
    let year = today.year();
    let busiest = repo::busiest_admission_month(conn, year)?.ok_or(ServiceError::NoHospitalRecords)?;
    let records = repo::list_active_hospital_record_details_in_month(conn, year, busiest.month)?
        .into_iter()
        .map(HospitalRecordResponse::from)
        .collect();
    Ok(MonthWithHospitalRecords {
        year,
        month: busiest.month,
        record_count: busiest.count,
        records,
    })
}

pub fn doctor_with_most_hospital_records(
    conn: &Connection,
) -> Result<DoctorWithMostRecords, ServiceError> {
    let top = repo::busiest_admitting_doctor(conn)?.ok_or(ServiceError::NoDoctorRecords)?;
    Ok(DoctorWithMostRecords {
        doctor_id: top.doctor.id,
        first_name: top.doctor.first_name,
        last_name: top.doctor.last_name,
        specialty: top.doctor.specialty,
        record_count: top.count,
    })
}
