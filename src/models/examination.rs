use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Diagnosis, Doctor, Patient};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Examination {
    pub id: i64,
    pub examination_date: NaiveDate,
    pub treatment_description: String,
    pub sick_leave_days: u32,
    pub sick_leave_start_date: NaiveDate,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub diagnosis_id: i64,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExaminationData {
    pub examination_date: NaiveDate,
    pub treatment_description: String,
    pub sick_leave_days: u32,
    pub sick_leave_start_date: NaiveDate,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub diagnosis_id: i64,
}

/// Examination joined with the rows it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExaminationDetail {
    pub examination: Examination,
    pub patient: Patient,
    pub doctor: Doctor,
    pub diagnosis: Diagnosis,
}
