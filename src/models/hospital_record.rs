use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Doctor, Patient};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HospitalRecord {
    pub id: i64,
    pub admission_date: NaiveDate,
    pub discharge_date: NaiveDate,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HospitalRecordData {
    pub admission_date: NaiveDate,
    pub discharge_date: NaiveDate,
    pub patient_id: i64,
    pub doctor_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HospitalRecordDetail {
    pub record: HospitalRecord,
    pub patient: Patient,
    pub doctor: Doctor,
}
