use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub health_insurance_paid: bool,
    pub personal_doctor_id: Option<i64>,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientData {
    pub first_name: String,
    pub last_name: String,
    pub health_insurance_paid: bool,
    pub personal_doctor_id: Option<i64>,
}
