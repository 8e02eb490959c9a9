use super::{Diagnosis, Doctor};

/// One row of the most-common-diagnoses report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosisCount {
    pub diagnosis: Diagnosis,
    pub count: i64,
}

/// A doctor and the number of rows attributed to them in a grouped query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorCount {
    pub doctor: Doctor,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCount {
    pub month: u32,
    pub count: i64,
}
