use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub specialty: String,
    pub deleted: bool,
}

/// Mutable doctor fields, written on insert and fully replaced on update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorData {
    pub first_name: String,
    pub last_name: String,
    pub specialty: String,
}
