use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub authority: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub enabled: bool,
    pub doctor_id: Option<i64>,
    pub patient_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserData {
    pub username: String,
    pub password_hash: String,
    pub enabled: bool,
    pub doctor_id: Option<i64>,
    pub patient_id: Option<i64>,
}
