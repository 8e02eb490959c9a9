use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::validation::ValidationErrors;
use super::{delete_row, found, ServiceError};
use crate::db::repository::{self as repo, SoftDeleteTable};
use crate::models::enums::EntityKind;
use crate::models::Diagnosis;

#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosisRequest {
    pub description: String,
}

impl DiagnosisRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.not_blank("description", &self.description);
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisResponse {
    pub id: i64,
    pub description: String,
}

impl From<Diagnosis> for DiagnosisResponse {
    fn from(d: Diagnosis) -> Self {
        Self {
            id: d.id,
            description: d.description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisFrequency {
    pub diagnosis: DiagnosisResponse,
    pub count: i64,
}

fn already_exists(description: &str) -> ServiceError {
    ServiceError::AlreadyExists(format!("Diagnosis '{description}' already exists"))
}

/// Reject a description held by any other row, deleted rows included.
fn ensure_unique(conn: &Connection, description: &str, own_id: Option<i64>) -> Result<(), ServiceError> {
    match repo::find_diagnosis_by_description(conn, description)? {
        Some(existing) if Some(existing.id) != own_id => Err(already_exists(description)),
        _ => Ok(()),
    }
}

pub fn create_diagnosis(
    conn: &Connection,
    req: &DiagnosisRequest,
) -> Result<DiagnosisResponse, ServiceError> {
    req.validate()?;
    ensure_unique(conn, &req.description, None)?;
    let id = repo::insert_diagnosis(conn, &req.description).map_err(|e| {
        if e.is_unique_violation() {
            already_exists(&req.description)
        } else {
            e.into()
        }
    })?;
    tracing::info!(diagnosis_id = id, "diagnosis created");
    get_diagnosis(conn, id)
}

pub fn get_diagnosis(conn: &Connection, id: i64) -> Result<DiagnosisResponse, ServiceError> {
    found(repo::get_active_diagnosis(conn, id)?, EntityKind::Diagnosis, id)
        .map(DiagnosisResponse::from)
}

pub fn list_diagnoses(conn: &Connection) -> Result<Vec<DiagnosisResponse>, ServiceError> {
    Ok(repo::list_active_diagnoses(conn)?
        .into_iter()
        .map(DiagnosisResponse::from)
        .collect())
}

pub fn update_diagnosis(
    conn: &Connection,
    id: i64,
    req: &DiagnosisRequest,
) -> Result<DiagnosisResponse, ServiceError> {
    req.validate()?;
    found(repo::get_active_diagnosis(conn, id)?, EntityKind::Diagnosis, id)?;
    ensure_unique(conn, &req.description, Some(id))?;
    repo::update_diagnosis(conn, id, &req.description).map_err(|e| {
        if e.is_unique_violation() {
            already_exists(&req.description)
        } else {
            e.into()
        }
    })?;
    tracing::info!(diagnosis_id = id, "diagnosis updated");
    get_diagnosis(conn, id)
}

pub fn delete_diagnosis(conn: &Connection, id: i64) -> Result<(), ServiceError> {
    delete_row(conn, SoftDeleteTable::Diagnoses, EntityKind::Diagnosis, id)
}

/// Diagnoses by active examination count, most frequent first.
pub fn most_common_diagnoses(conn: &Connection) -> Result<Vec<DiagnosisFrequency>, ServiceError> {
    Ok(repo::most_common_diagnoses(conn)?
        .into_iter()
        .map(|c| DiagnosisFrequency {
            diagnosis: c.diagnosis.into(),
            count: c.count,
        })
        .collect())
}
