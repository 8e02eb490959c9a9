//! Domain services over the repository layer.
//!
//! Every operation validates its inbound shape first, then resolves each
//! referenced doctor, patient or diagnosis against the active store before
//! writing. Handlers map a `ServiceError` straight to an HTTP status.

pub mod account;
pub mod diagnosis;
pub mod doctor;
pub mod examination;
pub mod hospital_record;
pub mod patient;
pub mod validation;

use rusqlite::Connection;

use crate::authorization::AuthorizationError;
use crate::crypto::CryptoError;
use crate::db::repository as repo;
use crate::db::DatabaseError;
use crate::models::enums::EntityKind;
use crate::models::{Diagnosis, Doctor, Patient};

pub use validation::{FieldError, ValidationErrors};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: i64 },

    #[error("{0}")]
    AlreadyExists(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{0}")]
    Conflict(String),

    #[error("No hospital records found for the current year.")]
    NoHospitalRecords,

    #[error("No doctor records found.")]
    NoDoctorRecords,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("Password hashing error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for ServiceError {
    fn from(err: rusqlite::Error) -> Self {
        ServiceError::Database(err.into())
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Validation(errors)
    }
}

impl From<AuthorizationError> for ServiceError {
    fn from(err: AuthorizationError) -> Self {
        ServiceError::Forbidden(err.to_string())
    }
}

// ═══════════════════════════════════════════════════════════
// Lookups and reference resolution
// ═══════════════════════════════════════════════════════════

/// Turn a missing row into `NotFound`.
pub(crate) fn found<T>(row: Option<T>, entity: EntityKind, id: i64) -> Result<T, ServiceError> {
    row.ok_or(ServiceError::NotFound { entity, id })
}

/// Like [`found`], for ids carried inside a mutation payload.
fn referenced<T>(row: Option<T>, entity: EntityKind, id: i64) -> Result<T, ServiceError> {
    if row.is_none() {
        tracing::warn!(entity = %entity, id, "rejected reference to missing or deleted row");
    }
    found(row, entity, id)
}

pub(crate) fn resolve_doctor(conn: &Connection, id: i64) -> Result<Doctor, ServiceError> {
    referenced(repo::get_active_doctor(conn, id)?, EntityKind::Doctor, id)
}

pub(crate) fn resolve_patient(conn: &Connection, id: i64) -> Result<Patient, ServiceError> {
    referenced(repo::get_active_patient(conn, id)?, EntityKind::Patient, id)
}

pub(crate) fn resolve_diagnosis(conn: &Connection, id: i64) -> Result<Diagnosis, ServiceError> {
    referenced(repo::get_active_diagnosis(conn, id)?, EntityKind::Diagnosis, id)
}

/// Soft-delete a row that may already be deleted. `NotFound` only when absent.
pub(crate) fn delete_row(
    conn: &Connection,
    table: repo::SoftDeleteTable,
    entity: EntityKind,
    id: i64,
) -> Result<(), ServiceError> {
    if !repo::soft_delete(conn, table, id)? {
        return Err(ServiceError::NotFound { entity, id });
    }
    tracing::info!(entity = %entity, id, "soft-deleted");
    Ok(())
}
