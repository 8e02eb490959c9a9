//! API endpoint handlers.
//!
//! One module per resource. Handlers check the caller's role, open a
//! connection and delegate to `crate::services`.

pub mod admin;
pub mod auth;
pub mod diagnoses;
pub mod doctors;
pub mod examinations;
pub mod health;
pub mod hospital_records;
pub mod patients;
