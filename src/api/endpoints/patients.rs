//! Patient endpoints. CRUD is ADMIN only; the filtered views are open to DOCTOR too.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::extract::{ApiJson, ApiPath};
use crate::api::types::ApiContext;
use crate::authorization::{require_any, Caller, ADMIN_ONLY, STAFF};
use crate::services::patient::{self, PatientRequest, PatientResponse, PatientWithExaminations};

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<PatientResponse>>, ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    Ok(Json(patient::list_patients(&conn)?))
}

/// `POST /api/patients`: also creates the patient's login.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiJson(request): ApiJson<PatientRequest>,
) -> Result<(StatusCode, Json<PatientResponse>), ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    let created = patient::create_patient(&conn, &request, &ctx.config.patient_password)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<PatientResponse>, ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    Ok(Json(patient::get_patient(&conn, id)?))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<PatientRequest>,
) -> Result<Json<PatientResponse>, ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    Ok(Json(patient::update_patient(&conn, id, &request)?))
}

pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    patient::delete_patient(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/patients/by-diagnosis/:id`
pub async fn by_diagnosis(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(diagnosis_id): ApiPath<i64>,
) -> Result<Json<Vec<PatientResponse>>, ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    Ok(Json(patient::patients_by_diagnosis(&conn, diagnosis_id)?))
}

/// `GET /api/patients/by-doctor/:id`
pub async fn by_doctor(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(doctor_id): ApiPath<i64>,
) -> Result<Json<Vec<PatientResponse>>, ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    Ok(Json(patient::patients_by_personal_doctor(&conn, doctor_id)?))
}

/// `GET /api/patients/with-examinations`
pub async fn with_examinations(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<PatientWithExaminations>>, ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    Ok(Json(patient::patients_with_examinations(&conn)?))
}
