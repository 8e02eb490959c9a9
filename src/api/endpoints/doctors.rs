//! Doctor endpoints. ADMIN and DOCTOR callers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::extract::{ApiJson, ApiPath};
use crate::api::types::ApiContext;
use crate::authorization::{require_any, Caller, STAFF};
use crate::services::doctor::{
    self, DoctorExaminationCount, DoctorRequest, DoctorResponse, DoctorWithPatients,
};

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<DoctorResponse>>, ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    Ok(Json(doctor::list_doctors(&conn)?))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiJson(request): ApiJson<DoctorRequest>,
) -> Result<(StatusCode, Json<DoctorResponse>), ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    Ok((StatusCode::CREATED, Json(doctor::create_doctor(&conn, &request)?)))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<DoctorResponse>, ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    Ok(Json(doctor::get_doctor(&conn, id)?))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<DoctorRequest>,
) -> Result<Json<DoctorResponse>, ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    Ok(Json(doctor::update_doctor(&conn, id, &request)?))
}

pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    doctor::delete_doctor(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/doctors/with-patients`
pub async fn with_patients(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<DoctorWithPatients>>, ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    Ok(Json(doctor::doctors_with_patients(&conn)?))
}

/// `GET /api/doctors/examination-counts`
pub async fn examination_counts(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<DoctorExaminationCount>>, ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    Ok(Json(doctor::examination_counts(&conn)?))
}
