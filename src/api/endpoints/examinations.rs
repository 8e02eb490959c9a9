//! Examination endpoints.
//!
//! ADMIN and DOCTOR read and write; only ADMIN deletes. PATIENT callers
//! get `GET /api/examinations/mine`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::types::ApiContext;
use crate::authorization::{require_any, Caller, ADMIN_ONLY, STAFF};
use crate::services::examination::{
    self, ExaminationEditRequest, ExaminationRequest, ExaminationResponse,
};

#[derive(Debug, Deserialize)]
pub struct ByDoctorQuery {
    pub doctor_id: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<ExaminationResponse>>, ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    Ok(Json(examination::list_examinations(&conn)?))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiJson(request): ApiJson<ExaminationRequest>,
) -> Result<(StatusCode, Json<ExaminationResponse>), ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    Ok((
        StatusCode::CREATED,
        Json(examination::create_examination(&conn, &request)?),
    ))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ExaminationResponse>, ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    Ok(Json(examination::get_examination(&conn, id)?))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<ExaminationEditRequest>,
) -> Result<Json<ExaminationResponse>, ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    Ok(Json(examination::update_examination(&conn, id, &request)?))
}

pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    examination::delete_examination(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/examinations/by-doctor?doctor_id=&start=&end=`
pub async fn by_doctor(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiQuery(query): ApiQuery<ByDoctorQuery>,
) -> Result<Json<Vec<ExaminationResponse>>, ApiError> {
    require_any(&caller, STAFF)?;
    let conn = ctx.open_db()?;
    Ok(Json(examination::examinations_by_doctor_between(
        &conn,
        query.doctor_id,
        query.start,
        query.end,
    )?))
}

/// `GET /api/examinations/mine`: the caller's own examinations.
pub async fn mine(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<ExaminationResponse>>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(examination::my_examinations(&conn, &caller)?))
}
