//! Diagnosis endpoints. ADMIN only.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::extract::{ApiJson, ApiPath};
use crate::api::types::ApiContext;
use crate::authorization::{require_any, Caller, ADMIN_ONLY};
use crate::services::diagnosis::{
    self, DiagnosisFrequency, DiagnosisRequest, DiagnosisResponse,
};

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<DiagnosisResponse>>, ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    Ok(Json(diagnosis::list_diagnoses(&conn)?))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiJson(request): ApiJson<DiagnosisRequest>,
) -> Result<(StatusCode, Json<DiagnosisResponse>), ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    Ok((StatusCode::CREATED, Json(diagnosis::create_diagnosis(&conn, &request)?)))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<DiagnosisResponse>, ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    Ok(Json(diagnosis::get_diagnosis(&conn, id)?))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<DiagnosisRequest>,
) -> Result<Json<DiagnosisResponse>, ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    Ok(Json(diagnosis::update_diagnosis(&conn, id, &request)?))
}

pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    diagnosis::delete_diagnosis(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/diagnoses/most-common`
pub async fn most_common(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<DiagnosisFrequency>>, ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    Ok(Json(diagnosis::most_common_diagnoses(&conn)?))
}
