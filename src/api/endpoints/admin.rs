//! Role and user management under `/api/admin`. ADMIN only.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::extract::{ApiJson, ApiPath};
use crate::api::types::ApiContext;
use crate::authorization::{require_any, Caller, ADMIN_ONLY};
use crate::services::account::{
    self, RoleRequest, RoleResponse, UserRequest, UserResponse, UserUpdateRequest,
};

// ── Roles ──────────────────────────────────────────────────────────────────

pub async fn list_roles(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<RoleResponse>>, ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    Ok(Json(account::list_roles(&conn)?))
}

pub async fn create_role(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiJson(request): ApiJson<RoleRequest>,
) -> Result<(StatusCode, Json<RoleResponse>), ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    Ok((StatusCode::CREATED, Json(account::create_role(&conn, &request)?)))
}

pub async fn role_detail(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<RoleResponse>, ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    Ok(Json(account::get_role(&conn, id)?))
}

pub async fn update_role(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<RoleRequest>,
) -> Result<Json<RoleResponse>, ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    Ok(Json(account::update_role(&conn, id, &request)?))
}

pub async fn remove_role(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    account::delete_role(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Users ──────────────────────────────────────────────────────────────────

pub async fn list_users(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    Ok(Json(account::list_users(&conn)?))
}

pub async fn create_user(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiJson(request): ApiJson<UserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    Ok((StatusCode::CREATED, Json(account::create_user(&conn, &request)?)))
}

pub async fn user_detail(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    Ok(Json(account::get_user(&conn, id)?))
}

pub async fn update_user(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UserUpdateRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    Ok(Json(account::update_user(&conn, id, &request)?))
}

/// `DELETE /api/admin/users/:id`: disables the account.
pub async fn remove_user(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<Caller>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    require_any(&caller, ADMIN_ONLY)?;
    let conn = ctx.open_db()?;
    account::delete_user(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}
