//! Login and logout.
//!
//! `POST /api/auth/login`: unprotected, exchanges credentials for a bearer token
//! `POST /api/auth/logout`: protected, revokes the presented token

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::extract::ApiJson;
use crate::api::middleware::auth::bearer_token;
use crate::api::types::ApiContext;
use crate::services::account;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub roles: Vec<String>,
    pub expires_in_secs: u64,
}

pub async fn login(
    State(ctx): State<ApiContext>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let caller = {
        let conn = ctx.open_db()?;
        account::authenticate(&conn, &request.username, &request.password)?
    };

    let token = ctx
        .sessions
        .lock()
        .map_err(|_| ApiError::Internal("session lock".into()))?
        .issue(caller.user_id);

    tracing::info!(user_id = caller.user_id, "login succeeded");

    Ok(Json(LoginResponse {
        token,
        username: caller.username,
        roles: caller.roles.iter().map(|r| r.as_str().to_string()).collect(),
        expires_in_secs: ctx.config.session_ttl.as_secs(),
    }))
}

pub async fn logout(State(ctx): State<ApiContext>, req: Request) -> Result<StatusCode, ApiError> {
    let token = bearer_token(&req).ok_or(ApiError::Unauthorized)?;
    ctx.sessions
        .lock()
        .map_err(|_| ApiError::Internal("session lock".into()))?
        .revoke(token);
    Ok(StatusCode::NO_CONTENT)
}
