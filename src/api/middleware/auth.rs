//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, resolves it against the
//! session store, reloads the user, and injects `Caller` into request
//! extensions for downstream handlers.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::services::account;

/// Pull the bearer token out of the `Authorization` header.
pub fn bearer_token<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Require a live session token.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
/// Disabled users are rejected even while their token is still live.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = bearer_token(&req).ok_or(ApiError::Unauthorized)?.to_string();

    let user_id = {
        let mut sessions = ctx
            .sessions
            .lock()
            .map_err(|_| ApiError::Internal("session lock".into()))?;
        sessions.resolve(&token).ok_or(ApiError::Unauthorized)?
    }; // MutexGuard dropped here, before any .await

    let caller = {
        let conn = ctx.open_db()?;
        account::load_caller(&conn, user_id)?
    };
    let Some(caller) = caller else {
        if let Ok(mut sessions) = ctx.sessions.lock() {
            sessions.revoke(&token);
        }
        return Err(ApiError::Unauthorized);
    };

    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}
