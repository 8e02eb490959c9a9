//! Audit logging middleware.
//!
//! Logs every API request with a request id, user, method, path and
//! response status. Runs innermost (after auth has injected `Caller`).

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use crate::authorization::Caller;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let user_id = req.extensions().get::<Caller>().map(|c| c.user_id);

    let response = next.run(req).await;

    tracing::info!(
        %request_id,
        user_id,
        %method,
        %path,
        status = response.status().as_u16(),
        "api access"
    );
    response
}
