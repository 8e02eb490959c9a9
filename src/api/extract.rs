//! Request extractors whose rejections use the `ApiError` JSON envelope.
//!
//! Plain `axum::Json`, `Path` and `Query` reject with `text/plain` bodies
//! and 4xx codes of their own; these wrappers map every rejection to
//! `ApiError::BadRequest`.

use axum::extract::{FromRequest, FromRequestParts};

use crate::api::error::ApiError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Typed path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Typed query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
