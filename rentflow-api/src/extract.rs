/// Extractors whose rejections render as [`ApiError`] envelopes
///
/// Axum's own `Json` and `Path` reject with plain-text bodies; these wrappers
/// keep every failure in the `{ success: false, message }` shape.

use crate::error::ApiError;
use axum::extract::FromRequest;
use axum::extract::FromRequestParts;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);
