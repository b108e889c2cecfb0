use axum::extract::FromRequest;

use crate::error::ApiError;

/// JSON body extractor whose rejections render as `400 {"error": ...}`.
///
/// Plain `axum::Json` answers malformed bodies with 415 or 422; every body
/// decoding failure on this API is a bad request.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);
