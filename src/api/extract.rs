//! Request extractors

use axum::extract::FromRequest;

use crate::error::AppError;

/// `Json` whose rejections become `AppError::InvalidRequest` (400 with a JSON body)
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
