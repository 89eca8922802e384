use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::pipeline::{PipelineError, StoreError};

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorDto {
    pub error: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    UnsupportedMediaType(String),
    #[error("Authentication credentials were not provided or are invalid.")]
    Unauthorized,
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    fn reply(status: StatusCode, message: impl Into<String>) -> Response {
        (status, Json(ErrorDto { error: message.into() })).into_response()
    }
}

/// Client errors carry their message; everything else is logged and reported
/// as a generic 500.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => Self::reply(StatusCode::BAD_REQUEST, message),
            Self::UnsupportedMediaType(message) => Self::reply(StatusCode::UNSUPPORTED_MEDIA_TYPE, message),
            Self::Unauthorized => Self::reply(StatusCode::UNAUTHORIZED, Self::Unauthorized.to_string()),
            Self::Pipeline(PipelineError::NoRatesFound) => Self::reply(
                StatusCode::BAD_REQUEST,
                "No utility rates found for the given address.",
            ),
            err => {
                tracing::error!(error = %err, "request failed");
                Self::reply(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

/// Body rejections keep axum's message. Everything except a missing JSON
/// content type is a 400.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        match rejection {
            JsonRejection::MissingJsonContentType(_) => Self::UnsupportedMediaType(message),
            _ => Self::BadRequest(message),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
