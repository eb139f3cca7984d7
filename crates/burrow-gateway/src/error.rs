use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use burrow_core::ShortenerError;
use tracing::{debug, error};

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    InvalidPayload(JsonRejection),
    EmptyUrl,
    LinkNotFound,
    Shortener(ShortenerError),
}

impl From<JsonRejection> for AppError {
    fn from(value: JsonRejection) -> Self {
        Self::InvalidPayload(value)
    }
}

impl From<ShortenerError> for AppError {
    fn from(value: ShortenerError) -> Self {
        Self::Shortener(value)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidPayload(_) | AppError::EmptyUrl => StatusCode::BAD_REQUEST,
            AppError::LinkNotFound => StatusCode::NOT_FOUND,
            AppError::Shortener(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            AppError::Shortener(err) if err.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Shortener(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::InvalidPayload(_) => "invalid request payload".to_string(),
            AppError::EmptyUrl => "url must not be empty".to_string(),
            AppError::LinkNotFound => "link not found".to_string(),
            AppError::Shortener(err) => err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(error = ?self, "request failed");
        } else {
            debug!(error = ?self, status = %status, "request rejected");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
