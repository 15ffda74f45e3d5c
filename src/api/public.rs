//! Public API types

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::ai::ExtractionError;

// Errors

/// Body of every error response
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub detail: String,
    pub kind: String,
}

#[derive(Debug)]
pub enum ApiError {
    Extraction(ExtractionError),
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Extraction(ExtractionError::Configuration(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Extraction(ExtractionError::CollaboratorUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            // The model answered, just not with anything usable
            ApiError::Extraction(ExtractionError::MalformedResponse(_))
            | ApiError::Extraction(ExtractionError::SchemaViolation(_)) => StatusCode::BAD_GATEWAY,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Extraction(err) => err.kind(),
        }
    }

    fn detail(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Extraction(err) => err.to_string(),
        }
    }
}

/// Convert `ApiError` into an Axum compatible response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Always log the error
        tracing::error!("{}", self.detail());

        let body = ErrorResponse {
            detail: self.detail(),
            kind: self.kind().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Enables using `?` on extractions inside handlers
impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        Self::Extraction(err)
    }
}

// Re-export public types from each route

pub mod parse {
    pub use crate::api::routes::parse::public::*;
}
