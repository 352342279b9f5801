//! Error types for the sizing pipeline and the equipment catalog.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::api::ErrorResponse;

#[derive(Debug, Error)]
pub enum SizingError {
    /// Malformed or out-of-range input. `field` uses the wire name.
    #[error("Validation error: {message}")]
    Validation { field: &'static str, message: String },

    #[error("No suitable inverter found for {system_size_kw}kW system")]
    NoSuitableEquipment { system_size_kw: f64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SizingError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        SizingError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Error for a value outside a closed set, listing what is accepted.
    pub fn invalid_choice(field: &'static str, label: &str, accepted: &[&str]) -> Self {
        SizingError::validation(
            field,
            format!("Invalid {}. Must be one of: {}", label, accepted.join(", ")),
        )
    }

    /// Short machine-readable name, reported as `errorType`.
    pub fn kind(&self) -> &'static str {
        match self {
            SizingError::Validation { .. } => "ValidationError",
            SizingError::NoSuitableEquipment { .. } => "NoSuitableEquipmentError",
            SizingError::Internal(_) => "InternalError",
        }
    }
}

pub type Result<T> = std::result::Result<T, SizingError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("catalog response could not be decoded: {0}")]
    Decode(String),

    #[error("catalog misconfigured: {0}")]
    Config(String),
}

impl IntoResponse for SizingError {
    fn into_response(self) -> Response {
        let (status, message, field) = match &self {
            SizingError::Validation { field, message } => {
                (StatusCode::BAD_REQUEST, message.clone(), Some(field.to_string()))
            }
            SizingError::NoSuitableEquipment { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string(), None)
            }
            SizingError::Internal(detail) => {
                error!("Sizing calculation failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to calculate system size".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: message,
            error_type: self.kind().to_string(),
            field,
        };
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        error!("Equipment catalog unavailable: {}", self);
        let body = ErrorResponse {
            error: self.to_string(),
            error_type: "CatalogError".to_string(),
            field: None,
        };
        (StatusCode::BAD_GATEWAY, Json(body)).into_response()
    }
}
