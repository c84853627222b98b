// src/errors.rs
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Every variant carries owned strings so the error can be cloned into all
/// callers awaiting a coalesced computation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlatingError {
    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Background removal error: {0}")]
    BackgroundRemoval(String),

    #[error("Background removal API key is not configured")]
    MissingApiKey,

    #[error("Unknown template category: {0}")]
    UnknownTemplate(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Worker task failed: {0}")]
    Task(String),

    #[error("Image processing failed")]
    ProcessingFailed,
}

impl From<tokio::task::JoinError> for PlatingError {
    fn from(e: tokio::task::JoinError) -> Self {
        PlatingError::Task(e.to_string())
    }
}

impl ResponseError for PlatingError {
    fn error_response(&self) -> HttpResponse {
        match self {
            PlatingError::ImageProcessing(_) => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "Image processing error",
                    "message": self.to_string()
                }))
            }
            PlatingError::BackgroundRemoval(_) => {
                HttpResponse::BadGateway().json(serde_json::json!({
                    "error": "Background removal service error",
                    "message": self.to_string()
                }))
            }
            PlatingError::MissingApiKey => {
                HttpResponse::ServiceUnavailable().json(serde_json::json!({
                    "error": "Background removal unavailable",
                    "message": self.to_string()
                }))
            }
            PlatingError::UnknownTemplate(_) => HttpResponse::NotFound().json(serde_json::json!({
                "error": "Template not found",
                "message": self.to_string()
            })),
            PlatingError::Validation(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Validation error",
                "message": self.to_string()
            })),
            PlatingError::Task(_) | PlatingError::ProcessingFailed => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Processing error",
                    "message": self.to_string()
                }))
            }
        }
    }
}
