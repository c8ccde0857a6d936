// src/models.rs
use actix_web::HttpResponse;
use serde::Serialize;

use crate::errors::ServiceError;

/// Shown instead of the underlying interpreter error, which only goes to the log.
pub const EXECUTION_UNAVAILABLE: &str = "Code execution unavailable";

#[derive(Serialize, Clone, Debug)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}

/// Maps a service error onto a JSON error response.
pub fn error_response(err: &ServiceError) -> HttpResponse {
    match err {
        ServiceError::QuestionNotFound(_) => HttpResponse::NotFound().json(ApiError::new("Question not found")),
        ServiceError::Infrastructure(_) => {
            log::error!("Judge infrastructure failure: {}", err);
            HttpResponse::InternalServerError().json(ApiError::new(EXECUTION_UNAVAILABLE))
        }
        _ => {
            log::error!("Request failed: {}", err);
            HttpResponse::InternalServerError().json(ApiError::new(err.to_string()))
        }
    }
}
