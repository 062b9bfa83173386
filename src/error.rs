use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::face::FaceApiError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid request: {0}")]
    InvalidAction(String),

    #[error("captured image could not be decoded: {0}")]
    Decode(String),

    #[error("employee {0} not found")]
    EmployeeNotFound(u64),

    /// The recognition service could not answer. The user should retry.
    #[error("face verification failed: {0}")]
    VerificationFailed(#[source] FaceApiError),

    #[error("face does not match employee {employee_id} (recognized {recognized:?})")]
    VerificationMismatch {
        employee_id: u64,
        recognized: Option<String>,
    },

    #[error("no check-in found for today")]
    NoCheckIn,

    #[error("check-out cannot precede check-in")]
    CheckOutBeforeCheckIn,

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// Enrollment or index maintenance failed on the recognition service.
    #[error("face service error: {0}")]
    FaceService(#[source] FaceApiError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidAction(_) => "invalid_action",
            AppError::Decode(_) => "invalid_image",
            AppError::EmployeeNotFound(_) => "employee_not_found",
            AppError::VerificationFailed(_) => "verification_failed",
            AppError::VerificationMismatch { .. } => "face_mismatch",
            AppError::NoCheckIn => "no_check_in",
            AppError::CheckOutBeforeCheckIn => "check_out_before_check_in",
            AppError::Forbidden(_) => "forbidden",
            AppError::FaceService(_) => "face_service_error",
            AppError::Database(_) => "internal_error",
        }
    }

    /// Message safe to show to the person in front of the camera.
    fn public_message(&self) -> String {
        match self {
            AppError::VerificationFailed(_) => {
                "Face verification failed, please try again".to_string()
            }
            AppError::VerificationMismatch { .. } => {
                "Face does not match, please try again".to_string()
            }
            AppError::NoCheckIn => "No check-in found for today".to_string(),
            AppError::Database(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidAction(_) | AppError::Decode(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::EmployeeNotFound(_) => StatusCode::NOT_FOUND,
            AppError::NoCheckIn | AppError::CheckOutBeforeCheckIn => StatusCode::CONFLICT,
            AppError::VerificationFailed(_) | AppError::VerificationMismatch { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::FaceService(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Database(e) = self {
            tracing::error!(error = %e, "Database error");
        }

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.code(),
            "message": self.public_message(),
        }))
    }
}
