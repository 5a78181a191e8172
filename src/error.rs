use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Rules must be accepted")]
    RulesNotAccepted,

    #[error("Participant is blocked")]
    Blocked,

    #[error("Access password required")]
    AccessDenied,

    #[error("Account id already registered")]
    DuplicateAccountId,

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl AppError {
    /// Stable machine-readable code carried in the error envelope
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::ConfigError(_) => "VALIDATION_ERROR",
            AppError::MissingField(_) => "MISSING_FIELD",
            AppError::RulesNotAccepted => "RULES_NOT_ACCEPTED",
            AppError::Blocked => "BLOCKED",
            AppError::AccessDenied => "ACCESS_DENIED",
            AppError::DuplicateAccountId => "DUPLICATE_ACCOUNT_ID",
            AppError::AuthError(_) | AppError::JwtError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden => "FORBIDDEN",
            AppError::ExternalApiError(_) | AppError::ReqwestError(_) => "EXTERNAL_API_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::ConfigError(_)
            | AppError::MissingField(_)
            | AppError::RulesNotAccepted => StatusCode::BAD_REQUEST,
            AppError::Blocked | AppError::AccessDenied | AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DuplicateAccountId => StatusCode::CONFLICT,
            AppError::AuthError(_) | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ExternalApiError(_) | AppError::ReqwestError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::ValidationError(msg) | AppError::ConfigError(msg) => {
                log::warn!("Validation error: {msg}");
                msg.clone()
            }
            AppError::MissingField(_)
            | AppError::RulesNotAccepted
            | AppError::Blocked
            | AppError::AccessDenied
            | AppError::DuplicateAccountId => {
                log::warn!("Submission rejected: {self}");
                self.to_string()
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                msg.clone()
            }
            AppError::JwtError(err) => {
                log::warn!("Authentication error: {err}");
                "Invalid access token".to_string()
            }
            AppError::NotFound(msg) => msg.clone(),
            AppError::Forbidden => {
                log::warn!("Forbidden access");
                "Forbidden".to_string()
            }
            AppError::ExternalApiError(msg) => {
                log::error!("External API error: {msg}");
                msg.clone()
            }
            AppError::ReqwestError(err) => {
                log::error!("External API error: {err}");
                "External service unavailable".to_string()
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                "Database error".to_string()
            }
            _ => {
                log::error!("Internal error: {self}");
                "Internal server error".to_string()
            }
        };

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": message
            }
        }))
    }
}
