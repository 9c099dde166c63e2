use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{service}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Access errors (users, roles, permissions)
/// - E2xxx: Moderation errors
/// - E3xxx: Ticket errors
/// - E4xxx: Notification errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    RateLimited,
    ServiceUnavailable,
    BadRequest,
    TokenExpired,
    TokenInvalid,

    // Access (E1xxx)
    UserNotFound,
    RoleNotFound,
    InsufficientRoleLevel,
    OverlayGrantNotFound,
    OverlayAlreadyExpired,

    // Moderation (E2xxx)
    ActionNotFound,
    ActionAlreadyLifted,
    InvalidActionType,
    AppealNotFound,
    AppealAlreadyResolved,
    AppealActionMismatch,
    DuplicateAppeal,
    ReportNotFound,
    InvalidReportTransition,
    CannotReportSelf,
    DuplicateReport,

    // Tickets (E3xxx)
    TicketNotFound,
    NotTicketParticipant,
    AttachmentTooLarge,

    // Notify (E4xxx)
    NotificationNotFound,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::RateLimited => "E0006",
            Self::ServiceUnavailable => "E0007",
            Self::BadRequest => "E0008",
            Self::TokenExpired => "E0009",
            Self::TokenInvalid => "E0010",

            // Access
            Self::UserNotFound => "E1001",
            Self::RoleNotFound => "E1002",
            Self::InsufficientRoleLevel => "E1003",
            Self::OverlayGrantNotFound => "E1004",
            Self::OverlayAlreadyExpired => "E1005",

            // Moderation
            Self::ActionNotFound => "E2001",
            Self::ActionAlreadyLifted => "E2002",
            Self::InvalidActionType => "E2003",
            Self::AppealNotFound => "E2004",
            Self::AppealAlreadyResolved => "E2005",
            Self::AppealActionMismatch => "E2006",
            Self::DuplicateAppeal => "E2007",
            Self::ReportNotFound => "E2008",
            Self::InvalidReportTransition => "E2009",
            Self::CannotReportSelf => "E2010",
            Self::DuplicateReport => "E2011",

            // Tickets
            Self::TicketNotFound => "E3001",
            Self::NotTicketParticipant => "E3002",
            Self::AttachmentTooLarge => "E3003",

            // Notify
            Self::NotificationNotFound => "E4001",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError | Self::ServiceUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::InvalidActionType
            | Self::InvalidReportTransition => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::UserNotFound | Self::RoleNotFound
            | Self::OverlayGrantNotFound | Self::ActionNotFound | Self::AppealNotFound
            | Self::ReportNotFound | Self::TicketNotFound
            | Self::NotificationNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::TokenExpired | Self::TokenInvalid => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::InsufficientRoleLevel | Self::CannotReportSelf
            | Self::NotTicketParticipant => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::AttachmentTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::OverlayAlreadyExpired | Self::ActionAlreadyLifted
            | Self::AppealAlreadyResolved | Self::DuplicateAppeal
            | Self::DuplicateReport => StatusCode::CONFLICT,
            Self::AppealActionMismatch => StatusCode::FORBIDDEN,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RateLimited, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
