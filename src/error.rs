use http::StatusCode;
use thiserror::Error;

/// Which form field a validation error belongs to, so the UI can show it inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewField {
    Rating,
    Comment,
    OrderNumber,
    Photos,
    ChatHistory,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(u8),
    #[error("comment must be at least {min} characters long")]
    CommentTooShort { min: usize },
    #[error("comment must be at most {max} characters long")]
    CommentTooLong { max: usize },
    #[error("an order number is required for ratings of 1 to 3 stars")]
    MissingOrderNumber,
    #[error("at least one photo is required for ratings of 1 to 3 stars")]
    MissingPhotos,
    #[error("at most {max} photos are allowed")]
    TooManyPhotos { max: usize },
    #[error("photo {index}: {reason}")]
    InvalidPhoto { index: usize, reason: String },
    #[error("review contains disallowed content: {}", .0.join(", "))]
    DisallowedContent(Vec<String>),
    #[error("response text must not be empty")]
    EmptyResponse,
    #[error("chat history must be at most {max_mb} MB")]
    ChatHistoryTooLarge { max_mb: usize },
}

impl ValidationError {
    pub fn field(&self) -> ReviewField {
        match self {
            ValidationError::RatingOutOfRange(_) => ReviewField::Rating,
            ValidationError::CommentTooShort { .. }
            | ValidationError::CommentTooLong { .. }
            | ValidationError::DisallowedContent(_)
            | ValidationError::EmptyResponse => ReviewField::Comment,
            ValidationError::MissingOrderNumber => ReviewField::OrderNumber,
            ValidationError::MissingPhotos
            | ValidationError::TooManyPhotos { .. }
            | ValidationError::InvalidPhoto { .. } => ReviewField::Photos,
            ValidationError::ChatHistoryTooLarge { .. } => ReviewField::ChatHistory,
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Failure of a client-side operation, as surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{detail}")]
    Rejected { detail: String },
    #[error("please sign in")]
    Unauthorized,
    #[error("not authorized")]
    Forbidden,
    #[error("this item is no longer available")]
    NotFound,
    #[error("request failed: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        match StatusCode::from_u16(status) {
            Ok(StatusCode::UNAUTHORIZED) => ApiError::Unauthorized,
            Ok(StatusCode::FORBIDDEN) => ApiError::Forbidden,
            Ok(StatusCode::NOT_FOUND) => ApiError::NotFound,
            Ok(code) if code.is_client_error() => ApiError::Rejected {
                detail: detail.unwrap_or_else(|| "The request was rejected".to_string()),
            },
            _ => ApiError::Transport(format!("server responded with status {status}")),
        }
    }

    /// Message for a notification. Authorization failures never say whose review it was.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(err) => err.to_string(),
            ApiError::Rejected { detail } => detail.clone(),
            ApiError::Unauthorized => "Please sign in to continue.".to_string(),
            ApiError::Forbidden => "You are not authorized to perform this action.".to_string(),
            ApiError::NotFound => "This review is no longer available.".to_string(),
            ApiError::Transport(_) => "Something went wrong. Please try again.".to_string(),
        }
    }

    pub fn requires_refresh(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }

    pub fn ends_session(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

#[cfg(feature = "ssr")]
mod service {
    use super::ValidationError;
    use actix_web::{http::StatusCode, HttpResponse, ResponseError};
    use leptos::logging::error;
    use serde::Serialize;
    use thiserror::Error;

    /// Server-side failure of a handler, rendered as `{"detail": ...}`.
    #[derive(Debug, Error)]
    pub enum ServiceError {
        #[error(transparent)]
        Validation(#[from] ValidationError),
        #[error("{0}")]
        BadRequest(String),
        #[error("{0}")]
        Conflict(String),
        #[error("authentication required")]
        Unauthorized,
        #[error("not authorized")]
        Forbidden,
        #[error("{0} not found")]
        NotFound(&'static str),
        #[error(transparent)]
        Database(#[from] rusqlite::Error),
    }

    #[derive(Serialize)]
    struct ErrorBody {
        detail: String,
    }

    impl ResponseError for ServiceError {
        fn status_code(&self) -> StatusCode {
            match self {
                ServiceError::Validation(_) | ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
                ServiceError::Conflict(_) => StatusCode::CONFLICT,
                ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
                ServiceError::Forbidden => StatusCode::FORBIDDEN,
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }

        fn error_response(&self) -> HttpResponse {
            let detail = match self {
                ServiceError::Database(err) => {
                    error!("[API] Database error: {:?}", err);
                    "Internal server error".to_string()
                }
                other => other.to_string(),
            };
            HttpResponse::build(self.status_code()).json(ErrorBody { detail })
        }
    }
}

#[cfg(feature = "ssr")]
pub use service::ServiceError;
