use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Every failure a handler can report. Each variant owns a stable wire code
/// that clients match on.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no book picked for today")]
    NoBook,
    #[error("query returned no books")]
    NoBooks,
    #[error("request has nothing to act on")]
    InvalidRequest,
    #[error("query parameter `{0}` is not a valid number")]
    InvalidParameter(&'static str),
    #[error("review contents too long")]
    LongContents,
    #[error("required field missing")]
    KeyError,
    #[error("review does not exist")]
    NotExistReview,
    #[error("book does not exist")]
    NotExistBook,
    #[error("user does not own this review")]
    Unauthorized,
    #[error("book already in library")]
    AlreadyBook,
    #[error("required library field missing")]
    InvalidKeys,
    #[error("unknown library ordering")]
    InvalidOrdering,
    #[error("missing or invalid bearer token")]
    InvalidToken,
    #[error("unknown user or wrong password")]
    InvalidUser,
    #[error("account already exists")]
    AlreadyExists,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoBook => "NO_BOOK",
            Self::NoBooks => "NO_BOOKS",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::InvalidParameter(_) => "INVALID_PARAMETER",
            Self::LongContents => "LONG_CONTENTS",
            Self::KeyError => "KEY_ERROR",
            Self::NotExistReview => "NOT_EXIST_REVIEW",
            Self::NotExistBook => "NOT_EXIST_BOOK",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::AlreadyBook => "ALREADY_BOOK",
            // Misspelling kept: clients already match on it.
            Self::InvalidKeys => "INVAILD_KEYS",
            Self::InvalidOrdering => "INVALID_ORDERING",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InvalidUser => "INVALID_USER",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidToken | Self::InvalidUser => StatusCode::UNAUTHORIZED,
            Self::AlreadyExists => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(e) = &self {
            error!("Internal error: {:#}", e);
        }
        (self.status(), Json(json!({ "message": self.code() }))).into_response()
    }
}

/// Unwraps a JSON body, reporting any rejection as `missing`.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>, missing: ApiError) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|_| missing)
}

/// Replaces a database constraint failure with `mapped`; other errors pass
/// through untouched.
pub(crate) fn on_constraint(err: ApiError, mapped: ApiError) -> ApiError {
    match err {
        ApiError::Internal(e) if lumen_db::is_constraint_violation(&e) => mapped,
        other => other,
    }
}

/// Parses an optional numeric query parameter, falling back to `default`
/// when it is absent.
pub(crate) fn number_param<T: std::str::FromStr>(
    raw: Option<&str>,
    name: &'static str,
    default: T,
) -> Result<T, ApiError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ApiError::InvalidParameter(name)),
    }
}
