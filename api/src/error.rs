use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure taxonomy for every core operation. All variants render as a
/// `{ "message": ... }` JSON body with the matching status.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Internal server error.")]
    Internal(String),
}

impl ApiError {
    pub fn internal(detail: impl ToString) -> Self {
        ApiError::Internal(detail.to_string())
    }

    // Entity-resolution failures use fixed phrases so clients (and tests)
    // can tell which lookup in the chain came up empty.

    pub fn post_not_found(id: &str) -> Self {
        ApiError::NotFound(format!("Post with ID: {id} does not exist in database."))
    }

    pub fn user_not_found() -> Self {
        ApiError::NotFound("User does not exist in database.".into())
    }

    pub fn author_not_found() -> Self {
        ApiError::NotFound("Author user does not exist in database.".into())
    }

    pub fn comment_not_found(id: &str) -> Self {
        ApiError::NotFound(format!(
            "Comment with ID: '{id}' does not exist in database."
        ))
    }

    pub fn comment_author_not_found() -> Self {
        ApiError::NotFound("Comment author does not exist in database.".into())
    }

    pub fn reply_not_found(id: &str) -> Self {
        ApiError::NotFound(format!(
            "Reply comment with ID: '{id}' does not exist in database."
        ))
    }

    pub fn reply_author_not_found() -> Self {
        ApiError::NotFound("Reply author does not exist in database.".into())
    }

    pub fn subreddit_not_found(id: &str) -> Self {
        ApiError::NotFound(format!(
            "Subreddit with ID: '{id}' does not exist in database."
        ))
    }

    pub fn access_denied() -> Self {
        ApiError::Unauthorized("Access is denied.".into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            // Surface the category only; the cause goes to the log.
            tracing::error!(%detail, "internal error");
        }
        (self.status(), Json(json!({ "message": self.to_string() }))).into_response()
    }
}

// Storage-layer failures propagate as internal errors; the core neither
// retries nor recovers.

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::internal(err)
    }
}

impl From<r2d2::Error> for ApiError {
    fn from(err: r2d2::Error) -> Self {
        ApiError::internal(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_phrases_name_the_entity() {
        assert_eq!(
            ApiError::post_not_found("p1").to_string(),
            "Post with ID: p1 does not exist in database."
        );
        assert_eq!(
            ApiError::comment_not_found("c1").to_string(),
            "Comment with ID: 'c1' does not exist in database."
        );
        assert_eq!(
            ApiError::reply_not_found("r1").to_string(),
            "Reply comment with ID: 'r1' does not exist in database."
        );
    }

    #[test]
    fn internal_error_hides_detail() {
        let err = ApiError::internal("connection reset by peer");
        assert_eq!(err.to_string(), "Internal server error.");
    }
}
