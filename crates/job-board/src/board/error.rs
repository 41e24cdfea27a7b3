use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use super::authz::Denial;
use super::input::InputError;
use super::query::PageError;
use super::store::StoreError;
use super::token::AuthFailure;
use super::workflow::TransitionRejected;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Company,
    Job,
    Application,
}

impl Entity {
    pub const fn label(self) -> &'static str {
        match self {
            Entity::User => "User",
            Entity::Company => "Company",
            Entity::Job => "Job",
            Entity::Application => "Application",
        }
    }
}

/// Outcome taxonomy of every board action.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("{} not found", .0.label())]
    NotFound(Entity),
    #[error(transparent)]
    Forbidden(#[from] Denial),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Unauthenticated(#[from] AuthFailure),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BoardError {
    pub fn status(&self) -> StatusCode {
        match self {
            BoardError::NotFound(_) => StatusCode::NOT_FOUND,
            BoardError::Forbidden(_) => StatusCode::FORBIDDEN,
            BoardError::Conflict(_) | BoardError::Validation(_) => StatusCode::BAD_REQUEST,
            BoardError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            BoardError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable reason, where one exists.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            BoardError::Forbidden(denial) => Some(denial.code()),
            BoardError::Conflict(_) => Some("conflict"),
            BoardError::Validation(_) => Some("validation_failed"),
            _ => None,
        }
    }
}

impl From<InputError> for BoardError {
    fn from(value: InputError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<PageError> for BoardError {
    fn from(value: PageError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TransitionRejected> for BoardError {
    fn from(value: TransitionRejected) -> Self {
        Self::Validation(value.to_string())
    }
}

impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            BoardError::Store(err) => {
                error!(error = %err, "request failed on storage error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = match self.code() {
            Some(code) => json!({ "success": false, "message": message, "code": code }),
            None => json!({ "success": false, "message": message }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_outcome_taxonomy() {
        assert_eq!(
            BoardError::NotFound(Entity::Job).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            BoardError::from(Denial::NotJobOwner).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            BoardError::Conflict("dup".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BoardError::from(AuthFailure::MissingToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            BoardError::from(StoreError::Unavailable("down".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_message_names_entity() {
        assert_eq!(
            BoardError::NotFound(Entity::Company).to_string(),
            "Company not found"
        );
    }

    #[tokio::test]
    async fn storage_errors_do_not_leak_details() {
        let response =
            BoardError::Store(StoreError::Unavailable("replica set lost".to_string()))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .expect("read body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json payload");
        assert_eq!(payload["success"], json!(false));
        assert_eq!(payload["message"], json!("Internal server error"));
    }
}
