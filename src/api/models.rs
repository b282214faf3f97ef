use crate::domain::errors::SessionError;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// JSON body of a failed HTTP request.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ApiError {
    pub error: SessionError,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.error {
            SessionError::NotFound => StatusCode::NOT_FOUND,
            SessionError::CapacityError => StatusCode::SERVICE_UNAVAILABLE,
            SessionError::MalformedIntent => StatusCode::BAD_REQUEST,
            _ => StatusCode::CONFLICT,
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(error: SessionError) -> Self {
        ApiError {
            error,
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_games_are_not_found() {
        let error = ApiError::from(SessionError::NotFound);
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!({ "error": "notFound", "message": "Game not found" })
        );
    }
}
