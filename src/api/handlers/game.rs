use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

use crate::api::models::ApiError;
use crate::api::state::AppState;

/// Read-only view of one session.
pub async fn get_game(State(state): State<AppState>, Path(code): Path<String>) -> impl IntoResponse {
    match state.games.snapshot(&code).await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(error) => {
            let body = ApiError::from(error);
            (body.status(), Json(body)).into_response()
        }
    }
}
