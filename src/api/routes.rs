use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::api::handlers::game::get_game;
use crate::api::handlers::socket::ws_handler;
use crate::api::state::AppState;

pub fn app_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/ws", get(ws_handler))
        .route("/game/:code", get(get_game));

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
