pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;

use crate::config::AppConfig;
use tracing::info;

pub async fn start_server(config: AppConfig) -> std::io::Result<()> {
    let address = config.bind_address();
    let app_state = state::AppState::new(config);

    let app = routes::app_router(app_state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(address = %listener.local_addr()?, "listening");
    axum::serve(listener, app).await
}
