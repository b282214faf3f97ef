use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::api::state::AppState;
use crate::application::outbox::Outbox;
use crate::domain::events::ServerEvent;
use crate::domain::models::ConnectionId;
use crate::interface::protocol::ClientIntent;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        let connection = ConnectionId::new();
        handle_socket(socket, state, connection).instrument(info_span!("connection", %connection))
    })
}

/// Pumps intents from one socket into the registry until the client goes away, then departs
/// the connection from its session.
async fn handle_socket(socket: WebSocket, state: AppState, connection: ConnectionId) {
    info!("websocket connected");

    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut outbound = state.hub.register(connection);

    let send_task = tokio::spawn(
        async move {
            while let Some(event) = outbound.recv().await {
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        error!(error = %e, "failed to serialize event");
                        continue;
                    }
                };

                if ws_tx.send(Message::Text(json)).await.is_err() {
                    debug!("websocket send failed, client disconnected");
                    break;
                }
            }
        }
        .in_current_span(),
    );

    while let Some(result) = ws_rx.next().await {
        let frame = match result {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => {
                info!("client sent close frame");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "websocket error");
                break;
            }
        };

        match ClientIntent::decode(&frame) {
            Ok(intent) => {
                let name = intent.name();
                if let Err(error) = intent.execute(&state.games, connection).await {
                    state.hub.deliver(connection, ServerEvent::rejected(name, error));
                }
            }
            Err((name, error)) => {
                state.hub.deliver(connection, ServerEvent::rejected(&name, error));
            }
        }
    }

    state.games.depart(connection).await;
    state.hub.unregister(&connection);
    send_task.abort();

    info!("websocket closed");
}
