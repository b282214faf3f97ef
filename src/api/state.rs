use crate::application::outbox::Outbox;
use crate::application::registry::{RegistrySettings, SessionRegistry};
use crate::config::AppConfig;
use crate::domain::events::ServerEvent;
use crate::domain::models::ConnectionId;
use crate::infrastructure::codes::RandomCodes;
use crate::infrastructure::standard_chess::StandardChess;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Outgoing channels of every live socket, keyed by connection.
#[derive(Debug, Default)]
pub struct Hub {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, connection: ConnectionId) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.insert(connection, tx);
        rx
    }

    pub fn unregister(&self, connection: &ConnectionId) {
        self.connections.remove(connection);
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Outbox for Hub {
    fn deliver(&self, connection: ConnectionId, event: ServerEvent) {
        let Some(tx) = self.connections.get(&connection) else {
            debug!(%connection, "dropping event for unknown connection");
            return;
        };

        if tx.send(event).is_err() {
            debug!(%connection, "dropping event for closed connection");
        }
    }
}

pub type GameStore = Arc<SessionRegistry<StandardChess>>;

#[derive(Clone)]
pub struct AppState {
    pub games: GameStore,
    pub hub: Arc<Hub>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let hub = Arc::new(Hub::new());
        let games = Arc::new(SessionRegistry::new(
            Arc::new(StandardChess::new()),
            RandomCodes::new(config.codes.length),
            Arc::clone(&hub) as Arc<dyn Outbox>,
            RegistrySettings::from_config(&config),
        ));

        AppState {
            games,
            hub,
            config: Arc::new(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::SessionError;

    #[test]
    fn registered_connections_receive_their_events() {
        let hub = Hub::new();
        let connection = ConnectionId::new();
        let mut rx = hub.register(connection);

        hub.deliver(connection, ServerEvent::rejected("resync", SessionError::NotFound));
        hub.deliver(ConnectionId::new(), ServerEvent::rejected("resync", SessionError::NotFound));

        assert_eq!(
            rx.try_recv().unwrap(),
            ServerEvent::rejected("resync", SessionError::NotFound)
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unregistered_connections_are_dropped() {
        let hub = Hub::new();
        let connection = ConnectionId::new();
        let rx = hub.register(connection);
        assert_eq!(hub.len(), 1);

        hub.unregister(&connection);
        drop(rx);

        assert!(hub.is_empty());
        hub.deliver(connection, ServerEvent::rejected("resync", SessionError::NotFound));
    }

    #[tokio::test]
    async fn state_wires_the_hub_into_the_registry() {
        let state = AppState::new(AppConfig::default());
        let connection = ConnectionId::new();
        let mut rx = state.hub.register(connection);

        let code = state
            .games
            .create(connection, Default::default())
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            ServerEvent::GameCreated { code: created, .. } => assert_eq!(created, code),
            other => panic!("unexpected event {other:?}"),
        }
    }
}
