use chessmate::application::outbox::MemoryOutbox;
use chessmate::application::registry::{RegistrySettings, SessionRegistry};
use chessmate::domain::errors::SessionError;
use chessmate::domain::events::ServerEvent;
use chessmate::domain::models::{Color, ConnectionId, SessionCode, SessionStatus};
use chessmate::infrastructure::codes::RandomCodes;
use chessmate::infrastructure::standard_chess::StandardChess;
use chessmate::interface::mirror::LocalMirror;
use chessmate::interface::protocol::ClientIntent;
use std::sync::Arc;

struct Table {
    registry: SessionRegistry<StandardChess>,
    outbox: Arc<MemoryOutbox>,
}

impl Table {
    fn new() -> Self {
        let outbox = Arc::new(MemoryOutbox::new());
        let settings = RegistrySettings {
            tick_interval: None,
            ..RegistrySettings::default()
        };
        let registry =
            SessionRegistry::new(Arc::new(StandardChess), RandomCodes::default(), outbox.clone(), settings);
        Table { registry, outbox }
    }

    /// Runs one raw frame the way a socket would, answering failures with `rejected`.
    async fn send(&self, connection: ConnectionId, frame: &str) -> Result<(), SessionError> {
        let intent = ClientIntent::decode(frame).map_err(|(_, error)| error)?;
        intent.execute(&self.registry, connection).await
    }

    fn mirror(&self, connection: ConnectionId) -> LocalMirror {
        let mut mirror = LocalMirror::new();
        for event in self.outbox.events_for(connection) {
            mirror.apply(&event);
        }
        mirror
    }
}

fn propose(code: &SessionCode, from: &str, to: &str) -> String {
    format!(r#"{{"intent":"proposeMove","code":"{code}","move":{{"from":"{from}","to":"{to}"}}}}"#)
}

#[tokio::test]
async fn test_fools_mate_over_the_protocol() {
    let table = Table::new();
    let alice = ConnectionId::new();
    let bob = ConnectionId::new();

    table
        .send(alice, r#"{"intent":"createGame","colorPreference":"w","timeControlSeconds":60,"label":"alice"}"#)
        .await
        .unwrap();
    let code = table.mirror(alice).code().cloned().unwrap();

    let join = format!(r#"{{"intent":"joinGame","code":"{}","label":"bob"}}"#, code.as_str().to_lowercase());
    table.send(bob, &join).await.unwrap();

    for (who, from, to) in [(alice, "f2", "f3"), (bob, "e7", "e5"), (alice, "g2", "g4"), (bob, "d8", "h4")] {
        table.send(who, &propose(&code, from, to)).await.unwrap();
    }

    let white = table.mirror(alice);
    let black = table.mirror(bob);

    assert_eq!(white.color(), Some(Color::White));
    assert_eq!(black.color(), Some(Color::Black));
    assert_eq!(white.opponent_label(), Some("bob"));
    assert_eq!(black.opponent_label(), Some("alice"));
    assert_eq!(white.state(), black.state());
    assert_eq!(white.state().status, Some(SessionStatus::Finished));
    assert_eq!(white.last_message(), Some("Checkmate! Black wins."));
    assert_eq!(white.history().len(), 4);

    assert_eq!(
        table.send(alice, &propose(&code, "e2", "e4")).await,
        Err(SessionError::NotActive)
    );
}

#[tokio::test]
async fn test_resync_rebuilds_a_reconnecting_mirror() {
    let table = Table::new();
    let alice = ConnectionId::new();
    let bob = ConnectionId::new();

    table.send(alice, r#"{"intent":"createGame","colorPreference":"b"}"#).await.unwrap();
    let code = table.mirror(alice).code().cloned().unwrap();
    table
        .send(bob, &format!(r#"{{"intent":"joinGame","code":"{code}"}}"#))
        .await
        .unwrap();
    for (who, from, to) in [(bob, "e2", "e4"), (alice, "d7", "d5"), (bob, "e4", "d5")] {
        table.send(who, &propose(&code, from, to)).await.unwrap();
    }

    let observer = ConnectionId::new();
    table
        .send(observer, &format!(r#"{{"intent":"resync","code":"{code}"}}"#))
        .await
        .unwrap();

    let live = table.mirror(bob);
    let rebuilt = table.mirror(observer);

    assert_eq!(rebuilt.state(), live.state());
    assert_eq!(rebuilt.history(), live.history());
    assert_eq!(rebuilt.state().captured.by(Color::White).len(), 1);
    assert!(!rebuilt.needs_resync());
}

#[tokio::test]
async fn test_malformed_and_refused_intents() {
    let table = Table::new();
    let alice = ConnectionId::new();

    assert_eq!(table.send(alice, "{").await, Err(SessionError::MalformedIntent));
    assert_eq!(
        table.send(alice, r#"{"intent":"joinGame","code":"NOPE00"}"#).await,
        Err(SessionError::NotFound)
    );
    assert!(table.outbox.deliveries().is_empty());

    let event = ServerEvent::rejected("joinGame", SessionError::NotFound);
    let mut mirror = LocalMirror::new();
    mirror.apply(&event);
    assert_eq!(mirror.last_rejection(), Some(SessionError::NotFound));
}
