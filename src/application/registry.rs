use crate::application::outbox::{Outbox, dispatch};
use crate::application::ticker;
use crate::config::AppConfig;
use crate::domain::authority::PositionAuthority;
use crate::domain::errors::SessionError;
use crate::domain::events::{ServerEvent, SessionSnapshot};
use crate::domain::models::{
    Color, ConnectionId, MoveIntent, NewGame, SessionCode, SessionStatus,
};
use crate::domain::session::{Command, MatchSession};
use crate::infrastructure::codes::CodeSource;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

const DEFAULT_LABEL: &str = "Anonymous";

type SharedSession<A> = Arc<Mutex<MatchSession<A>>>;

/// Knobs the registry takes from configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrySettings {
    pub default_time_control_seconds: u32,
    pub max_time_control_seconds: u32,
    pub max_code_attempts: usize,
    /// Wall-clock length of one clock unit; `None` leaves ticking to the caller.
    pub tick_interval: Option<Duration>,
}

impl RegistrySettings {
    pub fn from_config(config: &AppConfig) -> Self {
        RegistrySettings {
            default_time_control_seconds: config.clock.default_time_control_seconds,
            max_time_control_seconds: config.clock.max_time_control_seconds,
            max_code_attempts: config.codes.max_attempts,
            tick_interval: Some(Duration::from_millis(config.clock.tick_millis.max(1))),
        }
    }

    /// Explicit seconds, then the preset, then the default; clamped to `1..=max`.
    pub fn time_control(&self, request: &NewGame) -> u32 {
        request
            .time_control_seconds
            .or(request.game_type.map(|t| t.seconds()))
            .unwrap_or(self.default_time_control_seconds)
            .clamp(1, self.max_time_control_seconds.max(1))
    }
}

impl Default for RegistrySettings {
    fn default() -> Self {
        RegistrySettings::from_config(&AppConfig::default())
    }
}

/// Maps session codes to live sessions and connections to the session they sit in.
///
/// Commands for one session are serialized by that session's lock; different sessions proceed
/// independently. A session is destroyed as soon as its last participant departs.
pub struct SessionRegistry<A: PositionAuthority> {
    sessions: DashMap<SessionCode, SharedSession<A>>,
    seats: DashMap<ConnectionId, SessionCode>,
    authority: Arc<A>,
    codes: Box<dyn CodeSource>,
    outbox: Arc<dyn Outbox>,
    settings: RegistrySettings,
}

impl<A: PositionAuthority> SessionRegistry<A> {
    pub fn new(
        authority: Arc<A>,
        codes: impl CodeSource + 'static,
        outbox: Arc<dyn Outbox>,
        settings: RegistrySettings,
    ) -> Self {
        SessionRegistry {
            sessions: DashMap::new(),
            seats: DashMap::new(),
            authority,
            codes: Box::new(codes),
            outbox,
            settings,
        }
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// Opens a session with `connection` seated and delivers `gameCreated` to it.
    ///
    /// A connection already seated elsewhere departs that session first.
    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        connection: ConnectionId,
        request: NewGame,
    ) -> Result<SessionCode, SessionError> {
        self.depart(connection).await;

        let time_control = self.settings.time_control(&request);
        let color = request.color_preference.resolve(&mut rand::thread_rng());
        let label = label_or_default(request.label);

        for attempt in 1..=self.settings.max_code_attempts {
            let code = self.codes.next_code();

            let Entry::Vacant(slot) = self.sessions.entry(code.clone()) else {
                debug!(attempt, %code, "session code collision");
                continue;
            };

            let (session, created) = MatchSession::create(
                code.clone(),
                Arc::clone(&self.authority),
                connection,
                label,
                color,
                time_control,
            );
            slot.insert(Arc::new(Mutex::new(session)));
            self.seats.insert(connection, code.clone());

            self.outbox.deliver(connection, created.event);
            return Ok(code);
        }

        warn!(
            attempts = self.settings.max_code_attempts,
            "no free session code"
        );
        Err(SessionError::CapacityError)
    }

    /// Seats `connection` as the second participant and starts the game.
    ///
    /// The code is matched case-insensitively. On success the connection leaves any other
    /// session it sat in.
    #[instrument(skip(self, label))]
    pub async fn join(
        &self,
        connection: ConnectionId,
        code: &str,
        label: Option<String>,
    ) -> Result<Color, SessionError> {
        let code = SessionCode::parse(code);
        let session = self.lookup(&code)?;

        let mut guard = session.lock().await;
        let envelopes = guard.handle(Command::Join {
            connection,
            label: label_or_default(label),
        })?;
        let color = guard
            .seat(&connection)
            .map(|p| p.color)
            .ok_or(SessionError::NotFound)?;
        dispatch(self.outbox.as_ref(), guard.participants(), envelopes);
        let started = guard.status() == SessionStatus::Active;
        drop(guard);

        if let Some(previous) = self.seats.insert(connection, code.clone()) {
            if previous != code {
                self.depart_from(connection, &previous).await;
            }
        }

        if started {
            self.start_clock(&session);
        }

        Ok(color)
    }

    #[instrument(skip(self, intent))]
    pub async fn propose_move(
        &self,
        connection: ConnectionId,
        code: &str,
        intent: MoveIntent,
    ) -> Result<(), SessionError> {
        let session = self.lookup(&SessionCode::parse(code))?;

        let mut guard = session.lock().await;
        let envelopes = guard.handle(Command::ProposeMove { connection, intent })?;
        dispatch(self.outbox.as_ref(), guard.participants(), envelopes);

        Ok(())
    }

    /// Removes `connection` from whatever session it sits in; a no-op for unseated connections.
    #[instrument(skip(self))]
    pub async fn depart(&self, connection: ConnectionId) {
        if let Some((_, code)) = self.seats.remove(&connection) {
            self.depart_from(connection, &code).await;
        }
    }

    async fn depart_from(&self, connection: ConnectionId, code: &SessionCode) {
        let Ok(session) = self.lookup(code) else {
            return;
        };

        let mut guard = session.lock().await;
        let envelopes = guard
            .handle(Command::Depart { connection })
            .unwrap_or_default();
        dispatch(self.outbox.as_ref(), guard.participants(), envelopes);
        let empty = guard.is_empty();
        drop(guard);

        if empty
            && self
                .sessions
                .remove_if(code, |_, s| Arc::ptr_eq(s, &session))
                .is_some()
        {
            info!(%code, "session destroyed");
        }
    }

    /// Delivers the session's full state to `connection` as a `snapshot` event.
    pub async fn resync(&self, connection: ConnectionId, code: &str) -> Result<(), SessionError> {
        let snapshot = self.snapshot(code).await?;
        self.outbox
            .deliver(connection, ServerEvent::Snapshot(snapshot));
        Ok(())
    }

    pub async fn snapshot(&self, code: &str) -> Result<SessionSnapshot, SessionError> {
        let session = self.lookup(&SessionCode::parse(code))?;
        let guard = session.lock().await;
        Ok(guard.snapshot())
    }

    /// Advances one session's clock by a single unit and returns its status afterwards.
    pub async fn tick(&self, code: &str) -> Result<SessionStatus, SessionError> {
        let session = self.lookup(&SessionCode::parse(code))?;

        let mut guard = session.lock().await;
        let envelopes = guard.handle(Command::Tick)?;
        dispatch(self.outbox.as_ref(), guard.participants(), envelopes);

        Ok(guard.status())
    }

    /// The session `connection` currently sits in.
    pub fn seat_of(&self, connection: &ConnectionId) -> Option<SessionCode> {
        self.seats.get(connection).map(|code| code.value().clone())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.sessions.contains_key(&SessionCode::parse(code))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn lookup(&self, code: &SessionCode) -> Result<SharedSession<A>, SessionError> {
        self.sessions
            .get(code)
            .map(|s| Arc::clone(s.value()))
            .ok_or(SessionError::NotFound)
    }

    fn start_clock(&self, session: &SharedSession<A>) {
        if let Some(period) = self.settings.tick_interval {
            ticker::spawn(Arc::clone(session), Arc::clone(&self.outbox), period);
        }
    }
}

fn label_or_default(label: Option<String>) -> String {
    label
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LABEL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::outbox::MemoryOutbox;
    use crate::domain::models::{ColorPreference, GameType};
    use crate::infrastructure::codes::MockCodeSource;
    use crate::infrastructure::standard_chess::StandardChess;

    fn settings() -> RegistrySettings {
        RegistrySettings {
            default_time_control_seconds: 300,
            max_time_control_seconds: 600,
            max_code_attempts: 3,
            tick_interval: None,
        }
    }

    fn registry(codes: MockCodeSource) -> SessionRegistry<StandardChess> {
        SessionRegistry::new(
            Arc::new(StandardChess),
            codes,
            Arc::new(MemoryOutbox::new()),
            settings(),
        )
    }

    #[test]
    fn time_control_prefers_explicit_seconds_and_clamps() {
        let settings = settings();
        let request = |seconds, game_type| NewGame {
            time_control_seconds: seconds,
            game_type,
            ..NewGame::default()
        };

        assert_eq!(settings.time_control(&request(None, None)), 300);
        assert_eq!(settings.time_control(&request(None, Some(GameType::Blitz))), 180);
        assert_eq!(settings.time_control(&request(Some(42), Some(GameType::Long))), 42);
        assert_eq!(settings.time_control(&request(Some(0), None)), 1);
        assert_eq!(settings.time_control(&request(None, Some(GameType::Long))), 600);
    }

    #[test]
    fn blank_labels_fall_back() {
        assert_eq!(label_or_default(None), "Anonymous");
        assert_eq!(label_or_default(Some("  ".into())), "Anonymous");
        assert_eq!(label_or_default(Some(" ann ".into())), "ann");
    }

    #[tokio::test]
    async fn colliding_codes_are_retried() {
        let mut codes = MockCodeSource::new();
        let mut sequence = mockall::Sequence::new();
        for code in ["AAAAAA", "AAAAAA", "BBBBBB"] {
            codes
                .expect_next_code()
                .times(1)
                .in_sequence(&mut sequence)
                .return_const(SessionCode::parse(code));
        }

        let registry = registry(codes);
        let first = registry.create(ConnectionId::new(), NewGame::default()).await;
        let second = registry.create(ConnectionId::new(), NewGame::default()).await;

        assert_eq!(first, Ok(SessionCode::parse("AAAAAA")));
        assert_eq!(second, Ok(SessionCode::parse("BBBBBB")));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn exhausting_attempts_is_a_capacity_error() {
        let mut codes = MockCodeSource::new();
        codes
            .expect_next_code()
            .times(4)
            .return_const(SessionCode::parse("SAME01"));

        let registry = registry(codes);
        registry
            .create(ConnectionId::new(), NewGame::default())
            .await
            .unwrap();

        let request = NewGame {
            color_preference: ColorPreference::White,
            ..NewGame::default()
        };
        assert_eq!(
            registry.create(ConnectionId::new(), request).await,
            Err(SessionError::CapacityError)
        );
        assert_eq!(registry.len(), 1);
    }
}
