use crate::domain::authority::{IllegalMove, PositionAuthority};
use crate::domain::clock::Clock;
use crate::domain::errors::SessionError;
use crate::domain::events::{Envelope, ServerEvent, SessionSnapshot};
use crate::domain::ledger::CapturedLedger;
use crate::domain::models::{
    Color, ConnectionId, MoveIntent, MoveRecord, Participant, SessionCode, SessionStatus,
    TerminalReason,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const DEPARTURE_MESSAGE: &str = "Opponent disconnected";

/// A mutation request against one session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Join {
        connection: ConnectionId,
        label: String,
    },
    ProposeMove {
        connection: ConnectionId,
        intent: MoveIntent,
    },
    Depart {
        connection: ConnectionId,
    },
    Tick,
}

/// One game between two connections.
///
/// The session is the sole writer of its position, history, ledger, clock and status. Every
/// mutation goes through [`MatchSession::handle`], which either fails without touching
/// anything or returns the events describing the new state.
pub struct MatchSession<A: PositionAuthority> {
    code: SessionCode,
    authority: Arc<A>,
    initial: A::Position,
    position: A::Position,
    participants: Vec<Participant>,
    history: Vec<MoveRecord>,
    captured: CapturedLedger,
    clock: Clock,
    status: SessionStatus,
    time_control_seconds: u32,
    terminal_reason: Option<TerminalReason>,
}

impl<A: PositionAuthority> MatchSession<A> {
    /// Opens a session seating its creator; the returned envelope confirms the seat.
    #[instrument(level = "debug", skip(authority, label))]
    pub fn create(
        code: SessionCode,
        authority: Arc<A>,
        creator: ConnectionId,
        label: String,
        color: Color,
        time_control_seconds: u32,
    ) -> (Self, Envelope) {
        let initial = authority.initial();
        let session = MatchSession {
            code,
            position: initial.clone(),
            initial,
            authority,
            participants: vec![Participant {
                connection: creator,
                color,
                label,
            }],
            history: Vec::new(),
            captured: CapturedLedger::default(),
            clock: Clock::new(time_control_seconds),
            status: SessionStatus::Waiting,
            time_control_seconds,
            terminal_reason: None,
        };

        info!(code = %session.code, %color, time_control_seconds, "game created");

        let created = ServerEvent::GameCreated {
            code: session.code.clone(),
            color,
            position: session.encoded(),
            remaining_time: session.clock.snapshot(),
            time_control_seconds,
        };

        (session, Envelope::only(creator, created))
    }

    #[instrument(level = "debug", skip(self), fields(code = %self.code))]
    pub fn handle(&mut self, command: Command) -> Result<Vec<Envelope>, SessionError> {
        match command {
            Command::Join { connection, label } => self.join(connection, label),
            Command::ProposeMove { connection, intent } => self.propose_move(connection, &intent),
            Command::Depart { connection } => Ok(self.depart(connection)),
            Command::Tick => Ok(self.tick()),
        }
    }

    fn join(&mut self, connection: ConnectionId, label: String) -> Result<Vec<Envelope>, SessionError> {
        if self.seat(&connection).is_some() {
            return Err(SessionError::AlreadySeated);
        }

        if self.participants.len() >= 2 {
            warn!(%connection, "join refused, game is full");
            return Err(SessionError::Full);
        }

        if self.status != SessionStatus::Waiting {
            warn!(%connection, status = ?self.status, "join refused, game already started");
            return Err(SessionError::AlreadyStarted);
        }

        let creator = self.participants.first().cloned().ok_or(SessionError::NotFound)?;
        let color = !creator.color;

        self.participants.push(Participant {
            connection,
            color,
            label: label.clone(),
        });
        self.status = SessionStatus::Active;

        let to_move = self.authority.side_to_move(&self.position);
        self.clock.start(to_move);

        info!(%connection, %color, "opponent joined, game started");

        let position = self.encoded();
        let remaining_time = self.clock.snapshot();

        Ok(vec![
            Envelope::only(
                connection,
                ServerEvent::GameJoined {
                    code: self.code.clone(),
                    color,
                    position: position.clone(),
                    opponent_label: creator.label,
                    side_to_move: to_move,
                    remaining_time,
                    time_control_seconds: self.time_control_seconds,
                },
            ),
            Envelope::all_but(
                connection,
                ServerEvent::OpponentJoined {
                    position,
                    opponent_label: label,
                    side_to_move: to_move,
                    remaining_time,
                },
            ),
        ])
    }

    fn propose_move(
        &mut self,
        connection: ConnectionId,
        intent: &MoveIntent,
    ) -> Result<Vec<Envelope>, SessionError> {
        if self.status != SessionStatus::Active {
            warn!(%connection, status = ?self.status, "move refused, game not active");
            return Err(SessionError::NotActive);
        }

        let to_move = self.authority.side_to_move(&self.position);

        // An exhausted clock outranks whatever the authority would say about the move.
        if self.clock.remaining(to_move) == 0 {
            warn!(%connection, %to_move, "move refused, clock exhausted");
            return Err(SessionError::NotActive);
        }

        match self.seat(&connection) {
            Some(mover) if mover.color == to_move => {}
            seat => {
                warn!(%connection, color = ?seat.map(|p| p.color), %to_move, "move refused, not on move");
                return Err(SessionError::NotYourTurn);
            }
        }

        let (position, record) = self.authority.apply(&self.position, intent).map_err(|e| {
            warn!(%connection, error = %e, "move refused by the authority");
            SessionError::IllegalMove
        })?;

        self.position = position;
        if let Some(piece) = self.captured.record(&record) {
            debug!(%piece, capturer = %record.color, "piece captured");
        }
        self.history.push(record.clone());

        let next = self.authority.side_to_move(&self.position);
        let terminal = self.authority.terminal(&self.position);

        match terminal {
            Some(_) => self.clock.stop(),
            None => self.clock.start(next),
        }

        info!(ply = self.history.len(), san = %record.san, %next, "move applied");

        let mut envelopes = vec![Envelope::everyone(ServerEvent::MoveApplied {
            ply: self.history.len(),
            position: self.encoded(),
            move_result: record,
            side_to_move: next,
            remaining_time: self.clock.snapshot(),
            captured: self.captured.clone(),
        })];

        if let Some(kind) = terminal {
            envelopes.push(self.finish(TerminalReason::from_terminal(kind, next)));
        }

        Ok(envelopes)
    }

    fn depart(&mut self, connection: ConnectionId) -> Vec<Envelope> {
        let Some(index) = self.participants.iter().position(|p| p.connection == connection) else {
            return Vec::new();
        };

        let leaving = self.participants.remove(index);
        info!(%connection, color = %leaving.color, "participant departed");

        if self.participants.is_empty() {
            self.clock.stop();
            return Vec::new();
        }

        if self.status == SessionStatus::Active {
            self.status = SessionStatus::Finished;
            self.terminal_reason = Some(TerminalReason::OpponentDeparted {
                winner: !leaving.color,
            });
            self.clock.stop();
            info!(reason = ?self.terminal_reason, "game finished");
        }

        vec![Envelope::everyone(ServerEvent::ParticipantLeft {
            message: DEPARTURE_MESSAGE.to_string(),
        })]
    }

    fn tick(&mut self) -> Vec<Envelope> {
        if self.status != SessionStatus::Active {
            return Vec::new();
        }

        let expired = self.clock.tick();
        debug!(remaining = ?self.clock.snapshot(), "tick");

        let mut envelopes = vec![Envelope::everyone(ServerEvent::ClockUpdate {
            remaining_time: self.clock.snapshot(),
            ticking: self.clock.ticking(),
        })];

        if let Some(color) = expired {
            envelopes.push(self.finish(TerminalReason::Timeout { winner: !color }));
        }

        envelopes
    }

    fn finish(&mut self, reason: TerminalReason) -> Envelope {
        debug_assert_eq!(self.status, SessionStatus::Active);

        self.status = SessionStatus::Finished;
        self.terminal_reason = Some(reason);
        self.clock.stop();

        info!(%reason, "game finished");

        Envelope::everyone(ServerEvent::GameOver {
            position: self.encoded(),
            terminal_reason: reason,
            message: reason.to_string(),
        })
    }

    fn encoded(&self) -> String {
        self.authority.encode(&self.position)
    }

    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn position(&self) -> &A::Position {
        &self.position
    }

    pub fn side_to_move(&self) -> Color {
        self.authority.side_to_move(&self.position)
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn seat(&self, connection: &ConnectionId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.connection == connection)
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn captured(&self) -> &CapturedLedger {
        &self.captured
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn time_control_seconds(&self) -> u32 {
        self.time_control_seconds
    }

    pub fn terminal_reason(&self) -> Option<TerminalReason> {
        self.terminal_reason
    }

    /// Replays the move history from the initial position through the authority.
    pub fn replay(&self) -> Result<A::Position, IllegalMove> {
        self.history.iter().try_fold(self.initial.clone(), |position, record| {
            self.authority
                .apply(&position, &record.intent())
                .map(|(next, _)| next)
        })
    }

    /// The full state, with the captured ledger rebuilt from history.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            code: self.code.clone(),
            status: self.status,
            position: self.encoded(),
            side_to_move: self.side_to_move(),
            remaining_time: self.clock.snapshot(),
            ticking: self.clock.ticking(),
            time_control_seconds: self.time_control_seconds,
            participants: self.participants.iter().map(Into::into).collect(),
            history: self.history.clone(),
            captured: CapturedLedger::from_history(&self.history),
            terminal_reason: self.terminal_reason,
        }
    }
}
