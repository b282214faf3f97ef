use crate::domain::errors::SessionError;
use crate::domain::events::ServerEvent;
use crate::domain::ledger::CapturedLedger;
use crate::domain::models::{
    Color, MoveRecord, RemainingTime, SessionCode, SessionStatus, TerminalReason,
};

/// What a participant's board shows; every broadcast carries all of it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MirrorState {
    pub status: Option<SessionStatus>,
    pub position: Option<String>,
    pub side_to_move: Option<Color>,
    pub remaining_time: Option<RemainingTime>,
    pub ticking: Option<Color>,
    pub captured: CapturedLedger,
    pub terminal_reason: Option<TerminalReason>,
}

/// A participant-side copy of a session, fed only by server events.
///
/// The mirror never predicts: it shows what the server last said. State-carrying events
/// replace state wholesale, so a repeated or stale event is harmless, and a `snapshot`
/// brings a fresh mirror fully up to date.
#[derive(Clone, Debug, Default)]
pub struct LocalMirror {
    code: Option<SessionCode>,
    color: Option<Color>,
    opponent_label: Option<String>,
    state: MirrorState,
    history: Vec<MoveRecord>,
    needs_resync: bool,
    last_message: Option<String>,
    last_rejection: Option<SessionError>,
}

impl LocalMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::GameCreated {
                code,
                color,
                position,
                remaining_time,
                ..
            } => {
                self.code = Some(code.clone());
                self.color = Some(*color);
                self.opponent_label = None;
                self.history.clear();
                self.needs_resync = false;
                self.state = MirrorState {
                    status: Some(SessionStatus::Waiting),
                    position: Some(position.clone()),
                    remaining_time: Some(*remaining_time),
                    ..MirrorState::default()
                };
            }
            ServerEvent::GameJoined {
                code,
                color,
                position,
                opponent_label,
                side_to_move,
                remaining_time,
                ..
            } => {
                self.code = Some(code.clone());
                self.color = Some(*color);
                self.opponent_label = Some(opponent_label.clone());
                self.history.clear();
                self.needs_resync = false;
                self.state = MirrorState {
                    status: Some(SessionStatus::Active),
                    position: Some(position.clone()),
                    side_to_move: Some(*side_to_move),
                    remaining_time: Some(*remaining_time),
                    ticking: Some(*side_to_move),
                    ..MirrorState::default()
                };
            }
            ServerEvent::OpponentJoined {
                position,
                opponent_label,
                side_to_move,
                remaining_time,
            } => {
                self.opponent_label = Some(opponent_label.clone());
                self.state.status = Some(SessionStatus::Active);
                self.state.position = Some(position.clone());
                self.state.side_to_move = Some(*side_to_move);
                self.state.remaining_time = Some(*remaining_time);
                self.state.ticking = Some(*side_to_move);
            }
            ServerEvent::MoveApplied {
                ply,
                position,
                move_result,
                side_to_move,
                remaining_time,
                captured,
            } => {
                let known = self.history.len();
                if *ply <= known {
                    return;
                }

                if *ply == known + 1 {
                    self.history.push(move_result.clone());
                } else {
                    self.needs_resync = true;
                }

                if self.state.status != Some(SessionStatus::Finished) {
                    self.state.status = Some(SessionStatus::Active);
                }
                self.state.position = Some(position.clone());
                self.state.side_to_move = Some(*side_to_move);
                self.state.remaining_time = Some(*remaining_time);
                self.state.ticking = Some(*side_to_move);
                self.state.captured = captured.clone();
            }
            ServerEvent::ClockUpdate {
                remaining_time,
                ticking,
            } => {
                self.state.remaining_time = Some(*remaining_time);
                self.state.ticking = *ticking;
            }
            ServerEvent::GameOver {
                position,
                terminal_reason,
                message,
            } => {
                self.state.status = Some(SessionStatus::Finished);
                self.state.position = Some(position.clone());
                self.state.terminal_reason = Some(*terminal_reason);
                self.state.ticking = None;
                self.last_message = Some(message.clone());
            }
            ServerEvent::ParticipantLeft { message } => {
                if self.state.status == Some(SessionStatus::Active) {
                    self.state.terminal_reason =
                        self.color.map(|winner| TerminalReason::OpponentDeparted { winner });
                }
                self.state.status = Some(SessionStatus::Finished);
                self.state.ticking = None;
                self.opponent_label = None;
                self.last_message = Some(message.clone());
            }
            ServerEvent::Snapshot(snapshot) => {
                self.code = Some(snapshot.code.clone());
                if let Some(color) = self.color {
                    self.opponent_label = snapshot
                        .participants
                        .iter()
                        .find(|p| p.color != color)
                        .map(|p| p.label.clone());
                }
                self.needs_resync = false;
                self.state = MirrorState {
                    status: Some(snapshot.status),
                    position: Some(snapshot.position.clone()),
                    side_to_move: Some(snapshot.side_to_move),
                    remaining_time: Some(snapshot.remaining_time),
                    ticking: snapshot.ticking,
                    captured: snapshot.captured.clone(),
                    terminal_reason: snapshot.terminal_reason,
                };
                self.history = snapshot.history.clone();
            }
            ServerEvent::Rejected { error, .. } => {
                self.last_rejection = Some(*error);
            }
        }
    }

    pub fn state(&self) -> &MirrorState {
        &self.state
    }

    /// Moves seen so far; complete unless [`LocalMirror::needs_resync`] says otherwise.
    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn code(&self) -> Option<&SessionCode> {
        self.code.as_ref()
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn opponent_label(&self) -> Option<&str> {
        self.opponent_label.as_deref()
    }

    /// Whether it is this participant's move in an active game.
    pub fn my_turn(&self) -> bool {
        self.state.status == Some(SessionStatus::Active)
            && self.color.is_some()
            && self.color == self.state.side_to_move
    }

    /// Set when a move broadcast arrived out of order; a `resync` clears it.
    pub fn needs_resync(&self) -> bool {
        self.needs_resync
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    pub fn last_rejection(&self) -> Option<SessionError> {
        self.last_rejection
    }
}
