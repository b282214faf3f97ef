use crate::domain::errors::SessionError;
use crate::domain::ledger::CapturedLedger;
use crate::domain::models::{
    Color, ConnectionId, MoveRecord, ParticipantView, RemainingTime, SessionCode, SessionStatus,
    TerminalReason,
};
use serde::{Deserialize, Serialize};

/// Everything a participant can receive from the server.
///
/// State-carrying events hold the complete resulting state rather than a diff, so applying
/// one twice is the same as applying it once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    GameCreated {
        code: SessionCode,
        color: Color,
        position: String,
        remaining_time: RemainingTime,
        time_control_seconds: u32,
    },
    #[serde(rename_all = "camelCase")]
    GameJoined {
        code: SessionCode,
        color: Color,
        position: String,
        opponent_label: String,
        side_to_move: Color,
        remaining_time: RemainingTime,
        time_control_seconds: u32,
    },
    #[serde(rename_all = "camelCase")]
    OpponentJoined {
        position: String,
        opponent_label: String,
        side_to_move: Color,
        remaining_time: RemainingTime,
    },
    #[serde(rename_all = "camelCase")]
    MoveApplied {
        ply: usize,
        position: String,
        move_result: MoveRecord,
        side_to_move: Color,
        remaining_time: RemainingTime,
        captured: CapturedLedger,
    },
    #[serde(rename_all = "camelCase")]
    ClockUpdate {
        remaining_time: RemainingTime,
        ticking: Option<Color>,
    },
    #[serde(rename_all = "camelCase")]
    GameOver {
        position: String,
        terminal_reason: TerminalReason,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    ParticipantLeft { message: String },
    Snapshot(SessionSnapshot),
    #[serde(rename_all = "camelCase")]
    Rejected {
        intent: String,
        error: SessionError,
        message: String,
    },
}

impl ServerEvent {
    pub fn rejected(intent: &str, error: SessionError) -> Self {
        ServerEvent::Rejected {
            intent: intent.to_string(),
            error,
            message: error.to_string(),
        }
    }
}

/// The complete state of a session, as handed to a (re)synchronizing participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub code: SessionCode,
    pub status: SessionStatus,
    pub position: String,
    pub side_to_move: Color,
    pub remaining_time: RemainingTime,
    pub ticking: Option<Color>,
    pub time_control_seconds: u32,
    pub participants: Vec<ParticipantView>,
    pub history: Vec<MoveRecord>,
    pub captured: CapturedLedger,
    pub terminal_reason: Option<TerminalReason>,
}

/// Who receives an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Audience {
    Everyone,
    Only(ConnectionId),
    AllBut(ConnectionId),
}

impl Audience {
    pub fn includes(&self, connection: &ConnectionId) -> bool {
        match self {
            Audience::Everyone => true,
            Audience::Only(target) => target == connection,
            Audience::AllBut(excluded) => excluded != connection,
        }
    }
}

/// An event addressed to part of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    pub audience: Audience,
    pub event: ServerEvent,
}

impl Envelope {
    pub fn everyone(event: ServerEvent) -> Self {
        Envelope {
            audience: Audience::Everyone,
            event,
        }
    }

    pub fn only(connection: ConnectionId, event: ServerEvent) -> Self {
        Envelope {
            audience: Audience::Only(connection),
            event,
        }
    }

    pub fn all_but(connection: ConnectionId, event: ServerEvent) -> Self {
        Envelope {
            audience: Audience::AllBut(connection),
            event,
        }
    }
}
