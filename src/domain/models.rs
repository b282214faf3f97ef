use derive_more::Display;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::Not;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    #[display(fmt = "white")]
    #[serde(rename = "w", alias = "white")]
    White,
    #[display(fmt = "black")]
    #[serde(rename = "b", alias = "black")]
    Black,
}

impl Color {
    pub fn opponent(&self) -> Self {
        !*self
    }
}

impl Not for Color {
    type Output = Color;

    fn not(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

/// The creator's seating request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorPreference {
    #[serde(rename = "w", alias = "white")]
    White,
    #[serde(rename = "b", alias = "black")]
    Black,
    #[default]
    #[serde(rename = "random")]
    Random,
}

impl ColorPreference {
    pub fn resolve<R: Rng + ?Sized>(self, rng: &mut R) -> Color {
        match self {
            ColorPreference::White => Color::White,
            ColorPreference::Black => Color::Black,
            ColorPreference::Random if rng.gen_bool(0.5) => Color::White,
            ColorPreference::Random => Color::Black,
        }
    }
}

/// Named time-control presets offered by the lobby.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Blitz,
    Speed,
    Classic,
    Long,
}

impl GameType {
    pub fn seconds(&self) -> u32 {
        match self {
            GameType::Blitz => 3 * 60,
            GameType::Speed => 5 * 60,
            GameType::Classic => 10 * 60,
            GameType::Long => 30 * 60,
        }
    }
}

/// A request to open a new session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGame {
    #[serde(default)]
    pub color_preference: ColorPreference,
    /// Explicit allotment per side; wins over `game_type`.
    #[serde(default)]
    pub time_control_seconds: Option<u32>,
    #[serde(default)]
    pub game_type: Option<GameType>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Waiting,
    Active,
    Finished,
}

/// Short human-shareable session identifier.
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCode(String);

impl SessionCode {
    /// Normalises user input the way codes are handed out: trimmed and upper-cased.
    pub fn parse(raw: &str) -> Self {
        SessionCode(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionCode {
    fn from(raw: &str) -> Self {
        SessionCode::parse(raw)
    }
}

/// Identity of one live transport connection.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        ConnectionId(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    pub connection: ConnectionId,
    pub color: Color,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantView {
    pub color: Color,
    pub label: String,
}

impl From<&Participant> for ParticipantView {
    fn from(p: &Participant) -> Self {
        ParticipantView {
            color: p.color,
            label: p.label.clone(),
        }
    }
}

/// Piece vocabulary shared with the position authority (`p`, `n`, `b`, `r`, `q`, `k`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    #[serde(rename = "p")]
    Pawn,
    #[serde(rename = "n")]
    Knight,
    #[serde(rename = "b")]
    Bishop,
    #[serde(rename = "r")]
    Rook,
    #[serde(rename = "q")]
    Queen,
    #[serde(rename = "k")]
    King,
}

impl PieceKind {
    pub fn char(&self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

/// A participant's proposed move; squares use the authority's own addressing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveIntent {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceKind>,
}

impl MoveIntent {
    pub fn new(from: &str, to: &str) -> Self {
        MoveIntent {
            from: from.to_string(),
            to: to.to_string(),
            promotion: None,
        }
    }

    pub fn promoting(mut self, piece: PieceKind) -> Self {
        self.promotion = Some(piece);
        self
    }
}

/// The authority's account of an applied move.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub color: Color,
    pub from: String,
    pub to: String,
    pub piece: PieceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured: Option<PieceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceKind>,
    pub san: String,
}

impl MoveRecord {
    /// The intent that reproduces this move.
    pub fn intent(&self) -> MoveIntent {
        MoveIntent {
            from: self.from.clone(),
            to: self.to.clone(),
            promotion: self.promotion,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainingTime {
    pub white: u32,
    pub black: u32,
}

impl RemainingTime {
    pub fn of(&self, color: Color) -> u32 {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalKind {
    Checkmate,
    Stalemate,
    Repetition,
    InsufficientMaterial,
    FiftyMoveRule,
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TerminalReason {
    #[display(fmt = "Checkmate! {} wins.", "Capitalized(*winner)")]
    Checkmate { winner: Color },
    #[display(fmt = "Stalemate!")]
    Stalemate,
    #[display(fmt = "Draw by threefold repetition.")]
    Repetition,
    #[display(fmt = "Draw by insufficient material.")]
    InsufficientMaterial,
    #[display(fmt = "Draw by the fifty-move rule.")]
    FiftyMoveRule,
    #[display(fmt = "{} wins on time.", "Capitalized(*winner)")]
    Timeout { winner: Color },
    #[display(fmt = "Opponent disconnected. {} wins.", "Capitalized(*winner)")]
    OpponentDeparted { winner: Color },
}

impl TerminalReason {
    /// Classifies an authority verdict; `to_move` is the side that cannot continue.
    pub fn from_terminal(kind: TerminalKind, to_move: Color) -> Self {
        match kind {
            TerminalKind::Checkmate => TerminalReason::Checkmate { winner: !to_move },
            TerminalKind::Stalemate => TerminalReason::Stalemate,
            TerminalKind::Repetition => TerminalReason::Repetition,
            TerminalKind::InsufficientMaterial => TerminalReason::InsufficientMaterial,
            TerminalKind::FiftyMoveRule => TerminalReason::FiftyMoveRule,
        }
    }

    pub fn winner(&self) -> Option<Color> {
        match *self {
            TerminalReason::Checkmate { winner }
            | TerminalReason::Timeout { winner }
            | TerminalReason::OpponentDeparted { winner } => Some(winner),
            _ => None,
        }
    }
}

struct Capitalized(Color);

impl std::fmt::Display for Capitalized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Color::White => f.write_str("White"),
            Color::Black => f.write_str("Black"),
        }
    }
}
