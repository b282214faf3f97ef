use crate::domain::models::{Color, MoveIntent, MoveRecord, TerminalKind};
use derive_more::{Display, Error};
use std::fmt::Debug;

/// The authority refused a move intent.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
#[display(fmt = "illegal move {}{}", "intent.from", "intent.to")]
pub struct IllegalMove {
    pub intent: MoveIntent,
}

/// Chess rules as seen by a match session.
///
/// Positions are opaque to sessions: they are only ever produced and consumed here.
#[cfg_attr(test, mockall::automock(type Position = u32;))]
pub trait PositionAuthority: Send + Sync + 'static {
    type Position: Clone + Debug + PartialEq + Send + Sync + 'static;

    /// The position every game starts from.
    fn initial(&self) -> Self::Position;

    /// Plays `intent` on `position` if legal.
    fn apply(
        &self,
        position: &Self::Position,
        intent: &MoveIntent,
    ) -> Result<(Self::Position, MoveRecord), IllegalMove>;

    fn side_to_move(&self, position: &Self::Position) -> Color;

    /// Whether the game can no longer continue from `position`, and why.
    fn terminal(&self, position: &Self::Position) -> Option<TerminalKind>;

    /// The notation participants receive for `position`.
    fn encode(&self, position: &Self::Position) -> String;
}
