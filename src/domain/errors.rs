use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

/// Why a participant intent was refused.
///
/// Every variant is reported to the originating connection only and leaves the session
/// untouched.
#[derive(Clone, Copy, Debug, Display, Error, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionError {
    #[display(fmt = "Game not found")]
    NotFound,
    #[display(fmt = "Game is full")]
    Full,
    #[display(fmt = "Game already in progress")]
    AlreadyStarted,
    #[display(fmt = "Already seated in this game")]
    AlreadySeated,
    #[display(fmt = "Not your turn")]
    NotYourTurn,
    #[display(fmt = "Game is not active")]
    NotActive,
    #[display(fmt = "Invalid move")]
    IllegalMove,
    #[display(fmt = "No free game code available")]
    CapacityError,
    #[display(fmt = "Malformed intent")]
    MalformedIntent,
}
