use crate::domain::models::{Color, MoveRecord, PieceKind};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A piece taken off the board, tagged with the color it belonged to.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display(fmt = "{}{}", "color_letter(*color)", "kind.char().to_ascii_uppercase()")]
pub struct CapturedPiece {
    pub color: Color,
    pub kind: PieceKind,
}

fn color_letter(color: Color) -> char {
    match color {
        Color::White => 'w',
        Color::Black => 'b',
    }
}

type Captures = SmallVec<[CapturedPiece; 16]>;

/// Captured material, filed under the color that made the capture.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedLedger {
    #[serde(rename = "w")]
    white: Captures,
    #[serde(rename = "b")]
    black: Captures,
}

impl CapturedLedger {
    /// Rebuilds the ledger from scratch; only resynchronization needs this.
    pub fn from_history<'a>(history: impl IntoIterator<Item = &'a MoveRecord>) -> Self {
        let mut ledger = CapturedLedger::default();
        for record in history {
            ledger.record(record);
        }
        ledger
    }

    /// Files the piece captured by `record`, if any, under the mover's entry.
    pub fn record(&mut self, record: &MoveRecord) -> Option<CapturedPiece> {
        let kind = record.captured?;
        let piece = CapturedPiece {
            color: !record.color,
            kind,
        };

        self.entry_mut(record.color).push(piece);
        Some(piece)
    }

    /// Pieces captured by `capturer`, in capture order.
    pub fn by(&self, capturer: Color) -> &[CapturedPiece] {
        match capturer {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    fn entry_mut(&mut self, capturer: Color) -> &mut Captures {
        match capturer {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }
}
