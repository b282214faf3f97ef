use crate::domain::authority::{IllegalMove, PositionAuthority};
use crate::domain::models::{Color, MoveIntent, MoveRecord, PieceKind, TerminalKind};
use shakmaty as sm;
use shakmaty::zobrist::{Zobrist64, ZobristHash};

/// Repetitions of one position that end the game.
const REPETITION_LIMIT: usize = 3;

/// Halfmoves without a capture or pawn advance that end the game.
const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// A standard chess position together with the positions since the last irreversible move.
#[derive(Clone, Debug)]
pub struct StandardPosition {
    chess: sm::Chess,
    seen: Vec<Zobrist64>,
}

impl StandardPosition {
    fn new(chess: sm::Chess) -> Self {
        let seen = vec![key(&chess)];
        StandardPosition { chess, seen }
    }

    /// Parses a position from FEN; repetition tracking starts afresh.
    pub fn from_fen(fen: &str) -> Option<Self> {
        let fen: sm::fen::Fen = fen.parse().ok()?;
        let chess: sm::Chess = fen.into_position(sm::CastlingMode::Standard).ok()?;
        Some(StandardPosition::new(chess))
    }

    pub fn fen(&self) -> String {
        sm::fen::Fen::from_position(self.chess.clone(), sm::EnPassantMode::Legal).to_string()
    }

    pub fn is_check(&self) -> bool {
        sm::Position::is_check(&self.chess)
    }

    fn repetitions(&self) -> usize {
        let current = key(&self.chess);
        self.seen.iter().filter(|k| **k == current).count()
    }
}

impl PartialEq for StandardPosition {
    fn eq(&self, other: &Self) -> bool {
        self.seen == other.seen && self.fen() == other.fen()
    }
}

fn key(chess: &sm::Chess) -> Zobrist64 {
    ZobristHash::zobrist_hash(chess, sm::EnPassantMode::Legal)
}

/// Orthodox chess rules, backed by `shakmaty`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardChess;

impl StandardChess {
    pub fn new() -> Self {
        StandardChess
    }

    /// Every legal intent in `position`, castling written as the king's two-square move.
    pub fn legal_moves(&self, position: &StandardPosition) -> Vec<MoveIntent> {
        sm::Position::legal_moves(&position.chess)
            .iter()
            .filter_map(|m| match m.to_uci(sm::CastlingMode::Standard) {
                sm::uci::Uci::Normal { from, to, promotion } => Some(MoveIntent {
                    from: from.to_string(),
                    to: to.to_string(),
                    promotion: promotion.map(Into::into),
                }),
                _ => None,
            })
            .collect()
    }
}

impl PositionAuthority for StandardChess {
    type Position = StandardPosition;

    fn initial(&self) -> StandardPosition {
        StandardPosition::new(sm::Chess::default())
    }

    fn apply(
        &self,
        position: &StandardPosition,
        intent: &MoveIntent,
    ) -> Result<(StandardPosition, MoveRecord), IllegalMove> {
        let illegal = || IllegalMove {
            intent: intent.clone(),
        };

        let from: sm::Square = intent.from.to_ascii_lowercase().parse().map_err(|_| illegal())?;
        let to: sm::Square = intent.to.to_ascii_lowercase().parse().map_err(|_| illegal())?;

        let uci = sm::uci::Uci::Normal {
            from,
            to,
            promotion: intent.promotion.map(Into::into),
        };

        let m = match uci.to_move(&position.chess) {
            Ok(m) if sm::Position::is_legal(&position.chess, &m) => m,
            _ => return Err(illegal()),
        };

        let record = MoveRecord {
            color: sm::Position::turn(&position.chess).into(),
            from: from.to_string(),
            to: to.to_string(),
            piece: m.role().into(),
            captured: m.capture().map(Into::into),
            promotion: m.promotion().map(Into::into),
            san: sm::san::San::from_move(&position.chess, &m).to_string(),
        };

        let mut chess = position.chess.clone();
        sm::Position::play_unchecked(&mut chess, &m);

        let mut seen = if sm::Position::halfmoves(&chess) == 0 {
            Vec::new()
        } else {
            position.seen.clone()
        };
        seen.push(key(&chess));

        Ok((StandardPosition { chess, seen }, record))
    }

    fn side_to_move(&self, position: &StandardPosition) -> Color {
        sm::Position::turn(&position.chess).into()
    }

    fn terminal(&self, position: &StandardPosition) -> Option<TerminalKind> {
        let chess = &position.chess;

        if sm::Position::is_checkmate(chess) {
            Some(TerminalKind::Checkmate)
        } else if sm::Position::is_stalemate(chess) {
            Some(TerminalKind::Stalemate)
        } else if sm::Position::is_insufficient_material(chess) {
            Some(TerminalKind::InsufficientMaterial)
        } else if position.repetitions() >= REPETITION_LIMIT {
            Some(TerminalKind::Repetition)
        } else if sm::Position::halfmoves(chess) >= FIFTY_MOVE_HALFMOVES {
            Some(TerminalKind::FiftyMoveRule)
        } else {
            None
        }
    }

    fn encode(&self, position: &StandardPosition) -> String {
        position.fen()
    }
}

#[doc(hidden)]
impl From<sm::Color> for Color {
    fn from(c: sm::Color) -> Self {
        match c {
            sm::Color::White => Color::White,
            sm::Color::Black => Color::Black,
        }
    }
}

#[doc(hidden)]
impl From<sm::Role> for PieceKind {
    fn from(r: sm::Role) -> Self {
        match r {
            sm::Role::Pawn => PieceKind::Pawn,
            sm::Role::Knight => PieceKind::Knight,
            sm::Role::Bishop => PieceKind::Bishop,
            sm::Role::Rook => PieceKind::Rook,
            sm::Role::Queen => PieceKind::Queen,
            sm::Role::King => PieceKind::King,
        }
    }
}

#[doc(hidden)]
impl From<PieceKind> for sm::Role {
    fn from(k: PieceKind) -> Self {
        match k {
            PieceKind::Pawn => sm::Role::Pawn,
            PieceKind::Knight => sm::Role::Knight,
            PieceKind::Bishop => sm::Role::Bishop,
            PieceKind::Rook => sm::Role::Rook,
            PieceKind::Queen => sm::Role::Queen,
            PieceKind::King => sm::Role::King,
        }
    }
}
