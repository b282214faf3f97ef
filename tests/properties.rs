use chessmate::domain::errors::SessionError;
use chessmate::domain::events::{Audience, ServerEvent};
use chessmate::domain::ledger::CapturedPiece;
use chessmate::domain::models::{Color, ConnectionId, SessionStatus};
use chessmate::domain::session::{Command, MatchSession};
use chessmate::infrastructure::standard_chess::StandardChess;
use chessmate::interface::mirror::LocalMirror;
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::sample::Index;
use std::sync::Arc;
use test_strategy::proptest;

struct Game {
    session: MatchSession<StandardChess>,
    white: ConnectionId,
    black: ConnectionId,
    /// Everything broadcast to both seats, in order.
    broadcasts: Vec<ServerEvent>,
}

impl Game {
    fn start(time_control: u32) -> Self {
        let white = ConnectionId::new();
        let black = ConnectionId::new();
        let (session, _) = MatchSession::create(
            "PROP01".into(),
            Arc::new(StandardChess),
            white,
            "white".into(),
            Color::White,
            time_control,
        );

        let mut game = Game {
            session,
            white,
            black,
            broadcasts: Vec::new(),
        };
        game.send(Command::Join {
            connection: black,
            label: "black".into(),
        })
        .unwrap();
        game
    }

    fn seat(&self, color: Color) -> ConnectionId {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    fn send(&mut self, command: Command) -> Result<(), SessionError> {
        let envelopes = self.session.handle(command)?;
        self.broadcasts.extend(
            envelopes
                .into_iter()
                .filter(|e| e.audience == Audience::Everyone)
                .map(|e| e.event),
        );
        Ok(())
    }

    /// Plays the picked legal move; `false` once the game is over.
    fn step(&mut self, pick: &Index) -> bool {
        if self.session.status() != SessionStatus::Active {
            return false;
        }

        let legal = StandardChess.legal_moves(self.session.position());
        let intent = pick.get(&legal).clone();
        let mover = self.session.side_to_move();

        self.send(Command::ProposeMove {
            connection: self.seat(mover),
            intent,
        })
        .unwrap();
        true
    }
}

#[proptest(cases = 48)]
fn replaying_history_reproduces_the_position(#[strategy(vec(any::<Index>(), 1..60))] picks: Vec<Index>) {
    let mut game = Game::start(1000);

    for pick in &picks {
        if !game.step(pick) {
            break;
        }
        assert_eq!(&game.session.replay().unwrap(), game.session.position());
    }
}

#[proptest(cases = 48)]
fn exactly_the_side_to_move_is_ticking(#[strategy(vec(any::<Index>(), 1..60))] picks: Vec<Index>) {
    let mut game = Game::start(1000);

    for pick in &picks {
        if game.session.status() == SessionStatus::Active {
            assert_eq!(game.session.clock().ticking(), Some(game.session.side_to_move()));
        }
        if !game.step(pick) {
            break;
        }
        game.send(Command::Tick).unwrap();
    }

    if game.session.status() == SessionStatus::Finished {
        assert_eq!(game.session.clock().ticking(), None);
    }
}

#[proptest(cases = 48)]
fn captures_are_filed_under_the_capturer(#[strategy(vec(any::<Index>(), 1..80))] picks: Vec<Index>) {
    let mut game = Game::start(1000);

    for pick in &picks {
        let mover = game.session.side_to_move();
        let before = game.session.captured().clone();

        if !game.step(pick) {
            break;
        }

        let record = game.session.history().last().unwrap().clone();
        let after = game.session.captured();

        assert_eq!(after.by(!mover), before.by(!mover));
        match record.captured {
            Some(kind) => {
                assert_eq!(after.by(mover).len(), before.by(mover).len() + 1);
                assert_eq!(after.by(mover).last(), Some(&CapturedPiece { color: !mover, kind }));
            }
            None => assert_eq!(after.by(mover), before.by(mover)),
        }
    }
}

#[proptest(cases = 48)]
fn only_the_side_to_move_may_move(#[strategy(vec(any::<Index>(), 1..60))] picks: Vec<Index>) {
    let mut game = Game::start(1000);

    for pick in &picks {
        if game.session.status() != SessionStatus::Active {
            break;
        }

        let legal = StandardChess.legal_moves(game.session.position());
        let waiting = game.seat(!game.session.side_to_move());
        let position = game.session.position().clone();
        let plies = game.session.history().len();

        let refused = game.send(Command::ProposeMove {
            connection: waiting,
            intent: pick.get(&legal).clone(),
        });

        assert_eq!(refused, Err(SessionError::NotYourTurn));
        assert_eq!(game.session.position(), &position);
        assert_eq!(game.session.history().len(), plies);

        game.step(pick);
    }
}

#[proptest(cases = 32)]
fn finished_games_refuse_every_move(
    #[strategy(vec(any::<Index>(), 0..40))] picks: Vec<Index>,
    #[strategy(1u32..20)] allotment: u32,
) {
    let mut game = Game::start(allotment);

    for pick in &picks {
        if !game.step(pick) {
            break;
        }
    }

    while game.session.status() == SessionStatus::Active {
        game.send(Command::Tick).unwrap();
    }

    let position = game.session.position().clone();
    for intent in StandardChess.legal_moves(&position) {
        for color in [Color::White, Color::Black] {
            let connection = game.seat(color);
            assert_eq!(
                game.send(Command::ProposeMove { connection, intent: intent.clone() }),
                Err(SessionError::NotActive)
            );
        }
    }
    assert_eq!(game.session.position(), &position);
}

#[proptest(cases = 32)]
fn latest_broadcast_rebuilds_a_fresh_mirror(#[strategy(vec(any::<Index>(), 1..60))] picks: Vec<Index>) {
    let mut game = Game::start(1000);
    for pick in &picks {
        if !game.step(pick) {
            break;
        }
    }

    let mut replayed = LocalMirror::new();
    for event in &game.broadcasts {
        replayed.apply(event);
    }

    let mut fresh = LocalMirror::new();
    let last_move = game
        .broadcasts
        .iter()
        .rev()
        .find(|e| matches!(e, ServerEvent::MoveApplied { .. }))
        .unwrap();
    fresh.apply(last_move);
    if let Some(over) = game.broadcasts.iter().find(|e| matches!(e, ServerEvent::GameOver { .. })) {
        fresh.apply(over);
    }
    assert_eq!(fresh.state(), replayed.state());

    // Re-delivery changes nothing.
    let settled = replayed.state().clone();
    replayed.apply(last_move);
    assert_eq!(replayed.state(), &settled);

    let mut resynced = LocalMirror::new();
    resynced.apply(&ServerEvent::Snapshot(game.session.snapshot()));
    assert_eq!(resynced.state(), replayed.state());
    assert_eq!(resynced.history(), replayed.history());
}
