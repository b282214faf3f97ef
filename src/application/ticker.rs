use crate::application::outbox::{Outbox, dispatch};
use crate::domain::authority::PositionAuthority;
use crate::domain::models::SessionStatus;
use crate::domain::session::{Command, MatchSession};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{Instrument, debug, debug_span};

/// Drives a session's clock once per `period` until the session leaves the active state.
///
/// Each tick takes the session lock, so ticks serialize with moves and departures.
pub fn spawn<A: PositionAuthority>(
    session: Arc<Mutex<MatchSession<A>>>,
    outbox: Arc<dyn Outbox>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let mut interval = time::interval_at(Instant::now() + period, period);

            loop {
                interval.tick().await;

                let mut session = session.lock().await;
                if session.status() != SessionStatus::Active {
                    break;
                }

                let envelopes = session.handle(Command::Tick).unwrap_or_default();
                dispatch(outbox.as_ref(), session.participants(), envelopes);

                if session.status() != SessionStatus::Active {
                    break;
                }
            }

            debug!("clock stopped");
        }
        .instrument(debug_span!("ticker")),
    )
}
