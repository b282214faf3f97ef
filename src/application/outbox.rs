use crate::domain::events::{Audience, Envelope, ServerEvent};
use crate::domain::models::{ConnectionId, Participant};
use std::sync::{Mutex, PoisonError};

/// Delivery seam between sessions and whatever transport carries events to connections.
///
/// Delivery is fire-and-forget: a connection that has gone away simply misses the event.
pub trait Outbox: Send + Sync {
    fn deliver(&self, connection: ConnectionId, event: ServerEvent);
}

/// Resolves each envelope's audience against the session's participants.
///
/// `Audience::Only` reaches its target even when it holds no seat, so read-only callers can be
/// answered through the same path.
pub fn dispatch(outbox: &dyn Outbox, participants: &[Participant], envelopes: Vec<Envelope>) {
    for Envelope { audience, event } in envelopes {
        match audience {
            Audience::Only(connection) => outbox.deliver(connection, event),
            audience => participants
                .iter()
                .filter(|p| audience.includes(&p.connection))
                .for_each(|p| outbox.deliver(p.connection, event.clone())),
        }
    }
}

/// Records every delivery in order; used by tests and embedders without a transport.
#[derive(Debug, Default)]
pub struct MemoryOutbox {
    delivered: Mutex<Vec<(ConnectionId, ServerEvent)>>,
}

impl MemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, oldest first.
    pub fn deliveries(&self) -> Vec<(ConnectionId, ServerEvent)> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn events_for(&self, connection: ConnectionId) -> Vec<ServerEvent> {
        self.deliveries()
            .into_iter()
            .filter(|(to, _)| *to == connection)
            .map(|(_, event)| event)
            .collect()
    }

    /// Drains the record.
    pub fn take(&self) -> Vec<(ConnectionId, ServerEvent)> {
        std::mem::take(&mut *self.delivered.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Outbox for MemoryOutbox {
    fn deliver(&self, connection: ConnectionId, event: ServerEvent) {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((connection, event));
    }
}
