use crate::application::registry::SessionRegistry;
use crate::domain::authority::PositionAuthority;
use crate::domain::errors::SessionError;
use crate::domain::models::{ConnectionId, MoveIntent, NewGame};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Name used in `rejected` events when a frame could not be read at all.
pub const UNKNOWN_INTENT: &str = "unknown";

/// Everything a participant can ask of the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "camelCase")]
pub enum ClientIntent {
    CreateGame(NewGame),
    #[serde(rename_all = "camelCase")]
    JoinGame {
        code: String,
        #[serde(default)]
        label: Option<String>,
    },
    ProposeMove {
        code: String,
        #[serde(rename = "move")]
        intent: MoveIntent,
    },
    Resync {
        code: String,
    },
}

impl ClientIntent {
    /// Parses one text frame.
    ///
    /// On failure the error carries the frame's `intent` tag when one could be read, so the
    /// rejection names what the client tried to do.
    pub fn decode(frame: &str) -> Result<Self, (String, SessionError)> {
        serde_json::from_str(frame).map_err(|e| {
            debug!(error = %e, "malformed intent");
            let name = serde_json::from_str::<serde_json::Value>(frame)
                .ok()
                .and_then(|v| v.get("intent")?.as_str().map(str::to_string))
                .unwrap_or_else(|| UNKNOWN_INTENT.to_string());
            (name, SessionError::MalformedIntent)
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClientIntent::CreateGame(_) => "createGame",
            ClientIntent::JoinGame { .. } => "joinGame",
            ClientIntent::ProposeMove { .. } => "proposeMove",
            ClientIntent::Resync { .. } => "resync",
        }
    }

    /// Runs the intent against `registry` on behalf of `connection`.
    ///
    /// Successful intents answer through the registry's outbox; the error is left for the
    /// caller to report back to `connection` alone.
    pub async fn execute<A: PositionAuthority>(
        self,
        registry: &SessionRegistry<A>,
        connection: ConnectionId,
    ) -> Result<(), SessionError> {
        match self {
            ClientIntent::CreateGame(request) => registry.create(connection, request).await.map(drop),
            ClientIntent::JoinGame { code, label } => {
                registry.join(connection, &code, label).await.map(drop)
            }
            ClientIntent::ProposeMove { code, intent } => {
                registry.propose_move(connection, &code, intent).await
            }
            ClientIntent::Resync { code } => registry.resync(connection, &code).await,
        }
    }
}
