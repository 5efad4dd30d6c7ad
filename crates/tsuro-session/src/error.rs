//! Error types for the session layer.

use tsuro_protocol::{PlayerId, ProtocolError};

/// Errors raised by the connection registry.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No connection is registered under this id.
    #[error("no connection for player {0}")]
    NotFound(PlayerId),

    /// The id is already held by a live connection.
    #[error("player id {0} is already in use")]
    IdInUse(PlayerId),

    /// Every id in the 16-bit space is held by a live connection.
    #[error("all player ids are in use")]
    IdsExhausted,

    /// Writing to a player's socket failed. The connection should be
    /// treated as gone.
    #[error("send to {player} failed: {reason}")]
    SendFailed { player: PlayerId, reason: String },

    /// The outgoing message could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
