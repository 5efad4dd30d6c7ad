//! Unified error type for the Tsuro server.

use tsuro_board::BoardError;
use tsuro_game::TurnError;
use tsuro_protocol::ProtocolError;
use tsuro_session::SessionError;
use tsuro_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TsuroError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (unknown tag, bad name).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry error (unknown player, ids exhausted).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// An illegal board move.
    #[error(transparent)]
    Board(#[from] BoardError),

    /// An action refused by the turn rules.
    #[error(transparent)]
    Turn(#[from] TurnError),

    /// Socket-level failure outside the transport, e.g. querying the
    /// bound address.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The scheduler task ended while the server was still accepting.
    #[error("scheduler stopped")]
    SchedulerStopped,
}
