//! Error types for the game layer.

use tsuro_board::BoardError;
use tsuro_protocol::{MessageType, PlayerId};

/// Why an action from a client was not applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    /// The message names someone other than the turn holder.
    #[error("{requested} acted out of turn")]
    NotYourTurn { requested: PlayerId },

    /// The player tried to place a tile they aren't holding.
    #[error("{player} does not hold tile {tile}")]
    TileNotInHand { player: PlayerId, tile: u16 },

    /// Clients only ever send `PlaceTile` and `MoveToken`.
    #[error("clients may not send {0}")]
    Unexpected(MessageType),

    /// The board refused the move.
    #[error(transparent)]
    Board(#[from] BoardError),
}

impl TurnError {
    /// Whether this is an illegal move by the turn holder, as opposed to
    /// a message that was never theirs to send.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::TileNotInHand { .. } | Self::Board(_))
    }
}
