//! Error types for the board layer.
//!
//! Every variant is an illegal move, not a fault: the caller rejects the
//! request and the board is left unchanged.

use tsuro_protocol::PlayerId;

/// Reasons a placement or starting-position request is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// The coordinates are outside the grid.
    #[error("cell ({x}, {y}) is off the board")]
    OutOfBounds { x: u16, y: u16 },

    /// No tile has this id.
    #[error("unknown tile id {0}")]
    UnknownTile(u16),

    /// Rotations are quarter turns, 0 to 3.
    #[error("invalid rotation {0}")]
    InvalidRotation(u16),

    /// Ports are numbered 0 to 7.
    #[error("invalid port {0}")]
    InvalidPort(u16),

    /// The cell already holds a tile.
    #[error("cell ({x}, {y}) is already occupied")]
    Occupied { x: u8, y: u8 },

    /// A player with a token must place on the token's cell.
    #[error("{player} must place at their token's cell ({x}, {y})")]
    NotAtToken { player: PlayerId, x: u8, y: u8 },

    /// A player's first tile must touch the board edge.
    #[error("cell ({x}, {y}) is not on the border")]
    NotOnBorder { x: u8, y: u8 },

    /// The player already has a token on the board.
    #[error("{0} already has a token")]
    TokenAlreadyPlaced(PlayerId),

    /// A starting position needs a tile under it.
    #[error("no tile at ({x}, {y})")]
    NoTile { x: u8, y: u8 },

    /// A starting position must be on a tile the player placed.
    #[error("tile at ({x}, {y}) was not placed by {player}")]
    NotOwner { player: PlayerId, x: u8, y: u8 },

    /// A starting port must face the board edge.
    #[error("port {port} of ({x}, {y}) does not face the board edge")]
    NotOnEdge { x: u8, y: u8, port: u8 },
}
