//! Board engine for Tsuro.
//!
//! Pure game-state simulation with no I/O:
//!
//! - [`tile`]: the 11 tiles and the rotation rule for finding exit ports
//! - [`Board`]: placement legality, starting positions, and the movement
//!   cascade that carries tokens across chains of tiles
//! - [`GameView`]: a client-side mirror that applies server announcements
//!   verbatim
//!
//! The board never holds on to the caller's state; the scheduler passes it
//! requests and gets results back.

mod board;
mod error;
pub mod tile;
mod view;

pub use board::{Board, Movement, PlacedTile, TokenPosition, BOARD_HEIGHT, BOARD_WIDTH};
pub use error::BoardError;
pub use tile::{exit_port, Tile, TILES, TILE_COUNT};
pub use view::{GameView, Phase};
