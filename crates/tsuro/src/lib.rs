//! # Tsuro
//!
//! Authoritative server for the Tsuro tile-laying game.
//!
//! Clients connect over TCP and speak a compact big-endian binary
//! protocol. The server seats up to four players per round, deals hands,
//! prompts each player in turn, validates their moves against the board,
//! runs the token cascade and broadcasts every result. Late connections
//! watch as spectators and are caught up on the current board.
//!
//! ## Layers
//!
//! ```text
//!  tsuro-transport   TCP listener and connections
//!  tsuro-protocol    message codec and stream framing
//!  tsuro-board       tiles, board rules, client-side GameView
//!  tsuro-session     connection registry and broadcasting
//!  tsuro-game        round state, turn scheduler, fallback moves
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tsuro::prelude::*;
//!
//! # async fn serve() -> Result<(), TsuroError> {
//! let server = TsuroServer::builder()
//!     .bind("0.0.0.0:30020")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod server;

pub use error::TsuroError;
pub use server::{DEFAULT_BIND, TsuroServer, TsuroServerBuilder};

pub mod prelude {
    pub use crate::{DEFAULT_BIND, TsuroError, TsuroServer, TsuroServerBuilder};
    pub use tsuro_board::{Board, GameView, Phase};
    pub use tsuro_game::{GameConfig, SchedulerState};
    pub use tsuro_protocol::{Message, MessageBuffer, MessageType, PlayerId, decode, encode};
}
