//! Round lifecycle and turn scheduling for the Tsuro server.
//!
//! # Key types
//!
//! - [`Scheduler`]: the actor that owns every connection and the current
//!   round, and drives the state machine
//! - [`Game`]: one round's board, seats, turn queue and replay log
//! - [`SchedulerState`]: lifecycle state machine
//! - [`GameConfig`]: player limit, hand size and timings
//! - [`fallback_move`]: the move the server plays for an idle player

mod autoplay;
mod config;
mod error;
mod game;
mod player;
mod scheduler;

pub use autoplay::fallback_move;
pub use config::{GameConfig, SchedulerState};
pub use error::TurnError;
pub use game::{Game, Outbound};
pub use player::Player;
pub use scheduler::Scheduler;
