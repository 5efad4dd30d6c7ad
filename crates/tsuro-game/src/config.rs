//! Scheduler configuration and state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Timings and limits for the scheduler.
///
/// The defaults are the reference values; tests shrink the timings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Most players seated in one round.
    pub player_limit: usize,

    /// Tiles each seated player holds.
    pub hand_size: usize,

    /// Delay between `CountdownStarted` and `GameStart`.
    pub countdown: Duration,

    /// Extra wait for latecomers when fewer than `player_limit` are
    /// connected at seating time.
    pub seat_wait: Duration,

    /// How often an empty server checks for connections.
    pub connection_poll: Duration,

    /// How long the current player has to act before the server plays
    /// for them.
    pub turn_timeout: Duration,

    /// Illegal actions tolerated in one turn. Each one restarts the turn
    /// timer; once the limit is hit the server plays the move.
    pub max_rejections: u32,

    /// Seed for seating, dealing and fallback moves. `None` seeds from
    /// the OS.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_limit: 4,
            hand_size: 4,
            countdown: Duration::from_secs(2),
            seat_wait: Duration::from_secs(1),
            connection_poll: Duration::from_secs(1),
            turn_timeout: Duration::from_secs(10),
            max_rejections: 3,
            seed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// SchedulerState
// ---------------------------------------------------------------------------

/// Where the scheduler is in its round cycle.
///
/// ```text
/// WaitingForConnections → Countdown → Seating → InProgress → RoundOver
///          ↑                  ↑                                  │
///          └──────────────────┴──────────────────────────────────┘
/// ```
///
/// `RoundOver` loops back to `Countdown` while anyone is connected and to
/// `WaitingForConnections` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerState {
    WaitingForConnections,
    Countdown,
    Seating,
    InProgress,
    RoundOver,
}

impl SchedulerState {
    /// The usual successor: the next state when connections remain.
    pub fn next(self) -> Self {
        match self {
            Self::WaitingForConnections => Self::Countdown,
            Self::Countdown => Self::Seating,
            Self::Seating => Self::InProgress,
            Self::InProgress => Self::RoundOver,
            Self::RoundOver => Self::Countdown,
        }
    }

    /// Returns `true` if moving to `target` is a legal transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == target || (self == Self::RoundOver && target == Self::WaitingForConnections)
    }
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForConnections => write!(f, "WaitingForConnections"),
            Self::Countdown => write!(f, "Countdown"),
            Self::Seating => write!(f, "Seating"),
            Self::InProgress => write!(f, "InProgress"),
            Self::RoundOver => write!(f, "RoundOver"),
        }
    }
}
