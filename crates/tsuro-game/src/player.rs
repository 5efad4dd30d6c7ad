//! A seated player's round state.

use tsuro_protocol::PlayerId;

/// What the server tracks for one seated player during a round.
///
/// The socket and its inbound buffer live in the connection registry
/// under the same id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    /// Tile ids held, duplicates allowed.
    pub hand: Vec<u16>,
    /// Turns this player has completed this round.
    pub turns: u32,
    /// Where the player put their first tile.
    pub start_cell: Option<(u8, u8)>,
}

impl Player {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            hand: Vec::new(),
            turns: 0,
            start_cell: None,
        }
    }

    pub fn holds(&self, tile: u16) -> bool {
        self.hand.contains(&tile)
    }

    /// Removes one copy of `tile` from the hand. Returns `false` if the
    /// player wasn't holding it.
    pub fn take(&mut self, tile: u16) -> bool {
        match self.hand.iter().position(|t| *t == tile) {
            Some(i) => {
                self.hand.remove(i);
                true
            }
            None => false,
        }
    }
}
