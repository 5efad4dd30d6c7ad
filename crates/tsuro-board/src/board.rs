//! The board: placed tiles, token positions and the movement cascade.
//!
//! Coordinates arrive at wire width (`u16`) and are range-checked here, so
//! a malformed request is just another illegal move.

use tsuro_protocol::{Message, PlayerId};

use crate::tile::{self, PORTS, TILE_COUNT};
use crate::BoardError;

/// Width of the board, in tiles.
pub const BOARD_WIDTH: u8 = 5;
/// Height of the board, in tiles.
pub const BOARD_HEIGHT: u8 = 5;

/// For each exit port: `(dx, dy, entry port on the neighbouring cell)`.
const NEIGHBOURS: [(i8, i8, u8); 8] = [
    (0, 1, 5),
    (0, 1, 4),
    (1, 0, 7),
    (1, 0, 6),
    (0, -1, 1),
    (0, -1, 0),
    (-1, 0, 3),
    (-1, 0, 2),
];

/// A tile fixed to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedTile {
    pub tile: u16,
    pub rotation: u8,
    pub placer: PlayerId,
}

/// Where a player's token sits: a cell and one of its 8 ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPosition {
    pub player: PlayerId,
    pub x: u8,
    pub y: u8,
    pub port: u8,
}

impl TokenPosition {
    /// The `MoveToken` announcement for this position.
    pub fn to_message(self) -> Message {
        Message::MoveToken {
            idnum: self.player,
            x: u16::from(self.x),
            y: u16::from(self.y),
            position: u16::from(self.port),
        }
    }
}

/// Result of one movement phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Movement {
    /// Final position of every token that moved, in token order.
    pub updates: Vec<TokenPosition>,
    /// Players whose token left the board during this phase.
    pub eliminated: Vec<PlayerId>,
}

/// The state of one round's grid.
#[derive(Debug, Clone)]
pub struct Board {
    cells: Vec<Option<PlacedTile>>,
    /// Tokens in the order they were first placed.
    tokens: Vec<TokenPosition>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// An empty 5×5 board.
    pub fn new() -> Self {
        Self {
            cells: vec![None; usize::from(BOARD_WIDTH) * usize::from(BOARD_HEIGHT)],
            tokens: Vec::new(),
        }
    }

    /// Removes every tile and token.
    pub fn reset(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
        self.tokens.clear();
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The tile at `(x, y)`, if any. Out-of-range cells hold nothing.
    pub fn tile_at(&self, x: u8, y: u8) -> Option<PlacedTile> {
        self.index(x, y).and_then(|i| self.cells[i])
    }

    /// The player's token, if they have one.
    pub fn player_position(&self, player: PlayerId) -> Option<TokenPosition> {
        self.tokens.iter().copied().find(|t| t.player == player)
    }

    /// Whether the player has a token on the board.
    pub fn has_token(&self, player: PlayerId) -> bool {
        self.player_position(player).is_some()
    }

    /// All tokens, in creation order.
    pub fn tokens(&self) -> &[TokenPosition] {
        &self.tokens
    }

    /// Whether `(x, y)` touches the edge of the board.
    pub fn is_border(x: u8, y: u8) -> bool {
        x == 0 || y == 0 || x == BOARD_WIDTH - 1 || y == BOARD_HEIGHT - 1
    }

    /// Ports of `(x, y)` that face the board edge. Corners have four,
    /// other border cells two, interior cells none.
    pub fn edge_ports(x: u8, y: u8) -> Vec<u8> {
        let mut ports = Vec::with_capacity(4);
        if y == BOARD_HEIGHT - 1 {
            ports.extend([0, 1]);
        }
        if x == BOARD_WIDTH - 1 {
            ports.extend([2, 3]);
        }
        if y == 0 {
            ports.extend([4, 5]);
        }
        if x == 0 {
            ports.extend([6, 7]);
        }
        ports
    }

    /// Unoccupied cells on the border, row by row.
    pub fn free_border_cells(&self) -> Vec<(u8, u8)> {
        (0..BOARD_HEIGHT)
            .flat_map(|y| (0..BOARD_WIDTH).map(move |x| (x, y)))
            .filter(|&(x, y)| Self::is_border(x, y) && self.tile_at(x, y).is_none())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Validated mutation
    // -----------------------------------------------------------------------

    /// Places a tile if the move is legal.
    ///
    /// A player without a token must place on an empty border cell; a
    /// player with a token must place on the (empty) cell under it. Token
    /// positions are not updated here; call [`Board::advance_tokens`].
    pub fn try_place_tile(
        &mut self,
        x: u16,
        y: u16,
        tile: u16,
        rotation: u16,
        placer: PlayerId,
    ) -> Result<(), BoardError> {
        let (cx, cy, idx) = self.checked_cell(x, y)?;
        if tile >= TILE_COUNT {
            return Err(BoardError::UnknownTile(tile));
        }
        let rotation = u8::try_from(rotation)
            .ok()
            .filter(|r| *r < 4)
            .ok_or(BoardError::InvalidRotation(rotation))?;
        if self.cells[idx].is_some() {
            return Err(BoardError::Occupied { x: cx, y: cy });
        }

        match self.player_position(placer) {
            Some(token) if (token.x, token.y) != (cx, cy) => {
                return Err(BoardError::NotAtToken {
                    player: placer,
                    x: token.x,
                    y: token.y,
                });
            }
            None if !Self::is_border(cx, cy) => {
                return Err(BoardError::NotOnBorder { x: cx, y: cy });
            }
            _ => {}
        }

        self.cells[idx] = Some(PlacedTile {
            tile,
            rotation,
            placer,
        });
        Ok(())
    }

    /// Puts a player's token on its starting port.
    ///
    /// The cell must hold a tile the player placed, and the port must face
    /// the edge of the board on that cell's side.
    pub fn try_set_start_position(
        &mut self,
        player: PlayerId,
        x: u16,
        y: u16,
        port: u16,
    ) -> Result<(), BoardError> {
        if self.has_token(player) {
            return Err(BoardError::TokenAlreadyPlaced(player));
        }
        let (cx, cy, idx) = self.checked_cell(x, y)?;
        let port = u8::try_from(port)
            .ok()
            .filter(|p| *p < PORTS)
            .ok_or(BoardError::InvalidPort(port))?;
        let placed = self.cells[idx].ok_or(BoardError::NoTile { x: cx, y: cy })?;
        if placed.placer != player {
            return Err(BoardError::NotOwner { player, x: cx, y: cy });
        }
        if !Self::edge_ports(cx, cy).contains(&port) {
            return Err(BoardError::NotOnEdge { x: cx, y: cy, port });
        }

        self.record_position(TokenPosition {
            player,
            x: cx,
            y: cy,
            port,
        });
        Ok(())
    }

    /// Runs the movement phase for every live player's token.
    ///
    /// A token on a tiled cell follows the connector to its exit port and
    /// crosses into the neighbouring cell, repeating until it rests on an
    /// empty cell or leaves the board. A token that leaves is recorded at
    /// the exit port of its last cell and reported as eliminated. Players
    /// not in `live` are left where they are.
    pub fn advance_tokens(&mut self, live: &[PlayerId]) -> Movement {
        let mut movement = Movement::default();

        for i in 0..self.tokens.len() {
            let start = self.tokens[i];
            if !live.contains(&start.player) {
                continue;
            }
            let Some((end, left_board)) = self.trace(start) else {
                continue;
            };
            self.tokens[i] = end;
            movement.updates.push(end);
            if left_board {
                movement.eliminated.push(end.player);
            }
        }

        movement
    }

    /// Follows one token. Returns its final position and whether it left
    /// the board, or `None` if it didn't move at all.
    fn trace(&self, start: TokenPosition) -> Option<(TokenPosition, bool)> {
        // Each connector can be travelled at most once along a single path.
        let max_hops = self.cells.len() * 4;
        let mut pos = start;
        let mut hops = 0;

        while let Some(placed) = self.tile_at(pos.x, pos.y) {
            if hops == max_hops {
                tracing::warn!(player = %pos.player, hops, "token path did not terminate, stopping");
                break;
            }
            hops += 1;

            let Some(exit) = tile::exit_port(placed.tile, placed.rotation, pos.port) else {
                // Only reachable through an unvalidated `record_tile`.
                break;
            };
            let (dx, dy, entry) = NEIGHBOURS[usize::from(exit)];
            let nx = i16::from(pos.x) + i16::from(dx);
            let ny = i16::from(pos.y) + i16::from(dy);

            match (u8::try_from(nx), u8::try_from(ny)) {
                (Ok(nx), Ok(ny)) if nx < BOARD_WIDTH && ny < BOARD_HEIGHT => {
                    pos = TokenPosition {
                        x: nx,
                        y: ny,
                        port: entry,
                        ..pos
                    };
                }
                _ => {
                    pos.port = exit;
                    return Some((pos, true));
                }
            }
        }

        (hops > 0).then_some((pos, false))
    }

    // -----------------------------------------------------------------------
    // Unvalidated mutation (client mirrors)
    // -----------------------------------------------------------------------

    /// Stores a tile without checking any rule. Clients use this to apply
    /// the server's announcements verbatim. Out-of-range cells are ignored.
    pub fn record_tile(&mut self, x: u8, y: u8, placed: PlacedTile) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = Some(placed);
        }
    }

    /// Sets (or creates) a player's token position without checking rules.
    pub fn record_position(&mut self, position: TokenPosition) {
        match self.tokens.iter_mut().find(|t| t.player == position.player) {
            Some(t) => *t = position,
            None => self.tokens.push(position),
        }
    }

    fn index(&self, x: u8, y: u8) -> Option<usize> {
        (x < BOARD_WIDTH && y < BOARD_HEIGHT)
            .then(|| usize::from(x) + usize::from(y) * usize::from(BOARD_WIDTH))
    }

    fn checked_cell(&self, x: u16, y: u16) -> Result<(u8, u8, usize), BoardError> {
        let out = BoardError::OutOfBounds { x, y };
        let cx = u8::try_from(x).map_err(|_| out.clone())?;
        let cy = u8::try_from(y).map_err(|_| out.clone())?;
        let idx = self.index(cx, cy).ok_or(out)?;
        Ok((cx, cy, idx))
    }
}
