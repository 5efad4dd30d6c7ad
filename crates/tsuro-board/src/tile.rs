//! The fixed tile set and its rotation geometry.
//!
//! Each tile has 8 ports around its square, two per side:
//!
//! ```text
//!        5   4
//!      +-------+
//!    6 |       | 3
//!    7 |       | 2
//!      +-------+
//!        0   1
//! ```
//!
//! A quarter turn moves every port two places along, so rotation is just
//! `+2r` modulo 8.

/// Number of ports on a tile.
pub const PORTS: u8 = 8;

/// A square tile with 4 connectors linking its 8 ports in pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pairs: [(u8, u8); 4],
    partner: [u8; 8],
}

impl Tile {
    const fn new(pairs: [(u8, u8); 4]) -> Self {
        let mut partner = [0u8; 8];
        let mut i = 0;
        while i < 4 {
            let (a, b) = pairs[i];
            partner[a as usize] = b;
            partner[b as usize] = a;
            i += 1;
        }
        Self { pairs, partner }
    }

    /// The unrotated connector pairs.
    pub fn pairs(&self) -> [(u8, u8); 4] {
        self.pairs
    }

    /// The port linked to `port` on the unrotated tile.
    pub fn partner(&self, port: u8) -> u8 {
        self.partner[usize::from(port % PORTS)]
    }

    /// Where a token entering at `entry` leaves the tile, with the tile
    /// turned `rotation` quarter turns.
    pub fn exit_port(&self, rotation: u8, entry: u8) -> u8 {
        rotate(self.partner(unrotate(entry, rotation)), rotation)
    }
}

/// All tiles in play, indexed by tile id.
pub const TILES: [Tile; 11] = [
    Tile::new([(0, 5), (1, 2), (3, 6), (4, 7)]),
    Tile::new([(0, 5), (1, 4), (2, 6), (3, 7)]),
    Tile::new([(0, 7), (1, 2), (3, 4), (5, 6)]),
    Tile::new([(0, 5), (1, 4), (2, 7), (3, 6)]),
    Tile::new([(0, 7), (1, 6), (2, 5), (3, 4)]),
    Tile::new([(0, 2), (1, 3), (4, 6), (5, 7)]),
    Tile::new([(0, 4), (1, 5), (2, 6), (3, 7)]),
    Tile::new([(0, 7), (1, 2), (3, 5), (4, 6)]),
    Tile::new([(0, 5), (1, 7), (2, 4), (3, 6)]),
    Tile::new([(0, 4), (1, 2), (3, 6), (5, 7)]),
    Tile::new([(0, 2), (1, 5), (3, 6), (4, 7)]),
];

/// Number of distinct tile ids.
pub const TILE_COUNT: u16 = TILES.len() as u16;

/// Looks up a tile by id.
pub fn tile(id: u16) -> Option<&'static Tile> {
    TILES.get(usize::from(id))
}

/// Port `port` after `rotation` quarter turns.
pub fn rotate(port: u8, rotation: u8) -> u8 {
    (port % PORTS + 2 * (rotation % 4)) % PORTS
}

/// Inverse of [`rotate`].
pub fn unrotate(port: u8, rotation: u8) -> u8 {
    (port % PORTS + PORTS - 2 * (rotation % 4)) % PORTS
}

/// Exit port for a token entering tile `tile_id` at `entry`.
///
/// Returns `None` for an unknown tile id.
pub fn exit_port(tile_id: u16, rotation: u8, entry: u8) -> Option<u8> {
    tile(tile_id).map(|t| t.exit_port(rotation, entry))
}
