//! Core protocol types for the Tsuro wire format.
//!
//! Every value that crosses the socket is described here. The encoding
//! itself lives in [`crate::codec`]; these types only say *what* a message
//! carries, not how its bytes are laid out.

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Upper bound (exclusive) for player id numbers. Ids travel as a 16-bit
/// field, so the server's counter wraps here.
pub const IDNUM_LIMIT: u32 = 65_536;

/// The per-connection id number assigned by the server.
///
/// A newtype over the 16-bit wire value so it cannot be confused with the
/// tile ids, coordinates and ports that share the same width on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(pub u16);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who should receive an outbound message produced by game logic.
///
/// The game layer returns `(Recipient, Message)` pairs and the scheduler
/// routes them; game rules never touch sockets directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every registered connection, seated or spectating.
    All,
    /// A single connection.
    Player(PlayerId),
}

// ---------------------------------------------------------------------------
// MessageType
// ---------------------------------------------------------------------------

/// The 2-byte tag that starts every message on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageType {
    Welcome = 1,
    PlayerJoined = 2,
    PlayerLeft = 3,
    CountdownStarted = 4,
    GameStart = 5,
    AddTileToHand = 6,
    PlayerTurn = 7,
    PlaceTile = 8,
    MoveToken = 9,
    PlayerEliminated = 10,
}

impl MessageType {
    /// Parses a raw tag. Returns `None` for values outside the catalog.
    pub fn from_u16(raw: u16) -> Option<Self> {
        let ty = match raw {
            1 => Self::Welcome,
            2 => Self::PlayerJoined,
            3 => Self::PlayerLeft,
            4 => Self::CountdownStarted,
            5 => Self::GameStart,
            6 => Self::AddTileToHand,
            7 => Self::PlayerTurn,
            8 => Self::PlaceTile,
            9 => Self::MoveToken,
            10 => Self::PlayerEliminated,
            _ => return None,
        };
        Some(ty)
    }

    /// The raw tag value.
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Number of 2-byte fields that follow the tag, not counting the
    /// variable-length name of `PlayerJoined`.
    pub(crate) fn field_count(self) -> usize {
        match self {
            Self::CountdownStarted | Self::GameStart => 0,
            Self::Welcome
            | Self::PlayerLeft
            | Self::AddTileToHand
            | Self::PlayerTurn
            | Self::PlayerEliminated => 1,
            Self::PlayerJoined => 2,
            Self::MoveToken => 4,
            Self::PlaceTile => 5,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// One framed protocol message.
///
/// Coordinates, rotations, tile ids and ports are kept at their wire width
/// (`u16`). Range checks belong to the board, which rejects out-of-range
/// values as illegal moves rather than as malformed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Server → joiner: your id is `idnum`.
    Welcome { idnum: PlayerId },

    /// Server → all: a new connection arrived.
    PlayerJoined { idnum: PlayerId, name: String },

    /// Server → all: a connection went away.
    PlayerLeft { idnum: PlayerId },

    /// Server → all: a new round's countdown began.
    CountdownStarted,

    /// Server → all: the round has begun; clients reset local state.
    GameStart,

    /// Server → one: add `tileid` to your hand.
    AddTileToHand { tileid: u16 },

    /// Server → all: it is `idnum`'s turn.
    PlayerTurn { idnum: PlayerId },

    /// Both directions: a tile placement request or announcement.
    PlaceTile {
        idnum: PlayerId,
        tileid: u16,
        rotation: u16,
        x: u16,
        y: u16,
    },

    /// Both directions: a starting-position request or a token position
    /// announcement.
    MoveToken {
        idnum: PlayerId,
        x: u16,
        y: u16,
        position: u16,
    },

    /// Server → all: `idnum`'s token left the board (or they disconnected
    /// while seated).
    PlayerEliminated { idnum: PlayerId },
}

impl Message {
    /// The wire tag for this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Welcome { .. } => MessageType::Welcome,
            Self::PlayerJoined { .. } => MessageType::PlayerJoined,
            Self::PlayerLeft { .. } => MessageType::PlayerLeft,
            Self::CountdownStarted => MessageType::CountdownStarted,
            Self::GameStart => MessageType::GameStart,
            Self::AddTileToHand { .. } => MessageType::AddTileToHand,
            Self::PlayerTurn { .. } => MessageType::PlayerTurn,
            Self::PlaceTile { .. } => MessageType::PlaceTile,
            Self::MoveToken { .. } => MessageType::MoveToken,
            Self::PlayerEliminated { .. } => MessageType::PlayerEliminated,
        }
    }

    /// The player this message is about, if any.
    pub fn idnum(&self) -> Option<PlayerId> {
        match self {
            Self::Welcome { idnum }
            | Self::PlayerJoined { idnum, .. }
            | Self::PlayerLeft { idnum }
            | Self::PlayerTurn { idnum }
            | Self::PlaceTile { idnum, .. }
            | Self::MoveToken { idnum, .. }
            | Self::PlayerEliminated { idnum } => Some(*idnum),
            Self::CountdownStarted
            | Self::GameStart
            | Self::AddTileToHand { .. } => None,
        }
    }
}
