//! Moves the server plays for a player who ran out of time.
//!
//! The choice follows the player's progress on the board: no tile yet
//! means a first placement on a free border cell, a tile but no token
//! means a starting port on that tile, and a token means placing a hand
//! tile on the token's cell.

use rand::Rng;
use rand::seq::IndexedRandom;
use tsuro_board::Board;
use tsuro_protocol::{Message, PlayerId};

use crate::Game;

/// Builds a legal action for `player`, shaped like a client's message.
///
/// Returns `None` if the player isn't seated or no move exists.
pub fn fallback_move<R: Rng + ?Sized>(game: &Game, player: PlayerId, rng: &mut R) -> Option<Message> {
    let seat = game.player(player)?;
    let board = game.board();

    if let Some(token) = board.player_position(player) {
        let tileid = *seat.hand.choose(rng)?;
        return Some(Message::PlaceTile {
            idnum: player,
            tileid,
            rotation: rng.random_range(0..4),
            x: u16::from(token.x),
            y: u16::from(token.y),
        });
    }

    match seat.start_cell {
        Some((x, y)) => {
            let position = *Board::edge_ports(x, y).choose(rng)?;
            Some(Message::MoveToken {
                idnum: player,
                x: u16::from(x),
                y: u16::from(y),
                position: u16::from(position),
            })
        }
        None => {
            let (x, y) = *board.free_border_cells().choose(rng)?;
            let tileid = *seat.hand.choose(rng)?;
            Some(Message::PlaceTile {
                idnum: player,
                tileid,
                rotation: rng.random_range(0..4),
                x: u16::from(x),
                y: u16::from(y),
            })
        }
    }
}
