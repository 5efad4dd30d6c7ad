//! A client-side mirror of the server's state.
//!
//! Clients never validate moves; they apply whatever the server announces.
//! This matters for spectators, whose catch-up replay can contain moves
//! that would look illegal out of context.

use std::collections::{BTreeMap, BTreeSet};

use tsuro_protocol::{Message, PlayerId};

use crate::{Board, PlacedTile, TokenPosition};

/// Where the mirrored server is in its round cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No round announced yet.
    #[default]
    Lobby,
    /// A countdown is running.
    Countdown,
    /// A round is being played.
    Running,
}

/// State assembled from the stream of server messages.
#[derive(Debug, Clone, Default)]
pub struct GameView {
    me: Option<PlayerId>,
    names: BTreeMap<PlayerId, String>,
    board: Board,
    hand: Vec<u16>,
    /// Seated players in the order their first turn was announced.
    seats: Vec<PlayerId>,
    current_turn: Option<PlayerId>,
    eliminated: BTreeSet<PlayerId>,
    phase: Phase,
}

impl GameView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one server message.
    pub fn apply(&mut self, msg: &Message) {
        match msg {
            Message::Welcome { idnum } => self.me = Some(*idnum),
            Message::PlayerJoined { idnum, name } => {
                self.names.insert(*idnum, name.clone());
            }
            Message::PlayerLeft { idnum } => {
                self.names.remove(idnum);
            }
            Message::CountdownStarted => self.phase = Phase::Countdown,
            Message::GameStart => {
                self.board.reset();
                self.hand.clear();
                self.seats.clear();
                self.current_turn = None;
                self.eliminated.clear();
                self.phase = Phase::Running;
            }
            Message::AddTileToHand { tileid } => self.hand.push(*tileid),
            Message::PlayerTurn { idnum } => {
                if !self.seats.contains(idnum) {
                    self.seats.push(*idnum);
                }
                self.current_turn = Some(*idnum);
            }
            Message::PlaceTile {
                idnum,
                tileid,
                rotation,
                x,
                y,
            } => {
                if let (Ok(x), Ok(y)) = (u8::try_from(*x), u8::try_from(*y)) {
                    self.board.record_tile(
                        x,
                        y,
                        PlacedTile {
                            tile: *tileid,
                            rotation: (*rotation % 4) as u8,
                            placer: *idnum,
                        },
                    );
                }
                if self.me == Some(*idnum) {
                    if let Some(i) = self.hand.iter().position(|t| t == tileid) {
                        self.hand.remove(i);
                    }
                }
            }
            Message::MoveToken {
                idnum,
                x,
                y,
                position,
            } => {
                if let (Ok(x), Ok(y), Ok(port)) = (
                    u8::try_from(*x),
                    u8::try_from(*y),
                    u8::try_from(*position),
                ) {
                    self.board.record_position(TokenPosition {
                        player: *idnum,
                        x,
                        y,
                        port,
                    });
                }
            }
            Message::PlayerEliminated { idnum } => {
                self.eliminated.insert(*idnum);
            }
        }
    }

    /// Our own id, once welcomed.
    pub fn me(&self) -> Option<PlayerId> {
        self.me
    }

    /// Display name of every other known connection.
    pub fn names(&self) -> &BTreeMap<PlayerId, String> {
        &self.names
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn hand(&self) -> &[u16] {
        &self.hand
    }

    pub fn seats(&self) -> &[PlayerId] {
        &self.seats
    }

    pub fn current_turn(&self) -> Option<PlayerId> {
        self.current_turn
    }

    /// Whether it's our turn right now.
    pub fn is_my_turn(&self) -> bool {
        self.me.is_some() && self.me == self.current_turn
    }

    pub fn eliminated(&self) -> &BTreeSet<PlayerId> {
        &self.eliminated
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_and_hand() {
        let mut view = GameView::new();
        view.apply(&Message::Welcome { idnum: PlayerId(3) });
        view.apply(&Message::GameStart);
        view.apply(&Message::AddTileToHand { tileid: 1 });
        view.apply(&Message::AddTileToHand { tileid: 7 });
        view.apply(&Message::PlayerTurn { idnum: PlayerId(3) });

        assert_eq!(view.me(), Some(PlayerId(3)));
        assert_eq!(view.hand(), &[1, 7]);
        assert!(view.is_my_turn());
        assert_eq!(view.phase(), Phase::Running);
    }

    #[test]
    fn test_own_placement_leaves_the_hand() {
        let mut view = GameView::new();
        view.apply(&Message::Welcome { idnum: PlayerId(1) });
        view.apply(&Message::AddTileToHand { tileid: 4 });
        view.apply(&Message::PlaceTile {
            idnum: PlayerId(1),
            tileid: 4,
            rotation: 2,
            x: 0,
            y: 3,
        });
        assert!(view.hand().is_empty());
        let placed = view.board().tile_at(0, 3).unwrap();
        assert_eq!((placed.tile, placed.rotation), (4, 2));
    }

    #[test]
    fn test_announcements_are_applied_without_validation() {
        let mut view = GameView::new();
        // Interior cell with no token: illegal as a request, fine as news.
        view.apply(&Message::PlaceTile {
            idnum: PlayerId(2),
            tileid: 0,
            rotation: 0,
            x: 2,
            y: 2,
        });
        view.apply(&Message::MoveToken {
            idnum: PlayerId(2),
            x: 2,
            y: 2,
            position: 1,
        });
        assert!(view.board().tile_at(2, 2).is_some());
        assert_eq!(view.board().player_position(PlayerId(2)).unwrap().port, 1);
    }

    #[test]
    fn test_game_start_resets_round_state_but_keeps_names() {
        let mut view = GameView::new();
        view.apply(&Message::PlayerJoined {
            idnum: PlayerId(5),
            name: "10.0.0.5:4000".into(),
        });
        view.apply(&Message::PlayerTurn { idnum: PlayerId(5) });
        view.apply(&Message::PlayerEliminated { idnum: PlayerId(5) });
        view.apply(&Message::GameStart);

        assert!(view.seats().is_empty());
        assert!(view.eliminated().is_empty());
        assert_eq!(view.current_turn(), None);
        assert_eq!(view.names().len(), 1);
    }

    #[test]
    fn test_seats_follow_first_turn_order() {
        let mut view = GameView::new();
        for id in [4, 2, 9, 4, 2] {
            view.apply(&Message::PlayerTurn { idnum: PlayerId(id) });
        }
        assert_eq!(view.seats(), &[PlayerId(4), PlayerId(2), PlayerId(9)]);
    }
}
