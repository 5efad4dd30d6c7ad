//! The round aggregate: board, seats, turn queue and replay log.
//!
//! `Game` is plain data plus rules. It never touches a socket; every
//! operation returns the messages it wants sent, each paired with a
//! [`Recipient`], and the scheduler delivers them.

use std::collections::VecDeque;

use rand::Rng;
use tsuro_board::{Board, Movement, TILE_COUNT};
use tsuro_protocol::{Message, PlayerId, Recipient};

use crate::{Player, TurnError};

/// Messages produced by one game operation, in send order.
pub type Outbound = Vec<(Recipient, Message)>;

/// State for one round. Built at seating, dropped when the round ends.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    /// Seated players in turn order.
    players: Vec<Player>,
    queue: VecDeque<PlayerId>,
    live: Vec<PlayerId>,
    eliminated: Vec<PlayerId>,
    /// Every placement and position update, in broadcast order.
    replay: Vec<Message>,
    current: Option<PlayerId>,
    /// Turns completed this round, across all players.
    turn: u32,
    hand_size: usize,
}

impl Game {
    /// A fresh round with `seats` in turn order.
    pub fn new(seats: Vec<PlayerId>, hand_size: usize) -> Self {
        Self {
            board: Board::new(),
            queue: seats.iter().copied().collect(),
            live: seats.clone(),
            players: seats.into_iter().map(Player::new).collect(),
            eliminated: Vec::new(),
            replay: Vec::new(),
            current: None,
            turn: 0,
            hand_size,
        }
    }

    /// Fills every hand. Each tile is announced to its holder only.
    pub fn deal<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Outbound {
        let mut out = Vec::with_capacity(self.players.len() * self.hand_size);
        for player in &mut self.players {
            for _ in 0..self.hand_size {
                let tileid = draw(rng);
                player.hand.push(tileid);
                out.push((Recipient::Player(player.id), Message::AddTileToHand { tileid }));
            }
        }
        out
    }

    // -----------------------------------------------------------------------
    // Turn queue
    // -----------------------------------------------------------------------

    /// Dequeues the next live player and makes them the turn holder.
    ///
    /// Ids that were eliminated or disconnected since they were queued are
    /// discarded without using up a turn.
    pub fn next_turn(&mut self) -> Option<PlayerId> {
        while let Some(id) = self.queue.pop_front() {
            if self.is_live(id) {
                self.current = Some(id);
                return Some(id);
            }
            tracing::trace!(player = %id, "skipping player no longer live");
        }
        None
    }

    /// Closes the current turn and requeues the holder if they survived.
    pub fn finish_turn(&mut self) {
        self.turn += 1;
        let Some(id) = self.current else {
            return;
        };
        if let Some(player) = self.player_mut(id) {
            player.turns += 1;
        }
        if self.is_live(id) {
            self.queue.push_back(id);
        }
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Applies a message from a client.
    ///
    /// Only `PlaceTile` and `MoveToken` are actions; anything else is
    /// refused with [`TurnError::Unexpected`].
    pub fn handle_message<R: Rng + ?Sized>(
        &mut self,
        msg: &Message,
        rng: &mut R,
    ) -> Result<Outbound, TurnError> {
        match *msg {
            Message::PlaceTile {
                idnum,
                tileid,
                rotation,
                x,
                y,
            } => self.handle_place(idnum, tileid, rotation, x, y, rng),
            Message::MoveToken {
                idnum,
                x,
                y,
                position,
            } => self.handle_move(idnum, x, y, position),
            ref other => Err(TurnError::Unexpected(other.message_type())),
        }
    }

    /// Places a tile from the turn holder's hand.
    ///
    /// On success the placement is broadcast, tokens move, and everyone
    /// pushed off the board is eliminated. A placer who survives swaps the
    /// used tile for a fresh draw, announced to them alone.
    pub fn handle_place<R: Rng + ?Sized>(
        &mut self,
        player: PlayerId,
        tile: u16,
        rotation: u16,
        x: u16,
        y: u16,
        rng: &mut R,
    ) -> Result<Outbound, TurnError> {
        self.check_turn(player)?;
        if !self.player(player).is_some_and(|p| p.holds(tile)) {
            return Err(TurnError::TileNotInHand { player, tile });
        }
        self.board.try_place_tile(x, y, tile, rotation, player)?;

        let placed = Message::PlaceTile {
            idnum: player,
            tileid: tile,
            rotation,
            x,
            y,
        };
        tracing::debug!(%player, tile, rotation, x, y, "tile placed");
        self.replay.push(placed.clone());
        let mut out = vec![(Recipient::All, placed)];
        if let Some(p) = self.player_mut(player) {
            // The board accepted the cell, so it fits in u8.
            p.start_cell.get_or_insert((x as u8, y as u8));
        }

        self.run_movement(&mut out);

        if self.is_live(player) {
            let tileid = draw(rng);
            if let Some(p) = self.player_mut(player) {
                p.take(tile);
                p.hand.push(tileid);
            }
            out.push((Recipient::Player(player), Message::AddTileToHand { tileid }));
        }
        Ok(out)
    }

    /// Puts the turn holder's token on its starting port, then moves it.
    pub fn handle_move(
        &mut self,
        player: PlayerId,
        x: u16,
        y: u16,
        port: u16,
    ) -> Result<Outbound, TurnError> {
        self.check_turn(player)?;
        self.board.try_set_start_position(player, x, y, port)?;
        tracing::debug!(%player, x, y, port, "start position chosen");

        let mut out = Vec::new();
        self.run_movement(&mut out);
        Ok(out)
    }

    /// Removes a player from the live set.
    ///
    /// Yields a `PlayerEliminated` broadcast, or nothing if the player
    /// wasn't live.
    pub fn eliminate(&mut self, player: PlayerId) -> Outbound {
        let Some(i) = self.live.iter().position(|id| *id == player) else {
            return Vec::new();
        };
        self.live.remove(i);
        self.eliminated.push(player);
        tracing::info!(%player, remaining = self.live.len(), "player eliminated");
        vec![(Recipient::All, Message::PlayerEliminated { idnum: player })]
    }

    fn run_movement(&mut self, out: &mut Outbound) {
        let Movement { updates, eliminated } = self.board.advance_tokens(&self.live);
        for position in updates {
            let msg = position.to_message();
            self.replay.push(msg.clone());
            out.push((Recipient::All, msg));
        }
        for id in eliminated {
            out.extend(self.eliminate(id));
        }
    }

    /// The turn holder may act only while still live.
    fn check_turn(&self, player: PlayerId) -> Result<(), TurnError> {
        if self.current == Some(player) && self.is_live(player) {
            Ok(())
        } else {
            Err(TurnError::NotYourTurn { requested: player })
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Everything a late joiner needs to rebuild the round: a turn
    /// announcement per live player, the eliminations, the current turn
    /// holder, then the full replay.
    pub fn catch_up(&self) -> Vec<Message> {
        let mut msgs: Vec<Message> = self
            .live
            .iter()
            .map(|&idnum| Message::PlayerTurn { idnum })
            .collect();
        msgs.extend(
            self.eliminated
                .iter()
                .map(|&idnum| Message::PlayerEliminated { idnum }),
        );
        if let Some(idnum) = self.current {
            msgs.push(Message::PlayerTurn { idnum });
        }
        msgs.extend(self.replay.iter().cloned());
        msgs
    }

    /// The round ends once at most one player is live.
    pub fn is_over(&self) -> bool {
        self.live.len() <= 1
    }

    /// The last player standing, if exactly one is.
    pub fn winner(&self) -> Option<PlayerId> {
        match self.live.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn is_live(&self, player: PlayerId) -> bool {
        self.live.contains(&player)
    }

    pub fn is_seated(&self, player: PlayerId) -> bool {
        self.player(player).is_some()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn live(&self) -> &[PlayerId] {
        &self.live
    }

    pub fn eliminated(&self) -> &[PlayerId] {
        &self.eliminated
    }

    pub fn current(&self) -> Option<PlayerId> {
        self.current
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn replay(&self) -> &[Message] {
        &self.replay
    }

    fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }
}

/// A uniformly random tile id. The supply is unlimited.
fn draw<R: Rng + ?Sized>(rng: &mut R) -> u16 {
    rng.random_range(0..TILE_COUNT)
}
