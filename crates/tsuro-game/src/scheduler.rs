//! The scheduler actor: sole owner of the connections and the round.
//!
//! The accept loop hands new connections over an mpsc channel and never
//! touches game state. Admission, catch-up, the round lifecycle and turns
//! all run here, one step at a time.
//!
//! The scheduler waits on the current player's socket (bounded by the
//! turn timer), on the fixed delays between rounds, and on the arrivals
//! channel. Arrivals are admitted during the other two waits.

use std::collections::VecDeque;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tsuro_protocol::{encode, Message, PlayerId, Recipient};
use tsuro_session::{ConnectionRegistry, SessionError};
use tsuro_transport::Connection;

use crate::autoplay::fallback_move;
use crate::game::Outbound;
use crate::{Game, GameConfig, SchedulerState};

/// What a wait on the current player's socket produced.
enum Input {
    Data(Vec<u8>),
    Closed,
    TimedOut,
    /// The player was dropped while we waited, e.g. a broadcast to them
    /// failed during an admission.
    Removed,
}

/// Runs rounds back to back for whoever is connected.
pub struct Scheduler<C: Connection> {
    config: GameConfig,
    state: SchedulerState,
    registry: ConnectionRegistry<C>,
    game: Option<Game>,
    arrivals: mpsc::Receiver<C>,
    /// Cleared once every sender is gone.
    arrivals_open: bool,
    rng: StdRng,
    round: u64,
}

impl<C: Connection> Scheduler<C> {
    /// Creates a scheduler fed by `arrivals`.
    pub fn new(config: GameConfig, arrivals: mpsc::Receiver<C>) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            config,
            state: SchedulerState::WaitingForConnections,
            registry: ConnectionRegistry::new(),
            game: None,
            arrivals,
            arrivals_open: true,
            rng,
            round: 0,
        }
    }

    /// Runs until the arrivals channel is closed and nobody is connected.
    pub async fn run(mut self) {
        tracing::info!("scheduler started");

        loop {
            match self.state {
                SchedulerState::WaitingForConnections => {
                    if !self.registry.is_empty() {
                        self.transition(SchedulerState::Countdown);
                    } else if !self.arrivals_open {
                        break;
                    } else {
                        tracing::debug!("waiting for connections");
                        self.pause(self.config.connection_poll).await;
                    }
                }
                SchedulerState::Countdown => {
                    self.round += 1;
                    self.game = None;
                    tracing::info!(round = self.round, countdown = ?self.config.countdown, "new round starting");
                    self.dispatch(vec![(Recipient::All, Message::CountdownStarted)])
                        .await;
                    self.pause(self.config.countdown).await;
                    self.dispatch(vec![(Recipient::All, Message::GameStart)]).await;
                    self.transition(SchedulerState::Seating);
                }
                SchedulerState::Seating => {
                    self.seat_players().await;
                    self.transition(SchedulerState::InProgress);
                }
                SchedulerState::InProgress => {
                    if !self.play_turn().await {
                        self.transition(SchedulerState::RoundOver);
                    }
                }
                SchedulerState::RoundOver => {
                    self.finish_round();
                    if self.registry.is_empty() {
                        self.transition(SchedulerState::WaitingForConnections);
                    } else {
                        self.transition(SchedulerState::Countdown);
                    }
                }
            }
        }

        tracing::info!("scheduler stopped");
    }

    fn transition(&mut self, next: SchedulerState) {
        debug_assert!(self.state.can_transition_to(next), "{} -> {}", self.state, next);
        tracing::debug!(from = %self.state, to = %next, "scheduler state change");
        self.state = next;
    }

    // -----------------------------------------------------------------------
    // Round lifecycle
    // -----------------------------------------------------------------------

    async fn seat_players(&mut self) {
        if self.registry.len() < self.config.player_limit {
            tracing::debug!(
                connected = self.registry.len(),
                wait = ?self.config.seat_wait,
                "waiting for more players"
            );
            self.pause(self.config.seat_wait).await;
        }

        let mut seats = self.registry.ids();
        seats.shuffle(&mut self.rng);
        seats.truncate(self.config.player_limit);
        tracing::info!(round = self.round, players = ?seats, "players seated");

        let mut game = Game::new(seats, self.config.hand_size);
        let deal = game.deal(&mut self.rng);
        self.game = Some(game);
        self.dispatch(deal).await;
    }

    /// Plays one turn. Returns `false` when the round is over.
    async fn play_turn(&mut self) -> bool {
        let Some(game) = self.game.as_mut() else {
            return false;
        };
        let Some(player) = game.next_turn() else {
            return false;
        };
        let turn = game.turn();

        tracing::debug!(round = self.round, turn, %player, "turn started");
        self.dispatch(vec![(Recipient::All, Message::PlayerTurn { idnum: player })])
            .await;
        self.run_turn(player).await;

        match self.game.as_mut() {
            Some(game) => {
                game.finish_turn();
                !game.is_over()
            }
            None => false,
        }
    }

    fn finish_round(&mut self) {
        if let Some(game) = self.game.take() {
            match game.winner() {
                Some(winner) => {
                    tracing::info!(round = self.round, %winner, turns = game.turn(), "round won");
                }
                None => tracing::info!(round = self.round, turns = game.turn(), "round ended without a winner"),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Turns
    // -----------------------------------------------------------------------

    /// One exchange with the turn holder.
    ///
    /// At most one action is applied. An illegal action restarts the timer
    /// and waits again; after `max_rejections` of them, or when the timer
    /// runs out, the server plays for the player instead.
    async fn run_turn(&mut self, player: PlayerId) {
        let Some(conn) = self.registry.connection(player) else {
            // Dropped between being dequeued and now.
            let out = self.disconnect(player).await;
            self.dispatch(out).await;
            return;
        };
        let mut deadline = Instant::now() + self.config.turn_timeout;
        let mut rejections = 0;

        loop {
            let Some(buffer) = self.registry.inbound_mut(player) else {
                return;
            };
            let msg = match buffer.next_message() {
                Ok(Some(msg)) => msg,
                Ok(None) => {
                    match self.wait_for_input(player, &conn, deadline).await {
                        Input::Data(bytes) => {
                            if let Some(buffer) = self.registry.inbound_mut(player) {
                                buffer.extend(&bytes);
                            }
                        }
                        Input::Closed => {
                            tracing::info!(%player, "player disconnected during their turn");
                            let out = self.disconnect(player).await;
                            self.dispatch(out).await;
                            return;
                        }
                        Input::Removed => {
                            tracing::debug!(%player, "turn holder removed mid-turn, turn ends");
                            return;
                        }
                        Input::TimedOut => {
                            tracing::info!(%player, "turn timed out, playing for them");
                            self.play_for(player).await;
                            return;
                        }
                    }
                    continue;
                }
                Err(e) => {
                    tracing::warn!(%player, error = %e, "malformed input discarded");
                    continue;
                }
            };

            tracing::debug!(%player, ?msg, "received");
            let Some(game) = self.game.as_mut() else {
                return;
            };
            match game.handle_message(&msg, &mut self.rng) {
                Ok(out) => {
                    self.dispatch(out).await;
                    self.discard_leftovers(player);
                    return;
                }
                Err(e) if e.is_rejection() => {
                    rejections += 1;
                    tracing::warn!(%player, error = %e, rejections, "illegal action");
                    if rejections >= self.config.max_rejections {
                        tracing::info!(%player, "too many illegal actions, playing for them");
                        self.play_for(player).await;
                        return;
                    }
                    deadline = Instant::now() + self.config.turn_timeout;
                }
                Err(e) => {
                    tracing::warn!(%player, error = %e, "message dropped");
                }
            }
        }
    }

    /// Waits for bytes from `player`'s `conn` until `deadline`, admitting
    /// arrivals in the meantime without moving the deadline.
    async fn wait_for_input(&mut self, player: PlayerId, conn: &Arc<C>, deadline: Instant) -> Input {
        loop {
            tokio::select! {
                res = tokio::time::timeout_at(deadline, conn.recv()) => {
                    return match res {
                        Err(_) => Input::TimedOut,
                        Ok(Ok(Some(bytes))) => Input::Data(bytes),
                        Ok(Ok(None)) => Input::Closed,
                        Ok(Err(e)) => {
                            tracing::debug!(conn = %conn.id(), error = %e, "receive failed");
                            Input::Closed
                        }
                    };
                }
                arrival = self.arrivals.recv(), if self.arrivals_open => {
                    self.on_arrival(arrival).await;
                    if !self.registry.contains(player) {
                        return Input::Removed;
                    }
                }
            }
        }
    }

    async fn play_for(&mut self, player: PlayerId) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        let Some(action) = fallback_move(game, player, &mut self.rng) else {
            tracing::warn!(%player, "no fallback move available, turn skipped");
            return;
        };
        match game.handle_message(&action, &mut self.rng) {
            Ok(out) => self.dispatch(out).await,
            Err(e) => tracing::warn!(%player, error = %e, ?action, "fallback move refused"),
        }
        self.discard_leftovers(player);
    }

    /// Drops whole messages still buffered after the turn's action. A
    /// trailing partial message is kept.
    fn discard_leftovers(&mut self, player: PlayerId) {
        if let Some(buffer) = self.registry.inbound_mut(player) {
            let (stale, err) = buffer.drain_messages();
            if !stale.is_empty() || err.is_some() {
                tracing::debug!(%player, discarded = stale.len(), "extra input after action ignored");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Connections
    // -----------------------------------------------------------------------

    /// Sleeps for `duration` while still admitting arrivals.
    async fn pause(&mut self, duration: Duration) {
        let sleep = tokio::time::sleep(duration);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                () = &mut sleep => return,
                arrival = self.arrivals.recv(), if self.arrivals_open => {
                    self.on_arrival(arrival).await;
                }
            }
        }
    }

    async fn on_arrival(&mut self, arrival: Option<C>) {
        match arrival {
            Some(conn) => self.admit(conn).await,
            None => {
                tracing::debug!("arrivals channel closed");
                self.arrivals_open = false;
            }
        }
    }

    /// Welcomes a connection and brings it up to date.
    ///
    /// The newcomer gets `Welcome`, everyone else hears `PlayerJoined`,
    /// then the newcomer is introduced to the existing connections and,
    /// mid-round, replayed the round so far.
    async fn admit(&mut self, conn: C) {
        let conn = Arc::new(conn);
        let id = match self.registry.allocate_id() {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(peer = %conn.peer_addr(), error = %e, "connection refused");
                let _ = conn.close().await;
                return;
            }
        };
        let name = conn.peer_addr().to_string();
        tracing::info!(player = %id, %name, "connection admitted");

        if !send_direct(conn.as_ref(), &Message::Welcome { idnum: id }).await {
            let _ = conn.close().await;
            return;
        }
        self.dispatch(vec![(
            Recipient::All,
            Message::PlayerJoined {
                idnum: id,
                name: name.clone(),
            },
        )])
        .await;

        let mut catch_up: Vec<Message> = self
            .registry
            .identities()
            .into_iter()
            .map(|(idnum, name)| Message::PlayerJoined { idnum, name })
            .collect();
        if let Some(game) = &self.game {
            catch_up.extend(game.catch_up());
        }

        if let Err(e) = self.registry.insert(id, name, Arc::clone(&conn)) {
            tracing::warn!(player = %id, error = %e, "could not register connection");
            let _ = conn.close().await;
            return;
        }
        self.dispatch(
            catch_up
                .into_iter()
                .map(|msg| (Recipient::Player(id), msg))
                .collect(),
        )
        .await;
    }

    /// Removes a connection, closes it, and eliminates it if seated.
    ///
    /// Returns the announcements to send: `PlayerEliminated` (if it was
    /// live in the round) followed by `PlayerLeft`.
    async fn disconnect(&mut self, player: PlayerId) -> Outbound {
        let Some(conn) = self.registry.remove(player) else {
            return Vec::new();
        };
        if let Err(e) = conn.close().await {
            tracing::debug!(%player, error = %e, "close failed");
        }
        tracing::info!(%player, remaining = self.registry.len(), "connection dropped");

        let mut out = self
            .game
            .as_mut()
            .map(|game| game.eliminate(player))
            .unwrap_or_default();
        out.push((Recipient::All, Message::PlayerLeft { idnum: player }));
        out
    }

    /// Delivers messages in order.
    ///
    /// A failed send is a disconnect: the connection is dropped and its
    /// announcements are queued behind the remaining messages.
    async fn dispatch(&mut self, msgs: Outbound) {
        let mut queue: VecDeque<(Recipient, Message)> = msgs.into();
        while let Some((to, msg)) = queue.pop_front() {
            let failed = match to {
                Recipient::All => match self.registry.broadcast(&msg).await {
                    Ok(failed) => failed,
                    Err(e) => {
                        tracing::warn!(error = %e, ?msg, "broadcast failed");
                        Vec::new()
                    }
                },
                Recipient::Player(id) => match self.registry.send_to(id, &msg).await {
                    Ok(()) => Vec::new(),
                    Err(SessionError::SendFailed { player, reason }) => {
                        tracing::debug!(%player, %reason, "send failed");
                        vec![player]
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, ?msg, "message not delivered");
                        Vec::new()
                    }
                },
            };
            for id in failed {
                queue.extend(self.disconnect(id).await);
            }
        }
    }
}

/// Sends to a connection that isn't registered yet.
async fn send_direct<C: Connection>(conn: &C, msg: &Message) -> bool {
    let bytes = match encode(msg) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "could not encode message");
            return false;
        }
    };
    match conn.send(&bytes).await {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(conn = %conn.id(), error = %e, "send failed");
            false
        }
    }
}
