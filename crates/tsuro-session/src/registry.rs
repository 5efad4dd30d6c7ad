//! The connection registry: every live socket and the player id it holds.
//!
//! # Concurrency note
//!
//! `ConnectionRegistry` is not shared. The scheduler task owns it outright
//! and is the only writer; connections are handed out as `Arc`s so a
//! pending `recv` can be raced against other work without borrowing the
//! registry.

use std::sync::Arc;

use tsuro_protocol::{encode, Message, MessageBuffer, PlayerId, IDNUM_LIMIT};
use tsuro_transport::Connection;

use crate::SessionError;

/// One registered connection.
struct Entry<C> {
    id: PlayerId,
    /// Peer address as `host:port`, announced in `PlayerJoined`.
    name: String,
    conn: Arc<C>,
    /// Bytes received from this peer that don't yet form a full message.
    inbound: MessageBuffer,
}

/// Every live connection, in admission order.
pub struct ConnectionRegistry<C: Connection> {
    entries: Vec<Entry<C>>,
    /// The id the next allocation tries first.
    next_id: u32,
}

impl<C: Connection> Default for ConnectionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connection> ConnectionRegistry<C> {
    /// An empty registry. The first allocated id is 0.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    /// Hands out the next free player id.
    ///
    /// Ids count up and wrap at 65536. An id still held by a live
    /// connection is skipped, so two live connections never share one.
    pub fn allocate_id(&mut self) -> Result<PlayerId, SessionError> {
        for _ in 0..IDNUM_LIMIT {
            let candidate = PlayerId(self.next_id as u16);
            self.next_id = (self.next_id + 1) % IDNUM_LIMIT;
            if !self.contains(candidate) {
                return Ok(candidate);
            }
        }
        Err(SessionError::IdsExhausted)
    }

    /// Registers a connection under `id`.
    pub fn insert(&mut self, id: PlayerId, name: String, conn: Arc<C>) -> Result<(), SessionError> {
        if self.contains(id) {
            return Err(SessionError::IdInUse(id));
        }
        tracing::debug!(player = %id, %name, conn = %conn.id(), "connection registered");
        self.entries.push(Entry {
            id,
            name,
            conn,
            inbound: MessageBuffer::new(),
        });
        Ok(())
    }

    /// Removes a connection and returns it so the caller can close it.
    pub fn remove(&mut self, id: PlayerId) -> Option<Arc<C>> {
        let pos = self.position(id)?;
        let entry = self.entries.remove(pos);
        tracing::debug!(player = %id, "connection unregistered");
        Some(entry.conn)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.position(id).is_some()
    }

    /// Ids of every connection, in admission order.
    pub fn ids(&self) -> Vec<PlayerId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    /// `(id, name)` of every connection, in admission order.
    pub fn identities(&self) -> Vec<(PlayerId, String)> {
        self.entries.iter().map(|e| (e.id, e.name.clone())).collect()
    }

    /// A handle to the player's connection.
    pub fn connection(&self, id: PlayerId) -> Option<Arc<C>> {
        self.entry(id).map(|e| Arc::clone(&e.conn))
    }

    /// The player's reassembly buffer.
    pub fn inbound_mut(&mut self, id: PlayerId) -> Option<&mut MessageBuffer> {
        let pos = self.position(id)?;
        Some(&mut self.entries[pos].inbound)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    /// Sends `msg` to every connection.
    ///
    /// The message is encoded once. Returns the ids whose send failed;
    /// the registry doesn't remove them, that's the caller's decision.
    pub async fn broadcast(&self, msg: &Message) -> Result<Vec<PlayerId>, SessionError> {
        let bytes = encode(msg)?;
        let mut failed = Vec::new();
        for entry in &self.entries {
            if let Err(e) = entry.conn.send(&bytes).await {
                tracing::debug!(player = %entry.id, error = %e, "broadcast send failed");
                failed.push(entry.id);
            }
        }
        tracing::trace!(?msg, recipients = self.entries.len(), failed = failed.len(), "broadcast");
        Ok(failed)
    }

    /// Sends `msg` to one player.
    pub async fn send_to(&self, id: PlayerId, msg: &Message) -> Result<(), SessionError> {
        let entry = self.entry(id).ok_or(SessionError::NotFound(id))?;
        let bytes = encode(msg)?;
        entry
            .conn
            .send(&bytes)
            .await
            .map_err(|e| SessionError::SendFailed {
                player: id,
                reason: e.to_string(),
            })
    }

    fn position(&self, id: PlayerId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    fn entry(&self, id: PlayerId) -> Option<&Entry<C>> {
        self.entries.iter().find(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use tsuro_protocol::decode;
    use tsuro_transport::ConnectionId;

    use super::*;

    // -- Helpers ----------------------------------------------------------

    /// Records what was sent; fails every send once `broken` is set.
    struct MockConnection {
        id: ConnectionId,
        sent: Mutex<Vec<Vec<u8>>>,
        broken: AtomicBool,
    }

    impl MockConnection {
        fn new(id: u64) -> Arc<Self> {
            Arc::new(Self {
                id: ConnectionId::new(id),
                sent: Mutex::new(Vec::new()),
                broken: AtomicBool::new(false),
            })
        }

        fn break_pipe(&self) {
            self.broken.store(true, Ordering::SeqCst);
        }

        fn received(&self) -> Vec<Message> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|b| decode(b).unwrap().unwrap().0)
                .collect()
        }
    }

    impl Connection for MockConnection {
        type Error = std::io::Error;

        async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(std::io::ErrorKind::BrokenPipe.into());
            }
            self.sent.lock().unwrap().push(data.to_vec());
            Ok(())
        }

        async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
            Ok(None)
        }

        async fn close(&self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn id(&self) -> ConnectionId {
            self.id
        }

        fn peer_addr(&self) -> SocketAddr {
            SocketAddr::from(([127, 0, 0, 1], 4000 + self.id.into_inner() as u16))
        }
    }

    fn registry_with(n: u64) -> (ConnectionRegistry<MockConnection>, Vec<Arc<MockConnection>>) {
        let mut reg = ConnectionRegistry::new();
        let mut conns = Vec::new();
        for i in 0..n {
            let conn = MockConnection::new(i);
            let id = reg.allocate_id().unwrap();
            reg.insert(id, conn.peer_addr().to_string(), Arc::clone(&conn))
                .unwrap();
            conns.push(conn);
        }
        (reg, conns)
    }

    // =====================================================================
    // allocate_id()
    // =====================================================================

    #[test]
    fn test_ids_start_at_zero_and_count_up() {
        let mut reg = ConnectionRegistry::<MockConnection>::new();
        assert_eq!(reg.allocate_id().unwrap(), PlayerId(0));
        assert_eq!(reg.allocate_id().unwrap(), PlayerId(1));
    }

    #[test]
    fn test_ids_wrap_and_skip_live_ones() {
        let mut reg = ConnectionRegistry::new();
        reg.insert(PlayerId(0), "a".into(), MockConnection::new(0))
            .unwrap();
        reg.next_id = IDNUM_LIMIT - 1;

        assert_eq!(reg.allocate_id().unwrap(), PlayerId(65_535));
        // 0 is still held, so the wrap lands on 1.
        assert_eq!(reg.allocate_id().unwrap(), PlayerId(1));
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let (mut reg, _) = registry_with(1);
        let result = reg.insert(PlayerId(0), "x".into(), MockConnection::new(9));
        assert!(matches!(result, Err(SessionError::IdInUse(PlayerId(0)))));
        assert_eq!(reg.len(), 1);
    }

    // =====================================================================
    // lookup and removal
    // =====================================================================

    #[test]
    fn test_identities_keep_admission_order() {
        let (reg, _) = registry_with(3);
        let ids: Vec<u16> = reg.identities().iter().map(|(id, _)| id.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(reg.identities()[1].1, "127.0.0.1:4001");
    }

    #[test]
    fn test_remove_returns_connection_and_forgets_it() {
        let (mut reg, conns) = registry_with(2);
        let removed = reg.remove(PlayerId(0)).unwrap();
        assert_eq!(removed.id(), conns[0].id());
        assert!(!reg.contains(PlayerId(0)));
        assert!(reg.remove(PlayerId(0)).is_none());
        assert_eq!(reg.ids(), vec![PlayerId(1)]);
    }

    #[test]
    fn test_inbound_buffer_is_per_connection() {
        let (mut reg, _) = registry_with(2);
        reg.inbound_mut(PlayerId(0)).unwrap().extend(&[0, 1]);
        assert_eq!(reg.inbound_mut(PlayerId(0)).unwrap().pending_len(), 2);
        assert_eq!(reg.inbound_mut(PlayerId(1)).unwrap().pending_len(), 0);
        assert!(reg.inbound_mut(PlayerId(7)).is_none());
    }

    // =====================================================================
    // broadcast() / send_to()
    // =====================================================================

    #[tokio::test]
    async fn test_broadcast_reaches_everyone() {
        let (reg, conns) = registry_with(3);
        let failed = reg.broadcast(&Message::CountdownStarted).await.unwrap();
        assert!(failed.is_empty());
        for conn in &conns {
            assert_eq!(conn.received(), vec![Message::CountdownStarted]);
        }
    }

    #[tokio::test]
    async fn test_broadcast_reports_failures_and_keeps_going() {
        let (reg, conns) = registry_with(3);
        conns[1].break_pipe();

        let failed = reg.broadcast(&Message::GameStart).await.unwrap();

        assert_eq!(failed, vec![PlayerId(1)]);
        assert_eq!(conns[0].received(), vec![Message::GameStart]);
        assert_eq!(conns[2].received(), vec![Message::GameStart]);
        // Still registered: removal is the caller's call.
        assert!(reg.contains(PlayerId(1)));
    }

    #[tokio::test]
    async fn test_send_to_targets_one_player() {
        let (reg, conns) = registry_with(2);
        reg.send_to(PlayerId(1), &Message::AddTileToHand { tileid: 3 })
            .await
            .unwrap();
        assert!(conns[0].received().is_empty());
        assert_eq!(conns[1].received(), vec![Message::AddTileToHand { tileid: 3 }]);
    }

    #[tokio::test]
    async fn test_send_to_errors() {
        let (reg, conns) = registry_with(1);
        let missing = reg.send_to(PlayerId(5), &Message::GameStart).await;
        assert!(matches!(missing, Err(SessionError::NotFound(PlayerId(5)))));

        conns[0].break_pipe();
        let broken = reg.send_to(PlayerId(0), &Message::GameStart).await;
        assert!(matches!(
            broken,
            Err(SessionError::SendFailed { player: PlayerId(0), .. })
        ));
    }
}
