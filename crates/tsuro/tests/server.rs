//! End-to-end tests: a real server on a loopback port and raw TCP
//! clients speaking the binary protocol.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tsuro::prelude::*;

// =========================================================================
// Client helpers
// =========================================================================

struct TcpClient {
    stream: TcpStream,
    buffer: MessageBuffer,
    view: GameView,
}

impl TcpClient {
    /// Connects and waits for `Welcome`.
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let mut client = Self {
            stream,
            buffer: MessageBuffer::new(),
            view: GameView::new(),
        };
        let welcome = client.next().await;
        assert!(matches!(welcome, Message::Welcome { .. }), "got {welcome:?}");
        client
    }

    async fn next(&mut self) -> Message {
        loop {
            if let Some(msg) = self.buffer.next_message().expect("server sent garbage") {
                self.view.apply(&msg);
                return msg;
            }
            let mut chunk = [0u8; 1024];
            let n = tokio::time::timeout(Duration::from_secs(5), self.stream.read(&mut chunk))
                .await
                .expect("server went quiet")
                .expect("read failed");
            assert!(n > 0, "server closed the connection");
            self.buffer.extend(&chunk[..n]);
        }
    }

    async fn until(&mut self, mut pred: impl FnMut(&Message) -> bool) -> Message {
        loop {
            let msg = self.next().await;
            if pred(&msg) {
                return msg;
            }
        }
    }

    async fn send(&mut self, msg: &Message) {
        self.stream.write_all(&encode(msg).unwrap()).await.unwrap();
    }

    fn id(&self) -> PlayerId {
        self.view.me().unwrap()
    }
}

async fn start_server(turn_timeout: Duration) -> SocketAddr {
    let config = GameConfig {
        countdown: Duration::from_millis(300),
        seat_wait: Duration::from_millis(100),
        connection_poll: Duration::from_millis(20),
        turn_timeout,
        seed: Some(7),
        ..GameConfig::default()
    };
    let server = TsuroServer::builder()
        .bind("127.0.0.1:0")
        .config(config)
        .build()
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

fn is_turn(msg: &Message) -> bool {
    matches!(msg, Message::PlayerTurn { .. })
}

// =========================================================================
// Lobby
// =========================================================================

#[tokio::test]
async fn test_connect_receives_welcome_and_introductions() {
    let addr = start_server(Duration::from_secs(5)).await;
    let mut a = TcpClient::connect(addr).await;
    let b = TcpClient::connect(addr).await;
    assert_ne!(a.id(), b.id());

    let joined = a
        .until(|m| matches!(m, Message::PlayerJoined { .. }))
        .await;
    let Message::PlayerJoined { idnum, .. } = joined else {
        unreachable!();
    };
    assert_eq!(idnum, b.id());
}

// =========================================================================
// Rounds
// =========================================================================

#[tokio::test]
async fn test_round_deals_hands_and_prompts_first_player() {
    let addr = start_server(Duration::from_secs(5)).await;
    let mut a = TcpClient::connect(addr).await;
    let mut b = TcpClient::connect(addr).await;

    a.until(|m| *m == Message::CountdownStarted).await;
    a.until(|m| *m == Message::GameStart).await;
    let Message::PlayerTurn { idnum } = a.until(is_turn).await else {
        unreachable!();
    };
    assert!(idnum == a.id() || idnum == b.id());
    assert_eq!(a.view.hand().len(), 4);

    b.until(is_turn).await;
    assert_eq!(b.view.hand().len(), 4);
    assert_eq!(a.view.phase(), Phase::Running);
}

#[tokio::test]
async fn test_legal_first_placement_is_broadcast() {
    let addr = start_server(Duration::from_secs(5)).await;
    let mut a = TcpClient::connect(addr).await;
    let mut b = TcpClient::connect(addr).await;

    let Message::PlayerTurn { idnum: first } = a.until(is_turn).await else {
        unreachable!();
    };
    b.until(is_turn).await;
    let (mover, watcher) = if a.id() == first { (&mut a, &mut b) } else { (&mut b, &mut a) };

    let placement = Message::PlaceTile {
        idnum: first,
        tileid: mover.view.hand()[0],
        rotation: 2,
        x: 4,
        y: 0,
    };
    mover.send(&placement).await;

    let seen = watcher
        .until(|m| matches!(m, Message::PlaceTile { .. }))
        .await;
    assert_eq!(seen, placement);
    assert!(watcher.view.board().tile_at(4, 0).is_some());
}

#[tokio::test]
async fn test_idle_player_is_played_for() {
    let addr = start_server(Duration::from_millis(150)).await;
    let mut a = TcpClient::connect(addr).await;
    let _b = TcpClient::connect(addr).await;

    let Message::PlayerTurn { idnum: first } = a.until(is_turn).await else {
        unreachable!();
    };
    let Message::PlaceTile { idnum, x, y, .. } = a
        .until(|m| matches!(m, Message::PlaceTile { .. }))
        .await
    else {
        unreachable!();
    };
    assert_eq!(idnum, first);
    assert!(Board::is_border(x as u8, y as u8));
}

#[tokio::test]
async fn test_disconnect_is_announced() {
    let addr = start_server(Duration::from_millis(150)).await;
    let mut a = TcpClient::connect(addr).await;
    let b = TcpClient::connect(addr).await;
    let gone = b.id();

    a.until(|m| matches!(m, Message::PlayerJoined { .. })).await;
    drop(b);

    let left = a
        .until(|m| matches!(m, Message::PlayerLeft { .. }))
        .await;
    assert_eq!(left, Message::PlayerLeft { idnum: gone });
    assert!(!a.view.names().contains_key(&gone));
}
