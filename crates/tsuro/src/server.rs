//! `TsuroServer` builder and accept loop.
//!
//! The accept loop only hands sockets over; the scheduler task owns every
//! connection from the moment it arrives.

use tokio::sync::mpsc;
use tsuro_game::{GameConfig, Scheduler};
use tsuro_transport::{TcpConnection, TcpTransport, Transport};

use crate::TsuroError;

/// Address the server listens on unless told otherwise.
pub const DEFAULT_BIND: &str = "0.0.0.0:30020";

/// Accepted sockets waiting for the scheduler to pick them up.
const ARRIVAL_QUEUE: usize = 64;

/// Builder for configuring and starting a Tsuro server.
///
/// # Example
///
/// ```rust,ignore
/// use tsuro::prelude::*;
///
/// let server = TsuroServer::builder()
///     .bind("0.0.0.0:30020")
///     .config(GameConfig::default())
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct TsuroServerBuilder {
    bind_addr: String,
    config: GameConfig,
}

impl TsuroServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            config: GameConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the player limit, hand size and timings.
    pub fn config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the listener. Nothing is accepted until [`TsuroServer::run`].
    pub async fn build(self) -> Result<TsuroServer, TsuroError> {
        let transport = TcpTransport::bind(&self.bind_addr).await?;
        Ok(TsuroServer {
            transport,
            config: self.config,
        })
    }
}

impl Default for TsuroServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Tsuro server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct TsuroServer {
    transport: TcpTransport,
    config: GameConfig,
}

impl TsuroServer {
    /// Creates a new builder.
    pub fn builder() -> TsuroServerBuilder {
        TsuroServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Spawns the scheduler and runs the accept loop.
    ///
    /// Accept errors are logged and the loop keeps going. Returns only if
    /// the scheduler task has gone away.
    pub async fn run(self) -> Result<(), TsuroError> {
        let Self {
            mut transport,
            config,
        } = self;
        let (arrivals, rx) = mpsc::channel::<TcpConnection>(ARRIVAL_QUEUE);
        tokio::spawn(Scheduler::new(config, rx).run());

        tracing::info!("Tsuro server running");

        loop {
            match transport.accept().await {
                Ok(conn) => {
                    if arrivals.send(conn).await.is_err() {
                        tracing::error!("scheduler stopped, closing listener");
                        return Err(TsuroError::SchedulerStopped);
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_binds_ephemeral_port() {
        let server = TsuroServer::builder().bind("127.0.0.1:0").build().await.unwrap();
        let addr = server.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_build_reports_bind_failure() {
        let first = TsuroServer::builder().bind("127.0.0.1:0").build().await.unwrap();
        let taken = first.local_addr().unwrap().to_string();

        let second = TsuroServer::builder().bind(&taken).build().await;
        assert!(matches!(second, Err(TsuroError::Transport(_))));
    }

    #[test]
    fn test_builder_defaults_to_the_game_port() {
        let builder = TsuroServerBuilder::default();
        assert_eq!(builder.bind_addr, "0.0.0.0:30020");
        assert_eq!(builder.config.player_limit, GameConfig::default().player_limit);
    }
}
