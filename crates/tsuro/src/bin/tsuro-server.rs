//! Runs a Tsuro server on the standard port.
//!
//! Log verbosity follows `RUST_LOG` and defaults to `info`.

use tracing_subscriber::EnvFilter;
use tsuro::prelude::*;

#[tokio::main]
async fn main() -> Result<(), TsuroError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let server = TsuroServer::builder().bind(DEFAULT_BIND).build().await?;
    tracing::info!(addr = %server.local_addr()?, "serving Tsuro");
    server.run().await
}
