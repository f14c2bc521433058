//! TCP server for the matching engine.

use engine_server::config::Config;
use engine_server::{init_logging, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_logging(&config.log_level);

    tracing::info!(
        addr = %config.socket_addr_string(),
        max_clients = config.max_clients,
        data_dir = %config.data_dir.display(),
        "starting engine-server"
    );

    server::run(config).await
}
