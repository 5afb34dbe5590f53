//! Worldwide API server entry point.

use clap::Parser;
use worldwide_server::ServerConfig;

fn main() -> anyhow::Result<()> {
    // A missing .env file is normal outside local development.
    let _ = dotenvy::dotenv();
    let config = ServerConfig::parse();
    worldwide_core::init_logging(&config.log_level, config.log_dir.as_deref())
        .map_err(anyhow::Error::msg)?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(worldwide_server::run(config))
}
