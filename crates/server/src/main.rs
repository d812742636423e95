//! zipgate server binary
//!
//! Serves the debounced unzip endpoint with configuration taken from
//! `zipgate.*`, `.env`, and `ZIPGATE__*` environment variables.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let config = ServerConfig::load()?;

    // Start server
    server::start_server(config).await?;

    Ok(())
}
