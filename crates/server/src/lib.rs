//! zipgate server - HTTP front end for debounced archive extraction
//!
//! A request names a key; the server claims it, schedules its release after a
//! fixed grace period, and hands it to the archiver. A second request for the
//! same key inside the grace period is answered with
//! `{"Error":"already processing"}` instead of running the archiver again.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API
//!
//! - `ANY /?key=<key>` (also any other path) - claim and process `key`
//!
//! # Configuration
//!
//! Read from an optional `zipgate.{toml,yaml,json}` file and `ZIPGATE__*`
//! environment variables, e.g. `ZIPGATE__PORT=9000` or
//! `ZIPGATE__ARCHIVE__SOURCE_DIR=/srv/zips`.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, serve, start_server};
pub use state::ServerState;
