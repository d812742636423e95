//! API route handlers
//!
//! The server exposes a single handler, [`unzip::unzip_key`], mounted on `/`
//! for every method and used as the fallback for every other path.

pub mod unzip;

pub use unzip::{unzip_key, AlreadyProcessing, UnzipOutcome};
