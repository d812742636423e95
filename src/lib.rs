//! Core of the zipgate archive service.
//!
//! This crate owns the two pieces the HTTP layer builds on:
//!
//! - [`KeyRegistry`]: a debounced per-key lock. Claiming a key marks it busy
//!   and a release scheduled on the tokio timer frees it again after a fixed
//!   grace period, whether or not the triggered work has finished.
//! - [`Archiver`]: the seam behind which the actual extraction of a key's
//!   archive lives, configured through [`ArchiveConfig`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use zipgate::KeyRegistry;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let registry = Arc::new(KeyRegistry::new());
//!
//! let claim = registry.try_claim("reports-2024").expect("key starts idle");
//! assert!(registry.is_busy("reports-2024"));
//! assert!(registry.try_claim("reports-2024").is_none());
//!
//! registry.schedule_release(claim, Duration::from_secs(10));
//! # }
//! ```

pub mod archiver;
pub mod error;
pub mod registry;

pub use archiver::{ArchiveConfig, Archiver, NoopArchiver};
pub use error::ProcessError;
pub use registry::{Claim, KeyRegistry, ReleaseHandle};

use std::time::Duration;

/// Grace period a claimed key stays busy when nothing else is configured.
pub const DEFAULT_RELEASE_DELAY: Duration = Duration::from_secs(10);
