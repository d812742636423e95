//! Error types produced while processing a claimed key.
//!
//! The request path treats these as opaque: whatever the archiver reports is
//! turned into a plain-text server error by the HTTP layer. The variants only
//! exist so archiver implementations can say *what* went wrong in a
//! structured way and tests can match on them.

use thiserror::Error;

/// Failure reported by an [`Archiver`](crate::Archiver).
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to process archive for key {key}: {reason}")]
    ArchiveFailed { key: String, reason: String },

    #[error("io error while processing key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

impl ProcessError {
    pub fn archive_failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ProcessError::ArchiveFailed {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Key the failure belongs to.
    pub fn key(&self) -> &str {
        match self {
            ProcessError::ArchiveFailed { key, .. } | ProcessError::Io { key, .. } => key,
        }
    }
}
