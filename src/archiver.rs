//! The processing step run after a key has been claimed.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProcessError;

/// Where archives are read from and extracted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Directory holding one `<key>.zip` archive per key
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Directory receiving one `<key>/` extraction directory per key
    #[serde(default = "default_dest_dir")]
    pub dest_dir: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            dest_dir: default_dest_dir(),
        }
    }
}

impl ArchiveConfig {
    pub fn new(source_dir: impl AsRef<Path>, dest_dir: impl AsRef<Path>) -> Self {
        Self {
            source_dir: source_dir.as_ref().to_path_buf(),
            dest_dir: dest_dir.as_ref().to_path_buf(),
        }
    }

    /// Archive file associated with `key`.
    pub fn archive_path(&self, key: &str) -> PathBuf {
        self.source_dir.join(format!("{key}.zip"))
    }

    /// Extraction target for `key`.
    pub fn extract_path(&self, key: &str) -> PathBuf {
        self.dest_dir.join(key)
    }
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("zips")
}

fn default_dest_dir() -> PathBuf {
    PathBuf::from("extracted")
}

/// Processes the archive belonging to a claimed key.
///
/// Implementations run outside the registry lock and may take as long as they
/// need; the key is freed on a timer regardless.
#[async_trait]
pub trait Archiver: Send + Sync {
    async fn process(&self, key: &str, config: &ArchiveConfig) -> Result<(), ProcessError>;
}

/// Archiver that resolves the paths for a key and does nothing else.
///
/// This is what the server runs with until a real extractor is plugged in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopArchiver;

#[async_trait]
impl Archiver for NoopArchiver {
    async fn process(&self, key: &str, config: &ArchiveConfig) -> Result<(), ProcessError> {
        tracing::info!(
            key,
            archive = %config.archive_path(key).display(),
            dest = %config.extract_path(key).display(),
            "archive extraction skipped"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_derived_from_key() {
        let cfg = ArchiveConfig::new("/data/zips", "/data/out");
        assert_eq!(cfg.archive_path("abc"), PathBuf::from("/data/zips/abc.zip"));
        assert_eq!(cfg.extract_path("abc"), PathBuf::from("/data/out/abc"));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: ArchiveConfig = serde_json::from_str(r#"{"dest_dir": "/tmp/out"}"#).unwrap();
        assert_eq!(cfg.source_dir, PathBuf::from("zips"));
        assert_eq!(cfg.dest_dir, PathBuf::from("/tmp/out"));
    }

    #[tokio::test]
    async fn noop_archiver_succeeds() {
        let result = NoopArchiver.process("abc", &ArchiveConfig::default()).await;
        assert!(result.is_ok());
    }
}
