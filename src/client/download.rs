use crate::utils::validation::sanitize_filename;
use anyhow::{Context, Result};
use bytes::Bytes;
use std::path::PathBuf;

/// The formatted document held by the client until the user saves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultHandle {
    pub filename: String,
    pub content: Bytes,
}

/// Where "save as attachment" writes to
#[async_trait::async_trait]
pub trait DownloadSink: Send + Sync {
    /// Persist the document and return where it ended up
    async fn save(&self, result: &ResultHandle) -> Result<PathBuf>;
}

/// Saves downloads into a directory, like a browser's download folder.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait::async_trait]
impl DownloadSink for DirectorySink {
    async fn save(&self, result: &ResultHandle) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        // The name came from a response header; never let it escape the directory
        let path = self.dir.join(sanitize_filename(&result.filename));
        tokio::fs::write(&path, &result.content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::debug!("Saved {} bytes to {}", result.content.len(), path.display());
        Ok(path)
    }
}
