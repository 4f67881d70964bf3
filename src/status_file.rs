// StatusFile, a StatusWriter keeping the BucketStatus in a JSON file
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use anyhow::{
    Context,
    Result,
};
use async_trait::async_trait;
use crate::common::{
    BucketStatus,
    StatusWriter,
};
use std::io::ErrorKind;
use std::path::{
    Path,
    PathBuf,
};
use tokio::fs;
use tracing::debug;

/// Stores a `BucketStatus` as JSON in a file.
#[derive(Debug)]
pub struct StatusFile {
    path: PathBuf,
}

impl StatusFile {
    /// Return a `StatusFile` stored at `path`.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read the stored status.
    ///
    /// A missing file is an empty status, as for a newly created resource.
    pub async fn load(&self) -> Result<BucketStatus> {
        debug!("load: Reading status from {}", self.path.display());

        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(BucketStatus::default());
            },
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read {}", self.path.display())
                });
            },
        };

        let status = serde_json::from_slice(&data)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;

        Ok(status)
    }

    // The status is written here first and renamed over the real file, so a
    // crash never leaves a half written status behind.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();

        name.push(".tmp");

        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StatusWriter for StatusFile {
    async fn persist(&self, status: &BucketStatus) -> Result<()> {
        debug!("persist: Writing {:?} to {}", status, self.path.display());

        let data = serde_json::to_vec_pretty(status)
            .context("Failed to serialize bucket status")?;

        let temp_path = self.temp_path();

        fs::write(&temp_path, &data)
            .await
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;

        fs::rename(&temp_path, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        Ok(())
    }
}
