// StatusWriter trait
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use anyhow::Result;
use async_trait::async_trait;
use super::BucketStatus;

/// Persists a `BucketStatus`.
///
/// Changes made to a status during a pass are provisional until `persist`
/// succeeds.
#[async_trait]
pub trait StatusWriter: Send + Sync {
    /// Persist `status`, replacing whatever was stored before.
    async fn persist(&self, status: &BucketStatus) -> Result<()>;
}
