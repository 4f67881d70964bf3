// Driver trait
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use async_trait::async_trait;
use crate::convergence::PassOutcome;
use super::{
    BucketStatus,
    PlatformKind,
    ReconcileError,
    StatusWriter,
};

/// `Driver` represents the storage provisioning contract, satisfied by every
/// cloud storage provider we support.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Returns the platform this driver provisions storage on.
    fn platform_type(&self) -> PlatformKind;

    /// Runs one convergence pass for the bucket recorded in `status`,
    /// persisting every change through `writer`.
    async fn create_storage(
        &self,
        status: &mut BucketStatus,
        writer: &dyn StatusWriter,
    ) -> Result<PassOutcome, ReconcileError>;

    /// Returns whether the bucket `name` exists.
    async fn storage_exists(&self, name: &str) -> Result<bool, ReconcileError>;
}
