// GCS storage Driver
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use async_trait::async_trait;
use crate::common::{
    BucketSettings,
    BucketStatus,
    ClientConfig,
    Driver,
    Hardening,
    Operation,
    PlatformDescriptor,
    PlatformKind,
    ReconcileError,
    StatusWriter,
    StorageClient,
};
use crate::convergence::{
    converge,
    PassOutcome,
};
use super::client::Client;

/// Hardening required on GCS buckets.
pub const GCS_HARDENING: Hardening = Hardening::UNIFORM_ACCESS;

/// `Driver` for Google Cloud Storage.
pub struct GcsDriver {
    client:   Client,
    settings: BucketSettings,
}

impl GcsDriver {
    /// Return a new `GcsDriver` for the platform described by `descriptor`.
    ///
    /// Fails if the descriptor has no project ID.
    pub fn new(
        config: &ClientConfig,
        descriptor: &PlatformDescriptor,
    ) -> Result<Self, ReconcileError> {
        let client = Client::new(config, descriptor)
            .map_err(|e| ReconcileError::Configuration(format!("{:#}", e)))?;

        let settings = BucketSettings::new(&descriptor.region, GCS_HARDENING)
            .with_prefix(&config.bucket_prefix);

        Ok(Self {
            client:   client,
            settings: settings,
        })
    }
}

#[async_trait]
impl Driver for GcsDriver {
    fn platform_type(&self) -> PlatformKind {
        PlatformKind::Gcp
    }

    async fn create_storage(
        &self,
        status: &mut BucketStatus,
        writer: &dyn StatusWriter,
    ) -> Result<PassOutcome, ReconcileError> {
        converge(&self.client, &self.settings, status, writer).await
    }

    async fn storage_exists(&self, name: &str) -> Result<bool, ReconcileError> {
        self.client.bucket_exists(name)
            .await
            .map_err(|e| ReconcileError::provider(Operation::Verify, name, e))
    }
}
