// S3 storage Driver
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
    Region,
    StatusWriter,
    StorageClient,
};
use crate::convergence::{
    converge,
    PassOutcome,
};
use super::client::Client;

/// Hardening required on S3 buckets.
///
/// S3 has no single uniform access switch, so ACLs are disabled and all
/// public access is blocked.
pub const S3_HARDENING: Hardening = Hardening::ALL;

/// `Driver` for AWS S3 and AWS compatible object stores.
pub struct S3Driver {
    client:   Client,
    settings: BucketSettings,
}

impl S3Driver {
    /// Return a new `S3Driver` for the platform described by `descriptor`.
    ///
    /// Buckets are created in the region the client talks to. When the
    /// descriptor has no region that is the one from the environment, and if
    /// there is none there either the driver can't be built.
    pub async fn new(
        config: &ClientConfig,
        descriptor: &PlatformDescriptor,
    ) -> Result<Self, ReconcileError> {
        let region = Region::from_name(&descriptor.region);

        let location = region.configured()
            .map(str::to_string)
            .ok_or_else(|| {
                ReconcileError::Configuration(
                    "AWS platform requires a region".to_string(),
                )
            })?;

        let client = Client::new(
            config,
            region,
            descriptor.endpoint.as_deref(),
        ).await;

        let settings = BucketSettings::new(&location, S3_HARDENING)
            .with_prefix(&config.bucket_prefix);

        Ok(Self {
            client:   client,
            settings: settings,
        })
    }
}

#[async_trait]
impl Driver for S3Driver {
    fn platform_type(&self) -> PlatformKind {
        PlatformKind::Aws
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
