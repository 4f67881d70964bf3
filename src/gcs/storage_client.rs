// Implement the StorageClient trait for the gcs::Client
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use anyhow::anyhow;
use async_trait::async_trait;
use crate::common::{
    BucketAttributes,
    ClientError,
    Hardening,
    StorageClient,
};
use super::client::Client;

#[async_trait]
impl StorageClient for Client {
    async fn bucket_exists(&self, name: &str) -> Result<bool, ClientError> {
        let bucket = self.get_bucket(name).await?;

        Ok(bucket.is_some())
    }

    /// GCS applies both uniform access and public access prevention at
    /// creation time.
    async fn create_bucket(
        &self,
        name: &str,
        location: &str,
        hardening: &Hardening,
    ) -> Result<(), ClientError> {
        self.insert_bucket(name, location, hardening).await
    }

    async fn get_attributes(
        &self,
        name: &str,
    ) -> Result<BucketAttributes, ClientError> {
        // We only get here after seeing the bucket, so a not found now is as
        // indeterminate as any other failure.
        let bucket = self.get_bucket(name)
            .await?
            .ok_or_else(|| anyhow!("bucket '{}' not found", name))?;

        Ok(bucket.into())
    }

    async fn update_attributes(
        &self,
        name: &str,
        patch: &Hardening,
    ) -> Result<(), ClientError> {
        self.patch_bucket(name, patch).await
    }
}
