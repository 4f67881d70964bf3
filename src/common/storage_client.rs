// StorageClient trait
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use async_trait::async_trait;
use super::{
    BucketAttributes,
    ClientError,
    Hardening,
};

/// `StorageClient` is the thin query and command surface over a provider's
/// native API.
///
/// This trait should be implemented by each provider `Client`.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Returns whether the bucket `name` exists.
    ///
    /// `Ok(false)` must only be returned when the provider definitively
    /// reports the bucket as not found. Every other failure is an error.
    async fn bucket_exists(&self, name: &str) -> Result<bool, ClientError>;

    /// Creates the bucket `name` in `location`, applying as much of
    /// `hardening` at creation time as the provider allows.
    ///
    /// Returns `ClientError::AlreadyExists` if the bucket already exists.
    async fn create_bucket(
        &self,
        name: &str,
        location: &str,
        hardening: &Hardening,
    ) -> Result<(), ClientError>;

    /// Returns the live attributes of the bucket `name`.
    async fn get_attributes(
        &self,
        name: &str,
    ) -> Result<BucketAttributes, ClientError>;

    /// Enables every hardening flag set in `patch` on bucket `name`.
    async fn update_attributes(
        &self,
        name: &str,
        patch: &Hardening,
    ) -> Result<(), ClientError>;
}
