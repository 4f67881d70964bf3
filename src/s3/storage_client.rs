// Implement the StorageClient trait for the s3::Client
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use async_trait::async_trait;
use crate::common::{
    BucketAttributes,
    ClientError,
    Hardening,
    StorageClient,
};
use super::client::Client;
use tracing::debug;

#[async_trait]
impl StorageClient for Client {
    /// Check whether `name` exists with `HeadBucket`.
    async fn bucket_exists(&self, name: &str) -> Result<bool, ClientError> {
        self.bounded("HeadBucket", self.head_bucket(name)).await
    }

    /// Create the bucket.
    ///
    /// S3 can only disable ACLs at creation time. Public access blocking is
    /// left to `update_attributes`.
    async fn create_bucket(
        &self,
        name: &str,
        location: &str,
        hardening: &Hardening,
    ) -> Result<(), ClientError> {
        let request = Client::create_bucket(
            self,
            name,
            location,
            hardening.uniform_access,
        );

        self.bounded("CreateBucket", request).await
    }

    /// Collect the location, ownership controls and public access block of
    /// the bucket.
    async fn get_attributes(
        &self,
        name: &str,
    ) -> Result<BucketAttributes, ClientError> {
        let location = self.bounded(
            "GetBucketLocation",
            self.get_bucket_location(name),
        ).await?;

        let uniform_access = self.bounded(
            "GetBucketOwnershipControls",
            self.get_owner_enforced(name),
        ).await?;

        let public_access_blocked = self.bounded(
            "GetPublicAccessBlock",
            self.get_public_access_blocked(name),
        ).await?;

        let attributes = BucketAttributes {
            location:  Some(location),
            hardening: Hardening {
                uniform_access:        uniform_access,
                public_access_blocked: public_access_blocked,
            },
        };

        debug!("get_attributes: '{}' -> {:?}", name, attributes);

        Ok(attributes)
    }

    /// Apply each requested hardening setting with its own request.
    async fn update_attributes(
        &self,
        name: &str,
        patch: &Hardening,
    ) -> Result<(), ClientError> {
        if patch.uniform_access {
            self.bounded(
                "PutBucketOwnershipControls",
                self.put_owner_enforced(name),
            ).await?;
        }

        if patch.public_access_blocked {
            self.bounded(
                "PutPublicAccessBlock",
                self.put_public_access_blocked(name),
            ).await?;
        }

        Ok(())
    }
}
