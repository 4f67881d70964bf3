// Implements the S3 Client
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use anyhow::{
    anyhow,
    Context,
};
use aws_sdk_s3::client::Client as S3Client;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::types::{
    BucketLocationConstraint,
    CreateBucketConfiguration,
    ObjectOwnership,
    OwnershipControls,
    OwnershipControlsRule,
    PublicAccessBlockConfiguration,
};
use aws_smithy_http::result::SdkError;
use crate::common::{
    ClientConfig,
    ClientError,
    Region,
};
use http::StatusCode;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

// Error codes S3 returns when a bucket has no configuration of the given
// kind. These are the same as the configuration being disabled.
const NO_OWNERSHIP_CONTROLS: &str = "OwnershipControlsNotFoundError";
const NO_PUBLIC_ACCESS_BLOCK: &str = "NoSuchPublicAccessBlockConfiguration";

// Buckets in us-east-1 are created without a location constraint and report
// an empty one.
const US_EAST_1: &str = "us-east-1";

/// The S3 `Client`.
pub struct Client {
    /// The AWS SDK `S3Client`.
    pub client: S3Client,

    /// Upper bound on the duration of each request.
    pub timeout: Duration,
}

impl Client {
    /// Return a new S3 `Client` talking to `region`.
    ///
    /// If a custom `endpoint` is given, path style addressing is used so that
    /// AWS compatible object stores work.
    pub async fn new(
        config: &ClientConfig,
        region: Region,
        endpoint: Option<&str>,
    ) -> Self {
        debug!("new: Creating S3Client in region '{}'", region.name());

        let shared_config = aws_config::from_env()
            .region(region)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);

        if let Some(endpoint) = endpoint {
            debug!("new: Using custom endpoint '{}'", endpoint);

            builder = builder
                .endpoint_url(endpoint)
                .force_path_style(true);
        }

        let client = S3Client::from_conf(builder.build());

        Self {
            client:  client,
            timeout: config.timeout,
        }
    }

    /// Runs `request`, failing with an indeterminate error if it takes
    /// longer than the configured timeout.
    pub async fn bounded<T, F>(
        &self,
        operation: &str,
        request: F,
    ) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(output) => output,
            Err(_)     => {
                let err = anyhow!(
                    "{} timed out after {:?}",
                    operation,
                    self.timeout,
                );

                Err(err.into())
            },
        }
    }

    /// Returns `true` if `bucket` exists, or `false` if S3 reports it as not
    /// found.
    ///
    /// Access denied means the bucket exists but belongs to somebody else,
    /// which is an error rather than `true` or `false`.
    pub async fn head_bucket(&self, bucket: &str) -> Result<bool, ClientError> {
        debug!("head_bucket for '{}'", bucket);

        let output = self.client.head_bucket()
            .bucket(bucket)
            .send()
            .await;

        debug!("head_bucket output for '{}' -> '{:?}'", bucket, output);

        match output {
            Ok(_)  => Ok(true),
            Err(err) => {
                let not_found = service_error(&err)
                    .map(|e| e.is_not_found())
                    .unwrap_or(false);

                let status_404 = err.raw_response()
                    .map(|r| r.http().status() == StatusCode::NOT_FOUND)
                    .unwrap_or(false);

                if not_found || status_404 {
                    Ok(false)
                }
                else {
                    let err = anyhow::Error::new(err)
                        .context(format!("HeadBucket failed for '{}'", bucket));

                    Err(err.into())
                }
            },
        }
    }

    /// Creates `bucket` in `location`.
    ///
    /// When `uniform_access` is requested the bucket is created with ACLs
    /// disabled.
    pub async fn create_bucket(
        &self,
        bucket: &str,
        location: &str,
        uniform_access: bool,
    ) -> Result<(), ClientError> {
        debug!("create_bucket '{}' in '{}'", bucket, location);

        let mut input = self.client.create_bucket()
            .bucket(bucket);

        if !location.is_empty() && location != US_EAST_1 {
            let configuration = CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(location))
                .build();

            input = input.create_bucket_configuration(configuration);
        }

        if uniform_access {
            input = input.object_ownership(ObjectOwnership::BucketOwnerEnforced);
        }

        match input.send().await {
            Ok(_)    => Ok(()),
            Err(err) => {
                let exists = service_error(&err)
                    .map(|e| {
                        e.is_bucket_already_exists()
                            || e.is_bucket_already_owned_by_you()
                    })
                    .unwrap_or(false);

                if exists {
                    return Err(ClientError::AlreadyExists);
                }

                let err = anyhow::Error::new(err)
                    .context(format!("CreateBucket failed for '{}'", bucket));

                Err(err.into())
            },
        }
    }

    /// Return the bucket location for the given `bucket`.
    ///
    /// This method will properly handle the case of the `null` (empty) and
    /// `EU` location constraints, by replacing them with `us-east-1` and
    /// `eu-west-1` respectively.
    pub async fn get_bucket_location(
        &self,
        bucket: &str,
    ) -> Result<String, ClientError> {
        debug!("get_bucket_location for '{}'", bucket);

        let output = self.client.get_bucket_location()
            .bucket(bucket)
            .send()
            .await
            .with_context(|| format!("GetBucketLocation failed for '{}'", bucket))?;

        let location = output.location_constraint()
            .map(|l| l.as_str())
            .unwrap_or_default();

        debug!("GetBucketLocation API returned '{}'", location);

        // Location constraints for sufficiently old buckets in S3 may not
        // quite meet expectations. These returns are badly documented and the
        // assumptions here are based on what the web console does.
        let location = match location {
            ""   => US_EAST_1.to_string(),
            "EU" => "eu-west-1".to_string(),
            _    => location.to_string(),
        };

        Ok(location)
    }

    /// Returns `true` if ACLs are disabled on `bucket` by the
    /// `BucketOwnerEnforced` object ownership setting.
    pub async fn get_owner_enforced(
        &self,
        bucket: &str,
    ) -> Result<bool, ClientError> {
        debug!("get_owner_enforced for '{}'", bucket);

        let output = self.client.get_bucket_ownership_controls()
            .bucket(bucket)
            .send()
            .await;

        match output {
            Ok(output) => {
                let enforced = output.ownership_controls()
                    .and_then(|c| c.rules())
                    .map(|rules| {
                        rules.iter().any(|r| {
                            r.object_ownership()
                                == Some(&ObjectOwnership::BucketOwnerEnforced)
                        })
                    })
                    .unwrap_or(false);

                Ok(enforced)
            },
            Err(err) if error_code(&err) == Some(NO_OWNERSHIP_CONTROLS) => {
                Ok(false)
            },
            Err(err) => {
                let err = anyhow::Error::new(err).context(format!(
                    "GetBucketOwnershipControls failed for '{}'",
                    bucket,
                ));

                Err(err.into())
            },
        }
    }

    /// Returns `true` if every public access block setting is enabled on
    /// `bucket`.
    pub async fn get_public_access_blocked(
        &self,
        bucket: &str,
    ) -> Result<bool, ClientError> {
        debug!("get_public_access_blocked for '{}'", bucket);

        let output = self.client.get_public_access_block()
            .bucket(bucket)
            .send()
            .await;

        match output {
            Ok(output) => {
                let blocked = output.public_access_block_configuration()
                    .map(|c| {
                        c.block_public_acls()
                            && c.ignore_public_acls()
                            && c.block_public_policy()
                            && c.restrict_public_buckets()
                    })
                    .unwrap_or(false);

                Ok(blocked)
            },
            Err(err) if error_code(&err) == Some(NO_PUBLIC_ACCESS_BLOCK) => {
                Ok(false)
            },
            Err(err) => {
                let err = anyhow::Error::new(err).context(format!(
                    "GetPublicAccessBlock failed for '{}'",
                    bucket,
                ));

                Err(err.into())
            },
        }
    }

    /// Disables ACLs on `bucket`.
    pub async fn put_owner_enforced(
        &self,
        bucket: &str,
    ) -> Result<(), ClientError> {
        debug!("put_owner_enforced for '{}'", bucket);

        let rule = OwnershipControlsRule::builder()
            .object_ownership(ObjectOwnership::BucketOwnerEnforced)
            .build();

        let controls = OwnershipControls::builder()
            .rules(rule)
            .build();

        self.client.put_bucket_ownership_controls()
            .bucket(bucket)
            .ownership_controls(controls)
            .send()
            .await
            .with_context(|| {
                format!("PutBucketOwnershipControls failed for '{}'", bucket)
            })?;

        Ok(())
    }

    /// Enables every public access block setting on `bucket`.
    pub async fn put_public_access_blocked(
        &self,
        bucket: &str,
    ) -> Result<(), ClientError> {
        debug!("put_public_access_blocked for '{}'", bucket);

        let configuration = PublicAccessBlockConfiguration::builder()
            .block_public_acls(true)
            .ignore_public_acls(true)
            .block_public_policy(true)
            .restrict_public_buckets(true)
            .build();

        self.client.put_public_access_block()
            .bucket(bucket)
            .public_access_block_configuration(configuration)
            .send()
            .await
            .with_context(|| {
                format!("PutPublicAccessBlock failed for '{}'", bucket)
            })?;

        Ok(())
    }
}

// Returns the modeled service error, if the request got as far as S3
// answering it.
fn service_error<E, R>(err: &SdkError<E, R>) -> Option<&E> {
    match err {
        SdkError::ServiceError(context) => Some(context.err()),
        _                               => None,
    }
}

// Returns the error code of a service error, if there is one.
fn error_code<E, R>(err: &SdkError<E, R>) -> Option<&str>
where
    E: ProvideErrorMetadata,
{
    service_error(err).and_then(|e| e.code())
}
