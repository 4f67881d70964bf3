// Implements the GCS Client
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use anyhow::{
    anyhow,
    Context,
    Result,
};
use crate::common::{
    ClientConfig,
    ClientError,
    Hardening,
    PlatformDescriptor,
};
use reqwest::{
    Method,
    RequestBuilder,
    Response,
    StatusCode,
};
use super::bucket_resource::BucketResource;
use tracing::debug;

/// Base URL of the Cloud Storage JSON API.
pub const DEFAULT_BASE_URL: &str = "https://storage.googleapis.com";

/// The GCS `Client`, talking to the Cloud Storage JSON API.
pub struct Client {
    /// The `reqwest` HTTP client, with the request timeout applied.
    pub client: reqwest::Client,

    /// Base URL of the JSON API.
    pub base_url: String,

    /// Project that buckets are created in.
    pub project_id: String,

    /// OAuth2 bearer token sent with every request.
    access_token: Option<String>,
}

impl Client {
    /// Return a new GCS `Client` for the project in `descriptor`.
    pub fn new(
        config: &ClientConfig,
        descriptor: &PlatformDescriptor,
    ) -> Result<Self> {
        let project_id = descriptor.project_id
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| anyhow!("GCP platform requires a project ID"))?;

        let base_url = config.gcs_base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        debug!(
            "new: Creating GCS client for project '{}' at '{}'",
            project_id,
            base_url,
        );

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client:       client,
            base_url:     base_url,
            project_id:   project_id,
            access_token: config.access_token.clone(),
        })
    }

    fn buckets_url(&self) -> String {
        format!("{}/storage/v1/b", self.base_url)
    }

    fn bucket_url(&self, bucket: &str) -> String {
        format!("{}/{}", self.buckets_url(), bucket)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self.client.request(method, url);

        match self.access_token.as_ref() {
            Some(token) => request.bearer_auth(token),
            None        => request,
        }
    }

    /// Returns the bucket resource for `bucket`, or `None` if GCS reports it
    /// as not found.
    pub async fn get_bucket(
        &self,
        bucket: &str,
    ) -> Result<Option<BucketResource>, ClientError> {
        debug!("get_bucket for '{}'", bucket);

        let response = self.request(Method::GET, &self.bucket_url(bucket))
            .send()
            .await
            .with_context(|| format!("GET bucket failed for '{}'", bucket))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let resource = response.json::<BucketResource>()
                    .await
                    .with_context(|| {
                        format!("Failed to parse bucket '{}'", bucket)
                    })?;

                Ok(Some(resource))
            },
            _ => Err(unexpected_status("GET", bucket, response).await),
        }
    }

    /// Creates `bucket` in `location` with `hardening` applied.
    pub async fn insert_bucket(
        &self,
        bucket: &str,
        location: &str,
        hardening: &Hardening,
    ) -> Result<(), ClientError> {
        debug!("insert_bucket '{}' in '{}'", bucket, location);

        let body = BucketResource::insert(bucket, location, hardening);

        let response = self.request(Method::POST, &self.buckets_url())
            .query(&[("project", self.project_id.as_str())])
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST bucket failed for '{}'", bucket))?;

        match response.status() {
            StatusCode::CONFLICT          => Err(ClientError::AlreadyExists),
            status if status.is_success() => Ok(()),
            _ => Err(unexpected_status("POST", bucket, response).await),
        }
    }

    /// Enables every flag set in `hardening` on `bucket`.
    pub async fn patch_bucket(
        &self,
        bucket: &str,
        hardening: &Hardening,
    ) -> Result<(), ClientError> {
        debug!("patch_bucket '{}' with {:?}", bucket, hardening);

        let body = BucketResource::patch(hardening);

        let response = self.request(Method::PATCH, &self.bucket_url(bucket))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("PATCH bucket failed for '{}'", bucket))?;

        if response.status().is_success() {
            Ok(())
        }
        else {
            Err(unexpected_status("PATCH", bucket, response).await)
        }
    }
}

// Turns an unexpected response into an indeterminate error, keeping the body
// since GCS explains itself there.
async fn unexpected_status(
    method: &str,
    bucket: &str,
    response: Response,
) -> ClientError {
    let status = response.status();
    let body   = response.text().await.unwrap_or_default();

    anyhow!(
        "{} bucket '{}' returned {}: {}",
        method,
        bucket,
        status,
        body,
    ).into()
}
