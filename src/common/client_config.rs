// ClientConfig
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use std::fmt;
use std::time::Duration;
use super::BUCKET_PREFIX;

/// Default upper bound on the duration of a single provider call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration, shared by every driver.
#[derive(Clone)]
pub struct ClientConfig {
    /// Prefix for generated bucket names.
    pub bucket_prefix: String,

    /// Upper bound on the duration of each provider call. A call exceeding
    /// it fails as an indeterminate error.
    pub timeout: Duration,

    /// OAuth2 access token used for the GCS JSON API.
    ///
    /// Acquiring the token is left to the caller.
    pub access_token: Option<String>,

    /// Base URL of the GCS JSON API.
    ///
    /// This only exists to allow pointing the client at an emulator or a
    /// mock server.
    pub gcs_base_url: Option<String>,
}

// Keep the access token out of debug logs.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let access_token = self.access_token.as_ref().map(|_| "<redacted>");

        f.debug_struct("ClientConfig")
            .field("bucket_prefix", &self.bucket_prefix)
            .field("timeout", &self.timeout)
            .field("access_token", &access_token)
            .field("gcs_base_url", &self.gcs_base_url)
            .finish()
    }
}

impl Default for ClientConfig {
    /// Returns a default `ClientConfig`.
    ///
    /// ```rust
    /// ClientConfig {
    ///     bucket_prefix: "managed-velero-backups-".into(),
    ///     timeout:       Duration::from_secs(30),
    ///     access_token:  None,
    ///     gcs_base_url:  None,
    /// }
    /// ```
    fn default() -> Self {
        Self {
            bucket_prefix: BUCKET_PREFIX.to_string(),
            timeout:       DEFAULT_TIMEOUT,
            access_token:  None,
            gcs_base_url:  None,
        }
    }
}
