// Error types for provider clients and reconciliation
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use std::fmt;
use thiserror::Error;

/// Errors returned by a `StorageClient`.
///
/// "Bucket not found" is not an error at all, `bucket_exists` returns
/// `Ok(false)` for it.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The bucket we tried to create already exists. It may or may not be
    /// ours.
    #[error("bucket already exists")]
    AlreadyExists,

    /// Any other failure: auth, network, quota, timeout. Says nothing about
    /// the state of the bucket.
    #[error(transparent)]
    Indeterminate(#[from] anyhow::Error),
}

/// Provider operations performed during a convergence pass.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    /// Checking a proposed name for an existing bucket.
    CheckProposedName,
    /// Creating the bucket.
    Create,
    /// Verifying that the bucket exists.
    Verify,
    /// Retrieving bucket attributes.
    GetAttributes,
    /// Enforcing hardening on the bucket.
    EnforceHardening,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::CheckProposedName => "checking proposed bucket",
            Self::Create            => "creating bucket",
            Self::Verify            => "verifying bucket",
            Self::GetAttributes     => "retrieving bucket attributes",
            Self::EnforceHardening  => "enforcing hardening on bucket",
        };

        write!(f, "{}", s)
    }
}

/// Errors surfaced by a convergence pass or by driver selection.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A provider call failed in a way that says nothing definitive about
    /// the bucket.
    #[error("error occurred when {operation} {bucket}: {source}")]
    Provider {
        /// What we were doing.
        operation: Operation,
        /// Which bucket we were doing it to.
        bucket: String,
        /// The underlying failure.
        #[source]
        source: ClientError,
    },

    /// A freshly generated name is already taken by some bucket.
    #[error("proposed bucket {0} already exists, retrying")]
    NameCollision(String),

    /// The status record could not be persisted.
    #[error("failed to persist bucket status: {0}")]
    Persist(#[source] anyhow::Error),

    /// No driver exists for the platform.
    #[error("unable to determine platform: unsupported platform type '{0}'")]
    UnsupportedPlatform(String),

    /// The platform is supported but its descriptor or our client
    /// configuration is unusable.
    #[error("invalid platform configuration: {0}")]
    Configuration(String),
}

impl ReconcileError {
    /// Returns a `Provider` error for `operation` on `bucket`.
    pub fn provider(
        operation: Operation,
        bucket: &str,
        source: ClientError,
    ) -> Self {
        Self::Provider {
            operation: operation,
            bucket:    bucket.to_string(),
            source:    source,
        }
    }

    /// Returns `false` for configuration errors that re-running the pass
    /// won't fix.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::UnsupportedPlatform(_) | Self::Configuration(_))
    }
}
