// BucketSettings, the desired state of the bucket
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use super::{
    Hardening,
    BUCKET_PREFIX,
};

/// Desired state of the managed bucket on a given platform.
///
/// Each `Driver` builds one of these from the `PlatformDescriptor` and its
/// own platform defaults.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BucketSettings {
    /// Prefix for generated bucket names.
    pub prefix: String,

    /// Location (region) the bucket should be created in.
    pub location: String,

    /// Hardening that must be present on the bucket.
    pub hardening: Hardening,
}

impl BucketSettings {
    /// Returns `BucketSettings` for `location` with the default bucket prefix
    /// and the given required `hardening`.
    pub fn new(location: &str, hardening: Hardening) -> Self {
        Self {
            prefix:    BUCKET_PREFIX.to_string(),
            location:  location.to_string(),
            hardening: hardening,
        }
    }

    /// Replaces the bucket name prefix.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }
}
