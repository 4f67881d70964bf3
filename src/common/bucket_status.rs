// BucketStatus, the persisted record of our bucket
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

/// Persisted state of the bucket owned by a resource.
///
/// `name` is empty until assigned and never changes afterwards.
/// `provisioned` is only ever `true` alongside a non-empty `name`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketStatus {
    /// Name of the bucket, empty until one has been committed.
    #[serde(default)]
    pub name: String,

    /// Whether the bucket was verified to exist with all required hardening
    /// applied.
    #[serde(default)]
    pub provisioned: bool,

    /// Time of the last fully successful convergence pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_timestamp: Option<DateTime<Utc>>,
}

impl BucketStatus {
    /// Returns `true` if a bucket name has been committed.
    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }
}
