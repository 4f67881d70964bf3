// Bucket name generation
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use tracing::debug;
use uuid::Uuid;

/// Prefix identifying the buckets we manage within a shared account or
/// project namespace.
pub const BUCKET_PREFIX: &str = "managed-velero-backups-";

/// Returns a candidate bucket name made of `prefix` followed by a random
/// UUIDv4.
///
/// The UUID is rendered hyphenated and lowercase, which keeps the result
/// valid for both S3 and GCS bucket naming rules as long as the prefix is.
pub fn generate_name(prefix: &str) -> String {
    let id   = Uuid::new_v4().hyphenated().to_string();
    let name = format!("{}{}", prefix, id);

    debug!("generate_name: proposed '{}'", name);

    name
}
