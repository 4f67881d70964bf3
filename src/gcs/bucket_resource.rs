// The GCS JSON API bucket resource
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use crate::common::{
    BucketAttributes,
    Hardening,
};
use serde::{
    Deserialize,
    Serialize,
};

// Value of `publicAccessPrevention` when public access is prevented.
const ENFORCED: &str = "enforced";

/// The parts of a GCS bucket resource that we read or write.
///
/// Every field is optional so that the same type serves as a full resource,
/// an insert request and a patch.
#[derive(Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketResource {
    /// Bucket name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Bucket location, reported upper case by GCS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// IAM settings of the bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iam_configuration: Option<IamConfiguration>,
}

/// The `iamConfiguration` of a bucket.
#[derive(Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IamConfiguration {
    /// Uniform bucket level access setting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uniform_bucket_level_access: Option<UniformBucketLevelAccess>,

    /// Either `enforced` or `inherited`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_access_prevention: Option<String>,
}

/// The `uniformBucketLevelAccess` setting of a bucket.
#[derive(Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct UniformBucketLevelAccess {
    /// Whether uniform bucket level access is enabled.
    #[serde(default)]
    pub enabled: bool,
}

impl IamConfiguration {
    /// Returns the `IamConfiguration` enabling every flag set in
    /// `hardening`, leaving the others untouched.
    pub fn enabling(hardening: &Hardening) -> Self {
        let uniform = hardening.uniform_access
            .then(|| UniformBucketLevelAccess { enabled: true });

        let prevention = hardening.public_access_blocked
            .then(|| ENFORCED.to_string());

        Self {
            uniform_bucket_level_access: uniform,
            public_access_prevention:    prevention,
        }
    }

    /// Returns the hardening currently applied by this configuration.
    pub fn hardening(&self) -> Hardening {
        let uniform_access = self.uniform_bucket_level_access
            .as_ref()
            .map(|u| u.enabled)
            .unwrap_or(false);

        let public_access_blocked = self.public_access_prevention
            .as_deref()
            .map(|p| p == ENFORCED)
            .unwrap_or(false);

        Hardening {
            uniform_access:        uniform_access,
            public_access_blocked: public_access_blocked,
        }
    }
}

impl BucketResource {
    /// Returns the resource to insert in order to create bucket `name` in
    /// `location` with `hardening` applied.
    pub fn insert(name: &str, location: &str, hardening: &Hardening) -> Self {
        let location = if location.is_empty() {
            None
        }
        else {
            Some(location.to_string())
        };

        Self {
            name:              Some(name.to_string()),
            location:          location,
            iam_configuration: Some(IamConfiguration::enabling(hardening)),
        }
    }

    /// Returns a patch enabling every flag set in `hardening`.
    pub fn patch(hardening: &Hardening) -> Self {
        Self {
            iam_configuration: Some(IamConfiguration::enabling(hardening)),
            ..Default::default()
        }
    }
}

impl From<BucketResource> for BucketAttributes {
    fn from(resource: BucketResource) -> Self {
        let hardening = resource.iam_configuration
            .map(|iam| iam.hardening())
            .unwrap_or_default();

        Self {
            location:  resource.location,
            hardening: hardening,
        }
    }
}
