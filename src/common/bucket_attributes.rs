// Live attributes of a bucket
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Access hardening settings of a bucket.
///
/// When used as a requirement or a patch, a `true` flag means the setting
/// must be enabled. A `false` flag means "don't care", we never disable
/// hardening.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Hardening {
    /// Per-object ACLs are disabled in favour of bucket level access control.
    ///
    /// This is `UniformBucketLevelAccess` on GCS and the
    /// `BucketOwnerEnforced` object ownership on S3.
    pub uniform_access: bool,

    /// Public access to the bucket is prevented.
    pub public_access_blocked: bool,
}

impl Hardening {
    /// Hardening with every supported flag enabled.
    pub const ALL: Self = Self {
        uniform_access:        true,
        public_access_blocked: true,
    };

    /// Hardening requiring only uniform bucket level access.
    pub const UNIFORM_ACCESS: Self = Self {
        uniform_access:        true,
        public_access_blocked: false,
    };

    /// Returns the flags required by `self` that `actual` lacks, or `None`
    /// if `actual` already satisfies every requirement.
    pub fn missing_from(&self, actual: &Self) -> Option<Self> {
        let missing = Self {
            uniform_access:        self.uniform_access && !actual.uniform_access,
            public_access_blocked: self.public_access_blocked
                && !actual.public_access_blocked,
        };

        if missing.is_empty() {
            None
        }
        else {
            Some(missing)
        }
    }

    /// Returns `true` if no flag is set.
    pub fn is_empty(&self) -> bool {
        !self.uniform_access && !self.public_access_blocked
    }
}

/// Attributes of a bucket as reported by the provider.
///
/// These are always read live and never persisted.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BucketAttributes {
    /// Location (region) of the bucket, if the provider reported one.
    pub location: Option<String>,

    /// Currently applied hardening.
    pub hardening: Hardening,
}
