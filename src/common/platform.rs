// Platform kinds and the descriptor of the platform we're running on
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use std::fmt;
use std::str::FromStr;

/// The kind of infrastructure platform hosting the owning resource.
///
/// Only some kinds have a storage `Driver`, the others exist so that a
/// descriptor naming them can be represented and rejected explicitly.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PlatformKind {
    /// Amazon Web Services, or an AWS compatible object store.
    Aws,
    /// Microsoft Azure.
    Azure,
    /// Google Cloud Platform.
    Gcp,
    /// Anything else, holding the name we were given.
    Other(String),
}

// Platform names are matched case insensitively, so "AWS", "aws" and "Aws"
// are all the same platform.
impl FromStr for PlatformKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "aws"   => Self::Aws,
            "azure" => Self::Azure,
            "gcp"   => Self::Gcp,
            ""      => return Err("empty platform type"),
            _       => Self::Other(s.to_string()),
        };

        Ok(kind)
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Aws          => write!(f, "AWS"),
            Self::Azure        => write!(f, "Azure"),
            Self::Gcp          => write!(f, "GCP"),
            Self::Other(other) => write!(f, "{}", other),
        }
    }
}

/// Read-only description of the platform the bucket lives on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlatformDescriptor {
    /// Which platform we're on.
    pub kind: PlatformKind,

    /// Region, or location, the bucket should be created in.
    pub region: String,

    /// GCP project that owns the bucket. Only used on GCP.
    pub project_id: Option<String>,

    /// Custom endpoint URL for AWS compatible object stores.
    pub endpoint: Option<String>,
}

impl PlatformDescriptor {
    /// Returns a descriptor of `kind` in `region` with no project or custom
    /// endpoint.
    pub fn new(kind: PlatformKind, region: &str) -> Self {
        Self {
            kind:       kind,
            region:     region.to_string(),
            project_id: None,
            endpoint:   None,
        }
    }
}
