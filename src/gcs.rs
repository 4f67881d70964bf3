// Imports all of the components needed for gcs::client
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Serde types for the JSON API bucket resource.
mod bucket_resource;

/// GCS `Client`.
mod client;

/// `Driver` built on the GCS `Client`.
mod driver;

/// Implementation of the `StorageClient` trait for our GCS `Client`.
mod storage_client;

pub use client::*;
pub use driver::*;
