// Imports all of the components needed for s3::client
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// S3 `Client`.
mod client;

/// `Driver` built on the S3 `Client`.
mod driver;

/// Implementation of the `StorageClient` trait for our S3 `Client`.
mod storage_client;

pub use client::*;
pub use driver::*;
