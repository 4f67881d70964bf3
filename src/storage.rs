// Driver selection
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use crate::common::{
    ClientConfig,
    Driver,
    PlatformDescriptor,
    PlatformKind,
    ReconcileError,
};
use tracing::debug;

#[cfg(feature = "gcs")]
use crate::gcs::GcsDriver;

#[cfg(feature = "s3")]
use crate::s3::S3Driver;

/// Return the `Driver` for the platform in `descriptor`.
///
/// Platforms without a driver, including those whose feature was not
/// compiled in, are rejected with `ReconcileError::UnsupportedPlatform`.
pub async fn new_driver(
    descriptor: &PlatformDescriptor,
    config: &ClientConfig,
) -> Result<Box<dyn Driver>, ReconcileError> {
    debug!("new_driver: Selecting driver for {}", descriptor.kind);

    let driver: Box<dyn Driver> = match descriptor.kind {
        #[cfg(feature = "s3")]
        PlatformKind::Aws => Box::new(S3Driver::new(config, descriptor).await?),
        #[cfg(feature = "gcs")]
        PlatformKind::Gcp => Box::new(GcsDriver::new(config, descriptor)?),
        ref kind          => {
            return Err(ReconcileError::UnsupportedPlatform(kind.to_string()));
        },
    };

    Ok(driver)
}
