// managed-bucket: Converges a hardened backup storage bucket.
#![forbid(unsafe_code)]
#![deny(missing_docs)]
//! Runs a single convergence pass for the backup bucket recorded in a status
//! file, creating and hardening the bucket on AWS S3 or Google Cloud Storage
//! as needed.
use anyhow::{
    bail,
    Context,
    Result,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod common;
mod convergence;
mod status_file;
mod storage;

#[cfg(feature = "gcs")]
mod gcs;

#[cfg(feature = "s3")]
mod s3;

use cli::RunConfig;
use status_file::StatusFile;

// Log to stderr, keeping stdout for our results. Defaults to info unless
// RUST_LOG says otherwise.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(config: RunConfig) -> Result<()> {
    let store  = StatusFile::new(&config.status_file);
    let driver = storage::new_driver(&config.descriptor, &config.client).await?;

    let mut status = store.load().await?;

    if config.check {
        if !status.has_name() {
            bail!("No bucket name recorded in {}", config.status_file.display());
        }

        let exists = driver.storage_exists(&status.name).await?;

        println!("{}\t{}", status.name, if exists { "exists" } else { "missing" });

        return Ok(());
    }

    let outcome = driver.create_storage(&mut status, &store)
        .await
        .with_context(|| {
            format!("Convergence pass on {} failed", driver.platform_type())
        })?;

    info!(
        "Pass finished with {:?}, requeue: {}",
        outcome,
        outcome.requeue(),
    );

    println!("{}\t{:?}", status.name, outcome);

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let matches = cli::parse_args();
    let config  = cli::run_config(&matches)?;

    run(config).await
}
