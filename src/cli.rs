// Command line interface parsing
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use anyhow::{
    anyhow,
    Result,
};
use clap::{
    crate_description,
    crate_name,
    crate_version,
    value_parser,
    Arg,
    ArgAction,
    ArgMatches,
    Command,
};
use crate::common::{
    ClientConfig,
    PlatformDescriptor,
    PlatformKind,
    BUCKET_PREFIX,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

// Default file the bucket status is kept in
const DEFAULT_STATUS_FILE: &str = "bucket-status.json";

// Default per request timeout, in seconds
const DEFAULT_TIMEOUT_SECS: &str = "30";

/// Everything a run needs, taken from the command line and environment.
#[derive(Debug)]
pub struct RunConfig {
    /// Platform the bucket lives on.
    pub descriptor: PlatformDescriptor,

    /// Configuration shared by the provider clients.
    pub client: ClientConfig,

    /// Where the bucket status is stored.
    pub status_file: PathBuf,

    /// Only report whether the recorded bucket exists.
    pub check: bool,
}

// Ensures that the bucket prefix keeps generated names valid on both S3 and
// GCS: lowercase letters, digits and hyphens, starting with a letter or digit.
fn is_valid_prefix(s: &str) -> Result<String, String> {
    let valid_chars = s.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    let valid_start = s.chars()
        .next()
        .map(|c| c.is_ascii_alphanumeric())
        .unwrap_or(false);

    if valid_chars && valid_start {
        Ok(s.to_string())
    }
    else {
        Err(format!("invalid bucket prefix '{}'", s))
    }
}

// Create the clap command
fn create_app() -> Command {
    debug!("Creating CLI app");

    Command::new(crate_name!())
        .version(crate_version!())
        .about(crate_description!())
        .arg(
            Arg::new("PLATFORM")
                .env("PLATFORM_TYPE")
                .long("platform")
                .short('p')
                .value_name("PLATFORM")
                .help("Platform type the bucket lives on, AWS or GCP")
                .required(true)
                .value_parser(PlatformKind::from_str)
        )
        .arg(
            Arg::new("REGION")
                .env("PLATFORM_REGION")
                .long("region")
                .short('r')
                .value_name("REGION")
                .help("Region or location to create the bucket in")
        )
        .arg(
            Arg::new("PROJECT")
                .env("GCP_PROJECT_ID")
                .long("project")
                .value_name("PROJECT")
                .help("GCP project to create the bucket in")
        )
        .arg(
            Arg::new("ENDPOINT")
                .env("S3_ENDPOINT_URL")
                .long("endpoint")
                .value_name("URL")
                .help("Endpoint URL of an AWS compatible object store")
        )
        .arg(
            Arg::new("ACCESS_TOKEN")
                .env("GOOGLE_OAUTH_ACCESS_TOKEN")
                .hide_env_values(true)
                .long("access-token")
                .value_name("TOKEN")
                .help("OAuth2 access token for the GCS JSON API")
        )
        .arg(
            Arg::new("STATUS_FILE")
                .env("BUCKET_STATUS_FILE")
                .long("status-file")
                .short('s')
                .value_name("PATH")
                .help("File the bucket status is kept in")
                .default_value(DEFAULT_STATUS_FILE)
                .value_parser(value_parser!(PathBuf))
        )
        .arg(
            Arg::new("PREFIX")
                .long("prefix")
                .value_name("PREFIX")
                .help("Prefix for generated bucket names")
                .default_value(BUCKET_PREFIX)
                .value_parser(is_valid_prefix)
        )
        .arg(
            Arg::new("TIMEOUT")
                .long("timeout")
                .short('t')
                .value_name("SECONDS")
                .help("Timeout for each request to the storage provider")
                .default_value(DEFAULT_TIMEOUT_SECS)
                .value_parser(value_parser!(u64).range(1..))
        )
        .arg(
            Arg::new("CHECK")
                .long("check")
                .help("Only report whether the recorded bucket exists")
                .action(ArgAction::SetTrue)
        )
}

/// Parse the command line.
pub fn parse_args() -> ArgMatches {
    debug!("Parsing command line arguments");

    create_app().get_matches()
}

/// Build a `RunConfig` from parsed arguments.
pub fn run_config(matches: &ArgMatches) -> Result<RunConfig> {
    let kind = matches.get_one::<PlatformKind>("PLATFORM")
        .cloned()
        .ok_or_else(|| anyhow!("platform type is required"))?;

    let region = matches.get_one::<String>("REGION")
        .map(String::as_str)
        .unwrap_or_default();

    let mut descriptor = PlatformDescriptor::new(kind, region);
    descriptor.project_id = matches.get_one::<String>("PROJECT").cloned();
    descriptor.endpoint   = matches.get_one::<String>("ENDPOINT").cloned();

    let timeout = matches.get_one::<u64>("TIMEOUT")
        .copied()
        .map(Duration::from_secs)
        .unwrap_or(crate::common::DEFAULT_TIMEOUT);

    let client = ClientConfig {
        bucket_prefix: matches.get_one::<String>("PREFIX")
            .cloned()
            .unwrap_or_else(|| BUCKET_PREFIX.to_string()),
        timeout:       timeout,
        access_token:  matches.get_one::<String>("ACCESS_TOKEN").cloned(),
        gcs_base_url:  None,
    };

    let status_file = matches.get_one::<PathBuf>("STATUS_FILE")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATUS_FILE));

    let config = RunConfig {
        descriptor:  descriptor,
        client:      client,
        status_file: status_file,
        check:       matches.get_flag("CHECK"),
    };

    debug!("run_config: {:?}", config);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Result<RunConfig> {
        let matches = create_app().try_get_matches_from(args)?;

        run_config(&matches)
    }

    #[test]
    fn test_run_config_gcp() {
        let config = parse(&[
            "managed-bucket",
            "--platform", "GCP",
            "--region", "europe-west2",
            "--project", "test-project",
            "--timeout", "5",
        ]).unwrap();

        assert_eq!(config.descriptor.kind, PlatformKind::Gcp);
        assert_eq!(config.descriptor.region, "europe-west2");
        assert_eq!(config.descriptor.project_id.as_deref(), Some("test-project"));
        assert_eq!(config.client.timeout, Duration::from_secs(5));
        assert_eq!(config.client.bucket_prefix, BUCKET_PREFIX);
        assert!(!config.check);
    }

    #[test]
    fn test_run_config_check() {
        let config = parse(&[
            "managed-bucket",
            "--platform", "aws",
            "--status-file", "/tmp/status.json",
            "--check",
        ]).unwrap();

        assert_eq!(config.descriptor.kind, PlatformKind::Aws);
        assert_eq!(config.status_file, PathBuf::from("/tmp/status.json"));
        assert!(config.check);
    }

    #[test]
    fn test_env_fallbacks() {
        let tests = vec![
            ("PLATFORM",     "PLATFORM_TYPE"),
            ("REGION",       "PLATFORM_REGION"),
            ("PROJECT",      "GCP_PROJECT_ID"),
            ("ENDPOINT",     "S3_ENDPOINT_URL"),
            ("ACCESS_TOKEN", "GOOGLE_OAUTH_ACCESS_TOKEN"),
            ("STATUS_FILE",  "BUCKET_STATUS_FILE"),
        ];

        let app = create_app();

        for test in tests {
            let id       = test.0;
            let expected = test.1;

            let env = app.get_arguments()
                .find(|arg| arg.get_id() == id)
                .and_then(|arg| arg.get_env());

            assert_eq!(env, Some(std::ffi::OsStr::new(expected)));
        }
    }

    #[test]
    fn test_is_valid_prefix() {
        let tests = vec![
            ("managed-velero-backups-", true),
            ("backups-2-",              true),
            ("-backups",                false),
            ("Backups-",                false),
            ("backups_",                false),
            ("",                        false),
        ];

        for test in tests {
            let prefix   = test.0;
            let expected = test.1;

            assert_eq!(is_valid_prefix(prefix).is_ok(), expected);
        }
    }
}
