use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default interval between expiry monitor ticks, in seconds.
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 30;
/// Default expiring-soon warning threshold, in seconds (5 minutes).
const DEFAULT_WARNING_THRESHOLD_SECS: u64 = 300;
/// Default session file name under the state directory.
const DEFAULT_SESSION_FILE: &str = ".crm-session.json";

/// The client's configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the CRM REST API.
    pub api_base_url: String,
    /// Path of the durable session file.
    pub session_file: PathBuf,
    /// Interval between expiry monitor ticks.
    pub check_interval: Duration,
    /// How long before expiry the session counts as expiring-soon.
    pub warning_threshold: Duration,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_base_url = env::var("CRM_API_URL")
            .context("CRM_API_URL must be set (e.g. https://api.example.com/api)")?;

        let session_file = env::var("CRM_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE));

        let check_interval_secs: u64 = env::var("CRM_CHECK_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_CHECK_INTERVAL_SECS.to_string())
            .parse()
            .context("Invalid CRM_CHECK_INTERVAL_SECS")?;

        let warning_threshold_secs: u64 = env::var("CRM_WARNING_THRESHOLD_SECS")
            .unwrap_or_else(|_| DEFAULT_WARNING_THRESHOLD_SECS.to_string())
            .parse()
            .context("Invalid CRM_WARNING_THRESHOLD_SECS")?;

        Ok(Self {
            api_base_url,
            session_file,
            check_interval: Duration::from_secs(check_interval_secs),
            warning_threshold: Duration::from_secs(warning_threshold_secs),
        })
    }

    /// Creates a `Config` with default timings for the given API URL and
    /// session file path.
    pub fn new(api_base_url: impl Into<String>, session_file: impl Into<PathBuf>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            session_file: session_file.into(),
            check_interval: Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
            warning_threshold: Duration::from_secs(DEFAULT_WARNING_THRESHOLD_SECS),
        }
    }
}
