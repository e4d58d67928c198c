//! Uploader configuration.
//!
//! Defaults live in constants; [`UploadConfig::from_env`] overlays the
//! environment (and `.env`, if present). The resulting value is built once at
//! start-up and handed to whatever needs it.

use std::env;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// Study Tracker base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Upload endpoint, relative to the base URL.
pub const DEFAULT_UPLOAD_PATH: &str = "/api/internal/data-files/upload";

/// Maximum file size accepted into the queue (in bytes).
///
/// 20 MiB limit.
pub const MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// Per-request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Buffered notifications per subscriber before lagging ones are dropped.
pub const NOTIFICATION_CAPACITY: usize = 100;

/// Largest multipart body the session host accepts on enqueue.
///
/// Well above the per-file ceiling so oversize files reach the queue and are
/// refused individually.
pub const MAX_REQUEST_BODY: usize = 512 * 1024 * 1024;

/// Port for `uploader serve`.
pub const DEFAULT_PORT: u16 = 3000;

/// Process-wide uploader settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    /// Base URL of the Study Tracker API, without trailing slash.
    pub api_url: String,
    /// Path of the multipart upload endpoint.
    pub upload_path: String,
    /// Size ceiling enforced on enqueue.
    pub max_file_size: u64,
    /// Transport timeout for a single upload request.
    pub timeout: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            upload_path: DEFAULT_UPLOAD_PATH.to_string(),
            max_file_size: MAX_FILE_SIZE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl UploadConfig {
    /// Load from `.env` and the process environment.
    ///
    /// Recognised variables: `STUDY_TRACKER_URL`, `STUDY_TRACKER_UPLOAD_PATH`,
    /// `UPLOAD_MAX_FILE_SIZE` (bytes) and `UPLOAD_TIMEOUT_SECS`.
    pub fn from_env() -> ConfigResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("STUDY_TRACKER_URL") {
            config = config.with_api_url(&url);
        }
        if let Some(path) = lookup("STUDY_TRACKER_UPLOAD_PATH") {
            config.upload_path = path;
        }
        if let Some(raw) = lookup("UPLOAD_MAX_FILE_SIZE") {
            config.max_file_size = parse_u64("UPLOAD_MAX_FILE_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("UPLOAD_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_u64("UPLOAD_TIMEOUT_SECS", &raw)?);
        }

        Ok(config)
    }

    /// Override the base URL.
    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Full URL of the upload endpoint.
    pub fn upload_url(&self) -> String {
        if self.upload_path.starts_with('/') {
            format!("{}{}", self.api_url, self.upload_path)
        } else {
            format!("{}/{}", self.api_url, self.upload_path)
        }
    }
}

fn parse_u64(var: &'static str, raw: &str) -> ConfigResult<u64> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: raw.to_string(),
    })
}
