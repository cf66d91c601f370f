use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Inclusive bounds for the target bitrate, in bits per second.
pub const MIN_BITRATE: u32 = 0;
pub const MAX_BITRATE: u32 = 256_000;

/// Bitrate used when the host supplies none.
pub const DEFAULT_BITRATE: u32 = 160_000;

/// What to do when a single file fails to encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop scheduling new work at the first failure and fail the run.
    Abort,
    /// Record the failure, keep encoding, report the full list at the end.
    ContinueAndReport,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Abort
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "abort" => Ok(FailurePolicy::Abort),
            "continue-and-report" => Ok(FailurePolicy::ContinueAndReport),
            other => Err(format!(
                "unknown failure policy '{other}' (expected 'abort' or 'continue-and-report')"
            )),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Abort => write!(f, "abort"),
            FailurePolicy::ContinueAndReport => write!(f, "continue-and-report"),
        }
    }
}

/// Configuration for one pipeline run, supplied by the host build and
/// threaded through the entry points as a plain value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeConfig {
    /// Directory containing the raw audio tree
    #[serde(default)]
    pub source_dir: PathBuf,
    /// Directory receiving the compressed audio tree
    #[serde(default)]
    pub dest_dir: PathBuf,
    /// Target bitrate in bits per second
    #[serde(default = "default_bitrate")]
    pub bitrate: u32,
    /// Number of encoder processes to run at once
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    /// Encoder binary to invoke
    #[serde(default = "default_encoder_bin")]
    pub encoder_bin: PathBuf,
    /// Severity of a single failed encode
    #[serde(default)]
    pub on_encode_failure: FailurePolicy,
}

fn default_bitrate() -> u32 {
    DEFAULT_BITRATE
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_encoder_bin() -> PathBuf {
    PathBuf::from("ffmpeg")
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl EncodeConfig {
    /// Create a default configuration; source and destination stay empty
    /// and must be filled in before `validate` passes.
    pub fn default_config() -> Self {
        Self {
            source_dir: PathBuf::new(),
            dest_dir: PathBuf::new(),
            bitrate: default_bitrate(),
            jobs: default_jobs(),
            encoder_bin: default_encoder_bin(),
            on_encode_failure: FailurePolicy::default(),
        }
    }

    /// Load configuration from a file, or return defaults if path is None
    /// or the file doesn't exist. TOML is selected by extension, JSON
    /// otherwise.
    pub fn load_config(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default_config();

        if let Some(config_path) = path {
            if config_path.exists() {
                let content = std::fs::read_to_string(config_path).map_err(|e| {
                    PipelineError::io(
                        format!("failed to read config file {}", config_path.display()),
                        e,
                    )
                })?;

                if config_path.extension().and_then(|s| s.to_str()) == Some("toml") {
                    config = toml::from_str(&content).map_err(|e| {
                        PipelineError::Config(format!(
                            "failed to parse TOML config {}: {e}",
                            config_path.display()
                        ))
                    })?;
                } else {
                    config = serde_json::from_str(&content).map_err(|e| {
                        PipelineError::Config(format!(
                            "failed to parse JSON config {}: {e}",
                            config_path.display()
                        ))
                    })?;
                }
            }
        }

        Ok(config)
    }

    /// Pre-flight checks. Runs before any filesystem traversal.
    pub fn validate(&self) -> Result<()> {
        if self.source_dir.as_os_str().is_empty() {
            return Err(PipelineError::Config(
                "source directory cannot be empty".to_string(),
            ));
        }
        if self.dest_dir.as_os_str().is_empty() {
            return Err(PipelineError::Config(
                "destination directory cannot be empty".to_string(),
            ));
        }
        // The lower bound is enforced by the unsigned type; only the upper
        // bound needs a runtime check.
        if self.bitrate > MAX_BITRATE {
            return Err(PipelineError::Config(format!(
                "bitrate must be between {MIN_BITRATE} and {MAX_BITRATE} bits per second, got {}",
                self.bitrate
            )));
        }
        if self.jobs == 0 {
            return Err(PipelineError::Config(
                "jobs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
