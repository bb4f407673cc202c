//! Capture configuration
//!
//! Validated once at initialization and read thereafter. Loadable from a
//! TOML file for hosts that keep capture settings next to their own.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::severity::Severity;

/// Rejected configuration, reported before any capture state is built
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("general capacity must be at least 1 (got {0})")]
    InvalidCapacity(usize),

    #[error("category filter entries must be non-empty")]
    EmptyCategory,

    #[error("report prefix must be non-empty")]
    EmptyPrefix,
}

/// Capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Categories admitted by the filter; `None` accepts all
    #[serde(default)]
    pub category_filter: Option<BTreeSet<String>>,

    /// Events below this severity are rejected at intake
    #[serde(default = "default_minimum_severity")]
    pub minimum_severity: Severity,

    /// Maximum retained entries below Error severity
    #[serde(default = "default_general_capacity")]
    pub general_capacity: usize,

    /// File-name prefix for exported reports
    #[serde(default = "default_report_prefix")]
    pub report_prefix: String,

    /// Destination directory for exported reports
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,

    /// Report files older than this many days are swept on flush
    #[serde(default = "default_report_retention_days")]
    pub report_retention_days: u64,
}

fn default_minimum_severity() -> Severity {
    Severity::Info
}

fn default_general_capacity() -> usize {
    500
}

fn default_report_prefix() -> String {
    "capture".to_string()
}

fn default_report_retention_days() -> u64 {
    7
}

/// Default reports directory (~/.blackbox/reports)
/// Falls back to ./.blackbox/reports if the home directory cannot be determined
fn default_reports_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".blackbox").join("reports"),
        None => {
            tracing::warn!("Could not determine home directory, using current directory for reports");
            PathBuf::from(".blackbox").join("reports")
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            category_filter: None,
            minimum_severity: default_minimum_severity(),
            general_capacity: default_general_capacity(),
            report_prefix: default_report_prefix(),
            reports_dir: default_reports_dir(),
            report_retention_days: default_report_retention_days(),
        }
    }
}

impl CaptureConfig {
    /// Load configuration from file, or return default if not found
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).context("Failed to read capture config")?;
            toml::from_str(&content).context("Failed to parse capture config")
        } else {
            Ok(Self::default())
        }
    }

    /// Check the configuration before it is applied
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general_capacity == 0 {
            return Err(ConfigError::InvalidCapacity(self.general_capacity));
        }
        if self.report_prefix.trim().is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if let Some(categories) = &self.category_filter {
            if categories.iter().any(|c| c.trim().is_empty()) {
                return Err(ConfigError::EmptyCategory);
            }
        }
        Ok(())
    }
}
