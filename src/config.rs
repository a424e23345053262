//! Discovery-run configuration: thresholds the engine's sampler and
//! validator are tuned by, plus logging/output sink selection.

use color_eyre::eyre::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

pub const INVALID_FDS_THRESHOLD: f64 = 0.01;
pub const EFFICIENCY_THRESHOLD_INIT: f64 = 0.01;
pub const LEARNING_FACTOR: f64 = 0.5;
pub const EFFICIENCY_LIMIT: f64 = 1e-14;

/// Tunables for one discovery run. Defaults match the original's module
/// constants; everything here is overridable from the CLI or a TOML side
/// file for batch runs across many tables.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Single-byte field separator for the input table.
    pub separator: u8,
    pub efficiency_threshold: f64,
    pub learning_factor: f64,
    pub invalid_fds_threshold: f64,
    pub efficiency_limit: f64,
    /// Whether to report `∅ -> a` FDs for constant columns.
    pub report_constant_empty_lhs: bool,
    pub debug: bool,
    pub mute: bool,
    pub logfile: Option<PathBuf>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            separator: b',',
            efficiency_threshold: EFFICIENCY_THRESHOLD_INIT,
            learning_factor: LEARNING_FACTOR,
            invalid_fds_threshold: INVALID_FDS_THRESHOLD,
            efficiency_limit: EFFICIENCY_LIMIT,
            report_constant_empty_lhs: true,
            debug: false,
            mute: false,
            logfile: None,
        }
    }
}

impl DiscoveryConfig {
    /// Rejects configurations that would make the sampler or validator
    /// loop forever or misbehave. Called once at startup.
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_factor > 0.0 && self.learning_factor < 1.0) {
            bail!(
                "learning_factor must be in (0, 1), got {}",
                self.learning_factor
            );
        }
        if self.efficiency_threshold <= 0.0 {
            bail!(
                "efficiency_threshold must be positive, got {}",
                self.efficiency_threshold
            );
        }
        if self.efficiency_limit <= 0.0 {
            bail!(
                "efficiency_limit must be positive, got {}",
                self.efficiency_limit
            );
        }
        if self.efficiency_limit >= self.efficiency_threshold {
            bail!("efficiency_limit must be smaller than efficiency_threshold");
        }
        if self.invalid_fds_threshold < 0.0 {
            bail!(
                "invalid_fds_threshold must be non-negative, got {}",
                self.invalid_fds_threshold
            );
        }
        Ok(())
    }

    /// Parses a TOML overlay, falling back to [`DiscoveryConfig::default`]
    /// for any field the file doesn't mention. Mirrors the teacher's
    /// `get_cfg_doc_from_path` pattern, minus the scenario-table structure
    /// this crate has no use for.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml_edit::de::from_str(text).context("config could not be parsed as TOML")
    }

    pub fn from_toml_path(path: &Path) -> Result<Self> {
        let text =
            read_to_string(path).with_context(|| format!("config file {} could not be read", path.display()))?;
        Self::from_toml_str(&text)
    }
}
