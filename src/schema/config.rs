//! Report configuration for the command-line front end.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::export::Compression;

fn default_print_summary() -> bool {
    true
}

/// What to read and which reports to produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Persisted experiment result stream.
    pub results_path: PathBuf,
    /// Where to write the numeric archive, if anywhere.
    #[serde(default)]
    pub npz_path: Option<PathBuf>,
    /// Entry compression of the numeric archive.
    #[serde(default)]
    pub compression: Compression,
    /// Overrides the stored maximal fitness score used by the efficiency
    /// score.
    #[serde(default)]
    pub max_fitness_score: Option<f64>,
    /// Print the human-readable summary to stdout.
    #[serde(default = "default_print_summary")]
    pub print_summary: bool,
    /// Where to write the summary as JSON, if anywhere.
    #[serde(default)]
    pub summary_json_path: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            results_path: PathBuf::from("out/xor.dat"),
            npz_path: Some(PathBuf::from("out/xor.npz")),
            compression: Compression::Stored,
            max_fitness_score: None,
            print_summary: true,
            summary_json_path: None,
        }
    }
}

impl ReportConfig {
    /// Read and validate a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.results_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("results_path must not be empty".into()));
        }
        if let Some(score) = self.max_fitness_score {
            if !score.is_finite() || score < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "max_fitness_score must be finite and non-negative, got {}",
                    score
                )));
            }
        }
        for (name, output) in [
            ("npz_path", &self.npz_path),
            ("summary_json_path", &self.summary_json_path),
        ] {
            if output.as_deref() == Some(self.results_path.as_path()) {
                return Err(ConfigError::Invalid(format!(
                    "{} would overwrite the results file",
                    name
                )));
            }
        }
        Ok(())
    }
}
