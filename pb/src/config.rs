//! Configuration for progress-bar-plus
//!
//! Settings are read from YAML. Lookup order for [`Config::load`] with no
//! explicit path: `$PROGRESS_BAR_PLUS_CONFIG`, the user config directory,
//! then `progress-bar-plus.yml` in the working directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ProgressError;

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "PROGRESS_BAR_PLUS_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Minimum seconds between renders for terminals and notebooks
    #[serde(default = "default_interactive_debounce")]
    pub interactive_debounce_secs: f64,

    /// Minimum seconds between renders when output is redirected
    #[serde(default = "default_script_debounce")]
    pub script_debounce_secs: f64,

    /// Width of the text bar in character cells
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,

    /// Number of recent samples kept for the short-term rate
    #[serde(default = "default_sample_window")]
    pub sample_window: usize,

    /// Age after which the medium-term anchor sample is replaced
    #[serde(default = "default_anchor_period")]
    pub anchor_period_secs: f64,

    /// Count delta the anchor estimator needs before it is trusted
    #[serde(default = "default_anchor_min_delta")]
    pub anchor_min_delta: u64,

    /// Emit ANSI colors in text mode
    #[serde(default = "default_color")]
    pub color: bool,

    /// Log level for the `pb` binary (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(default)]
    pub log_level: Option<String>,
}

fn default_interactive_debounce() -> f64 {
    crate::DEFAULT_INTERACTIVE_DEBOUNCE_SECS
}

fn default_script_debounce() -> f64 {
    crate::DEFAULT_SCRIPT_DEBOUNCE_SECS
}

fn default_bar_width() -> usize {
    crate::DEFAULT_BAR_WIDTH
}

fn default_sample_window() -> usize {
    crate::DEFAULT_SAMPLE_WINDOW
}

fn default_anchor_period() -> f64 {
    crate::DEFAULT_ANCHOR_PERIOD_SECS
}

fn default_anchor_min_delta() -> u64 {
    5
}

fn default_color() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interactive_debounce_secs: default_interactive_debounce(),
            script_debounce_secs: default_script_debounce(),
            bar_width: default_bar_width(),
            sample_window: default_sample_window(),
            anchor_period_secs: default_anchor_period(),
            anchor_min_delta: default_anchor_min_delta(),
            color: default_color(),
            log_level: None,
        }
    }
}

static GLOBAL: LazyLock<Config> = LazyLock::new(|| match Config::load(None) {
    Ok(config) => config,
    Err(e) => {
        warn!(error = %e, "Config::global: falling back to defaults");
        Config::default()
    }
});

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self, ProgressError> {
        debug!(?path, "Config::load: called");
        if let Some(config_path) = path {
            return Self::load_file(config_path);
        }

        let default_paths = [
            std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from),
            dirs::config_dir().map(|p| p.join("progress-bar-plus").join("config.yml")),
            Some(PathBuf::from("progress-bar-plus.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                debug!(path = %path.display(), "Config::load: found config file");
                return Self::load_file(path);
            }
        }

        debug!("Config::load: no config file, using defaults");
        Ok(Config::default())
    }

    /// Process-wide settings, loaded on first use
    pub fn global() -> &'static Config {
        &GLOBAL
    }

    fn load_file(path: &Path) -> Result<Self, ProgressError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content).map_err(|source| ProgressError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the tracker cannot work with
    pub fn validate(&self) -> Result<(), ProgressError> {
        for (name, value) in [
            ("interactive_debounce_secs", self.interactive_debounce_secs),
            ("script_debounce_secs", self.script_debounce_secs),
            ("anchor_period_secs", self.anchor_period_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ProgressError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.bar_width == 0 {
            return Err(ProgressError::InvalidConfig("bar_width must be positive".to_string()));
        }
        if self.sample_window < 2 {
            return Err(ProgressError::InvalidConfig(format!(
                "sample_window must hold at least 2 samples, got {}",
                self.sample_window
            )));
        }
        Ok(())
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<(), ProgressError> {
        let content = serde_yaml::to_string(self).map_err(|source| ProgressError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn interactive_debounce(&self) -> Duration {
        secs_or(self.interactive_debounce_secs, crate::DEFAULT_INTERACTIVE_DEBOUNCE_SECS)
    }

    pub fn script_debounce(&self) -> Duration {
        secs_or(self.script_debounce_secs, crate::DEFAULT_SCRIPT_DEBOUNCE_SECS)
    }

    pub fn anchor_period(&self) -> Duration {
        secs_or(self.anchor_period_secs, crate::DEFAULT_ANCHOR_PERIOD_SECS)
    }
}

/// Seconds as a `Duration`, using `fallback` for negative or non-finite values
fn secs_or(secs: f64, fallback: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or_else(|_| Duration::from_secs_f64(fallback))
}
