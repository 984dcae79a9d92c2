//! Layered configuration for chordsnap.
//!
//! Files are loaded in order (later wins), merged table by table:
//! 1. `~/.config/chordsnap/config.toml` (user)
//! 2. `./chordsnap.toml` (local), or the `--config` path when given
//! 3. Environment variables (`CHORDSNAP_*`)
//!
//! ```toml
//! log_level = "debug"
//!
//! [synth]
//! bpm = 120.0
//!
//! [matcher]
//! metric = "L2"
//! top_n = 10
//!
//! [data]
//! frames = 128
//! nb_test = 100
//! ```

use std::path::{Path, PathBuf};

use progression::{Checkpoints, Metric, SynthConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {var}: {message}")]
    Env { var: String, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Information about where config values came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub metric: Metric,
    /// Size of each query's top-N index list
    pub top_n: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            metric: Metric::L1,
            top_n: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Frames per song row
    pub frames: usize,
    /// Leading rows held out as the test set
    pub nb_test: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            frames: 128,
            nb_test: 0,
        }
    }
}

/// Complete chordsnap configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChordsnapConfig {
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    pub synth: SynthConfig,
    pub matcher: MatcherConfig,
    pub data: DataConfig,
    pub diagnostics: Checkpoints,
}

impl Default for ChordsnapConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            synth: SynthConfig::default(),
            matcher: MatcherConfig::default(),
            data: DataConfig::default(),
            diagnostics: Checkpoints::default(),
        }
    }
}

impl ChordsnapConfig {
    /// Load from the standard locations and the environment.
    pub fn load_with_sources(cli_path: Option<&Path>) -> Result<(Self, ConfigSources), ConfigError> {
        let files = discover_config_files(cli_path)?;
        let (mut config, mut sources) = Self::from_files(&files)?;
        config.apply_env_overrides(&mut sources, |var| std::env::var(var).ok())?;
        config.validate()?;
        Ok((config, sources))
    }

    /// Merge the given files in order, without the environment.
    pub fn from_files(paths: &[PathBuf]) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut merged = toml::Table::new();

        for path in paths {
            merge_tables(&mut merged, load_table(path)?);
            sources.files.push(path.clone());
        }

        let config: ChordsnapConfig = toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse {
                path: paths.last().cloned().unwrap_or_default(),
                message: e.to_string(),
            })?;
        Ok((config, sources))
    }

    /// Apply `CHORDSNAP_*` overrides read through `lookup`.
    pub fn apply_env_overrides(
        &mut self,
        sources: &mut ConfigSources,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = lookup("CHORDSNAP_BPM") {
            self.synth.bpm = parse_env("CHORDSNAP_BPM", &v)?;
            sources.env_overrides.push("CHORDSNAP_BPM".to_string());
        }
        if let Some(v) = lookup("CHORDSNAP_METRIC") {
            self.matcher.metric = v.parse().map_err(|e: progression::Error| ConfigError::Env {
                var: "CHORDSNAP_METRIC".to_string(),
                message: e.to_string(),
            })?;
            sources.env_overrides.push("CHORDSNAP_METRIC".to_string());
        }
        if let Some(v) = lookup("CHORDSNAP_TOP_N") {
            self.matcher.top_n = parse_env("CHORDSNAP_TOP_N", &v)?;
            sources.env_overrides.push("CHORDSNAP_TOP_N".to_string());
        }
        if let Some(v) = lookup("CHORDSNAP_LOG_LEVEL") {
            self.log_level = v;
            sources.env_overrides.push("CHORDSNAP_LOG_LEVEL".to_string());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.synth
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.matcher.top_n == 0 {
            return Err(ConfigError::Invalid("matcher.top_n must be at least 1".into()));
        }
        if self.data.frames == 0 {
            return Err(ConfigError::Invalid("data.frames must be at least 1".into()));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

fn parse_env<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var: var.to_string(),
        message: e.to_string(),
    })
}

/// Config files to load, in load order.
///
/// An explicit `cli_path` replaces the local `./chordsnap.toml` and must
/// exist.
pub fn discover_config_files(cli_path: Option<&Path>) -> Result<Vec<PathBuf>, ConfigError> {
    let mut files = Vec::new();

    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("chordsnap/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    match cli_path {
        Some(path) if path.exists() => files.push(path.to_path_buf()),
        Some(path) => {
            return Err(ConfigError::FileRead {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
            })
        }
        None => {
            let local = PathBuf::from("chordsnap.toml");
            if local.exists() {
                files.push(local);
            }
        }
    }

    Ok(files)
}

fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Merge `overlay` into `base`. Nested tables merge key by key; any other
/// value in `overlay` replaces the one in `base`.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => {
                if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                    merge_tables(existing, incoming);
                } else {
                    base.insert(key, toml::Value::Table(incoming));
                }
            }
            other => {
                base.insert(key, other);
            }
        }
    }
}
