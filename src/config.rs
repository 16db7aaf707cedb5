use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const DEFAULT_LOOP_DELAY_MS: u32 = 100;
pub const DEFAULT_OUTPUT: &str = "sketch.ino";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}:{line}: invalid value '{value}' for '{key}'", path.display())]
    InvalidValue {
        path: PathBuf,
        line: usize,
        key: String,
        value: String,
    },
}

/// What the code generator needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub baud_rate: u32,
    pub loop_delay_ms: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            baud_rate: DEFAULT_BAUD_RATE,
            loop_delay_ms: DEFAULT_LOOP_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub generator: GeneratorConfig,
    pub output: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            generator: GeneratorConfig::default(),
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

impl Config {
    /// Load from the first config file found, or fall back to defaults.
    /// Resolution order:
    /// 1. SKETCHC_CONFIG environment variable
    /// 2. $XDG_CONFIG_HOME/sketchc/config
    /// 3. $HOME/.config/sketchc/config
    pub fn load() -> Result<Config, ConfigError> {
        match config_file_path() {
            Some(path) if path.exists() => {
                debug!("loading config from {}", path.display());
                Config::from_file(&path)
            }
            _ => Ok(Config::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Config::parse(&content, path)
    }

    /// Parse `key=value` lines. `#` starts a comment line.
    pub fn parse(content: &str, path: &Path) -> Result<Config, ConfigError> {
        let mut config = Config::default();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                warn!("{}:{}: ignoring line without '='", path.display(), index + 1);
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            let invalid = || ConfigError::InvalidValue {
                path: path.to_path_buf(),
                line: index + 1,
                key: key.to_string(),
                value: value.to_string(),
            };

            match key {
                "baud_rate" => {
                    config.generator.baud_rate = value.parse().map_err(|_| invalid())?;
                }
                "loop_delay_ms" => {
                    config.generator.loop_delay_ms = value.parse().map_err(|_| invalid())?;
                }
                "output" => {
                    if value.is_empty() {
                        return Err(invalid());
                    }
                    config.output = PathBuf::from(value);
                }
                other => warn!("{}:{}: unknown config key '{}'", path.display(), index + 1, other),
            }
        }

        Ok(config)
    }
}

fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("SKETCHC_CONFIG") {
        return Some(PathBuf::from(path));
    }

    let config_dir = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    Some(config_dir.join("sketchc").join("config"))
}
