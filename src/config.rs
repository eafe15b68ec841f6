//! Optional TOML configuration.
//!
//! ```toml
//! cycle_marking = "active-path"
//! delimiter = ";"
//! log_filter = "rpnsheet_core=debug"
//! ```

use directories::ProjectDirs;
use rpnsheet_core::{CycleMarking, SheetOptions};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub cycle_marking: Option<CycleMarking>,
    pub delimiter: Option<char>,
    /// `tracing_subscriber::EnvFilter` directives; `RUST_LOG` wins when set.
    pub log_filter: Option<String>,
}

impl Config {
    pub fn sheet_options(&self) -> SheetOptions {
        let defaults = SheetOptions::default();
        SheetOptions {
            cycle_marking: self.cycle_marking.unwrap_or(defaults.cycle_marking),
            delimiter: self.delimiter.unwrap_or(defaults.delimiter),
        }
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "rpnsheet")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

pub fn parse_config(content: &str, path: &Path) -> Result<Config, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    let meta = std::fs::metadata(path).map_err(io_err)?;
    if meta.len() > MAX_CONFIG_FILE_BYTES {
        return Err(ConfigError::TooLarge {
            path: path.to_path_buf(),
            size: meta.len(),
            max: MAX_CONFIG_FILE_BYTES,
        });
    }
    let content = std::fs::read_to_string(path).map_err(io_err)?;
    parse_config(&content, path)
}

/// Load configuration.
///
/// An explicit path must exist and parse. The per-user file is optional, and
/// if it is broken the defaults are used and a warning is returned instead.
pub fn load_config(explicit: Option<&Path>) -> Result<(Config, Vec<String>), ConfigError> {
    if let Some(path) = explicit {
        return Ok((read_config(path)?, Vec::new()));
    }

    let mut warnings = Vec::new();
    let Some(path) = user_config_path() else {
        return Ok((Config::default(), warnings));
    };
    if !path.exists() {
        return Ok((Config::default(), warnings));
    }
    match read_config(&path) {
        Ok(config) => Ok((config, warnings)),
        Err(err) => {
            warnings.push(err.to_string());
            Ok((Config::default(), warnings))
        }
    }
}
