//! Configuration file loading and per-user file locations
//!
//! The config file is a YAML document holding the openexchangerates.org
//! application ID. Config and cache locations follow the XDG base directory
//! conventions (`~/.config/xrate/` and `~/.cache/xrate/`) on every platform.

use directories::BaseDirs;
use serde::Deserialize;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Directory name used under the XDG config and cache homes
const APP_DIR_NAME: &str = "xrate";

/// Name of the config file inside the config directory
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the exchange rate cache file inside the cache directory
const CACHE_FILE_NAME: &str = "exchange-rates.json";

/// Errors that can occur when locating or loading the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No home directory could be determined for the current user
    #[error("unable to determine the user's home directory")]
    NoHomeDir,

    /// The config file does not exist
    #[error("missing config file: {}", .0.display())]
    Missing(PathBuf),

    /// The config file exists but could not be read
    #[error("failed to open config file: {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config file is not valid YAML of the expected shape
    #[error("failed to decode config file: {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The application ID field is absent or empty
    #[error("missing openexchangerates.org App ID (xrates-appid)")]
    MissingAppId,
}

/// Contents of the user's config file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// openexchangerates.org application ID
    #[serde(rename = "xrates-appid", default)]
    pub xrates_appid: String,
}

impl Config {
    /// Loads and validates the config file at `path`
    ///
    /// # Returns
    /// * `Ok(Config)` with a non-empty application ID
    /// * `Err(ConfigError)` if the file is missing, unreadable, malformed, or
    ///   has no application ID
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ConfigError::Missing(path.to_path_buf())
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let config: Config =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Decode {
                path: path.to_path_buf(),
                source,
            })?;

        if config.xrates_appid.trim().is_empty() {
            return Err(ConfigError::MissingAppId);
        }
        Ok(config)
    }
}

/// Per-user locations of the config and cache files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Path of the YAML config file
    pub config_file: PathBuf,
    /// Path of the JSON exchange rate cache
    pub cache_file: PathBuf,
}

impl Paths {
    /// Resolves XDG-compliant config and cache paths for the current user
    ///
    /// Honors absolute `XDG_CONFIG_HOME` and `XDG_CACHE_HOME` values, falling
    /// back to `~/.config` and `~/.cache`. Platform-native locations such as
    /// `~/Library` on macOS are not used.
    pub fn from_environment() -> Result<Self, ConfigError> {
        let base_dirs = BaseDirs::new().ok_or(ConfigError::NoHomeDir)?;
        let home = base_dirs.home_dir();
        let config_home = xdg_home(env::var_os("XDG_CONFIG_HOME"), home, ".config");
        let cache_home = xdg_home(env::var_os("XDG_CACHE_HOME"), home, ".cache");

        let paths = Self::in_dirs(
            &config_home.join(APP_DIR_NAME),
            &cache_home.join(APP_DIR_NAME),
        );
        debug!(
            config = %paths.config_file.display(),
            cache = %paths.cache_file.display(),
            "resolved file locations"
        );
        Ok(paths)
    }

    /// Builds paths under explicit config and cache directories
    pub fn in_dirs(config_dir: &Path, cache_dir: &Path) -> Self {
        Self {
            config_file: config_dir.join(CONFIG_FILE_NAME),
            cache_file: cache_dir.join(CACHE_FILE_NAME),
        }
    }
}

/// Picks an XDG base directory from an environment value
///
/// Relative or empty values are ignored, per the XDG base directory rules, in favor of
/// `home` joined with `default`.
fn xdg_home(value: Option<OsString>, home: &Path, default: &str) -> PathBuf {
    value
        .map(PathBuf::from)
        .filter(|dir| dir.is_absolute())
        .unwrap_or_else(|| home.join(default))
}
