//! Fetch options from the config file, with command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde_json::Value;
use tracing::debug;

use ffr_model::FetchOptions;

pub const CONFIG_FILE_NAME: &str = "options.toml";

/// Options together with the file they were read from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedOptions {
    pub options: FetchOptions,
    /// `None` when no config file was found and defaults are used.
    pub source: Option<PathBuf>,
}

/// Platform config location, e.g. `~/.config/ffr/options.toml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "ff-redux", "ffr").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Load options from `explicit`, or from the default location if it exists.
///
/// An explicit path must exist; a missing default file means defaults.
pub fn load_options(explicit: Option<&Path>) -> Result<LoadedOptions> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.is_file() => path,
            _ => {
                debug!("no config file, using default fetch options");
                return Ok(LoadedOptions {
                    options: FetchOptions::default(),
                    source: None,
                });
            }
        },
    };
    let options = read_options(&path)?;
    debug!(path = %path.display(), ?options, "loaded fetch options");
    Ok(LoadedOptions {
        options,
        source: Some(path),
    })
}

fn read_options(path: &Path) -> Result<FetchOptions> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    FetchOptions::from_toml_str(&text).with_context(|| format!("parse config {}", path.display()))
}

/// Flags that take precedence over the config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionOverrides {
    pub no_cache: bool,
    pub fetch_all: bool,
    pub incremental: bool,
    pub max_fetch_times: Option<u32>,
    pub data: Option<Value>,
}

impl OptionOverrides {
    /// Boolean flags only switch options on.
    pub fn apply(&self, mut options: FetchOptions) -> FetchOptions {
        options.no_cache |= self.no_cache;
        options.fetch_all |= self.fetch_all;
        options.incremental |= self.incremental;
        if let Some(times) = self.max_fetch_times {
            options.max_fetch_times = times;
        }
        if let Some(data) = &self.data {
            options.data = Some(data.clone());
        }
        options
    }
}
