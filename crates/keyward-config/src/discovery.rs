//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `~/.config/keyward/config.toml` (user config)
//! 2. `./keyward.toml` (project-local)
//! 3. CLI arguments (handled externally)
//!
//! An explicit config path replaces both layers.

use std::path::{Path, PathBuf};

use crate::{ConfigError, Result, Settings};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "keyward.toml";

/// Default config filename within the user config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for config directory resolution.
const APP_NAME: &str = "keyward";

/// Environment variable to override the config directory.
const CONFIG_DIR_ENV: &str = "KEYWARD_CONFIG_DIR";

/// Tracks where each config layer was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the config file.
    pub path: PathBuf,
    /// Whether the file was found and loaded.
    pub loaded: bool,
}

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    /// The merged settings.
    pub settings: Settings,
    /// Sources that were checked, in order of precedence (lowest first).
    pub sources: Vec<ConfigSource>,
    /// Warnings generated during loading (e.g., unparsable layers).
    pub warnings: Vec<String>,
}

impl LoadedSettings {
    /// Get paths of sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Load settings, from `explicit` alone when given, else by discovery.
///
/// A missing or malformed explicit file is an error; discovered layers that
/// fail to load only produce warnings.
pub fn load_settings(explicit: Option<&Path>) -> Result<LoadedSettings> {
    match explicit {
        Some(path) => Ok(LoadedSettings {
            settings: load_settings_file(path)?,
            sources: vec![ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }],
            warnings: Vec::new(),
        }),
        None => load_settings_with_options(None, None),
    }
}

/// Discover and merge the user and project layers.
///
/// `config_dir` overrides both `KEYWARD_CONFIG_DIR` and the platform
/// default; `project_dir` replaces the working directory.
pub fn load_settings_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedSettings> {
    let mut settings = Settings::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    let user_config_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => user_config_path(),
    };
    if let Some(path) = user_config_path {
        sources.push(load_layer(&mut settings, &path, &mut warnings));
    }

    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    sources.push(load_layer(&mut settings, &project_path, &mut warnings));

    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    Ok(LoadedSettings {
        settings,
        sources,
        warnings,
    })
}

/// Load settings from a specific file path (no discovery).
pub fn load_settings_file(path: &Path) -> Result<Settings> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Settings::from_toml(&contents)
}

/// Path of the user config file.
///
/// Checks `KEYWARD_CONFIG_DIR` first, then falls back to the platform
/// config directory.
pub fn user_config_path() -> Option<PathBuf> {
    user_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// The user config directory for keyward.
pub fn user_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Try to load a config file and merge it into the existing settings.
fn load_layer(settings: &mut Settings, path: &Path, warnings: &mut Vec<String>) -> ConfigSource {
    if !path.is_file() {
        return ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        };
    }

    match load_settings_file(path) {
        Ok(layer) => {
            settings.merge(layer);
            tracing::debug!(path = %path.display(), "loaded config layer");
            ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }
        }
        Err(e) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), e));
            ConfigSource {
                path: path.to_path_buf(),
                loaded: false,
            }
        }
    }
}
