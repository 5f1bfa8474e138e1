//! CLI command handlers.

use std::path::Path;

use anyhow::Result;
use keyward_config::{ConfigSource, Settings};

pub mod config;
pub mod request;
pub mod token;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Resolved settings, CLI overrides applied.
    pub settings: Settings,
    /// Config files that were checked.
    pub sources: Vec<ConfigSource>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Load settings and apply the command-line overrides.
    pub fn load(
        config: Option<&Path>,
        base_url: Option<String>,
        json_output: bool,
        verbose: bool,
    ) -> Result<Self> {
        let loaded = keyward_config::load_settings(config)?;
        tracing::debug!(
            loaded = ?loaded.loaded_from(),
            checked = loaded.sources.len(),
            "loaded settings"
        );

        let mut settings = loaded.settings;
        if base_url.is_some() {
            tracing::debug!(base_url = ?base_url, "base URL overridden from command line");
            settings.base_url = base_url;
        }

        Ok(Self {
            settings,
            sources: loaded.sources,
            json_output,
            verbose,
        })
    }
}
