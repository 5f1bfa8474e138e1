//! Config command - configuration inspection.

use anyhow::Result;
use clap::{Args, Subcommand};
use keyward_config::Settings;
use serde_json::Value;

use super::Context;

/// Placeholder printed instead of login body values.
const REDACTED: &str = "********";

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved settings (login body values redacted)
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Show the user config file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    tracing::debug!(command = ?args.command, "config command");
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Path => cmd_path(),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let settings = redacted(&ctx.settings);
    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    } else {
        print!("{}", settings.to_toml()?);
    }
    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    if ctx.json_output {
        let sources: Vec<_> = ctx
            .sources
            .iter()
            .map(|s| serde_json::json!({"path": s.path, "loaded": s.loaded}))
            .collect();
        println!("{}", serde_json::to_string_pretty(&sources)?);
        return Ok(());
    }

    for source in &ctx.sources {
        let mark = if source.loaded { "loaded " } else { "missing" };
        println!("{}  {}", mark, source.path.display());
    }
    Ok(())
}

fn cmd_path() -> Result<()> {
    match keyward_config::user_config_path() {
        Some(path) => println!("{}", path.display()),
        None => anyhow::bail!("no config directory available on this platform"),
    }
    Ok(())
}

fn redacted(settings: &Settings) -> Settings {
    let mut settings = settings.clone();
    if let Some(body) = settings.login.as_mut().and_then(|l| l.body.as_mut()) {
        for value in body.values_mut() {
            *value = Value::String(REDACTED.to_string());
        }
    }
    settings
}
