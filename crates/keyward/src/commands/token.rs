//! Token command - establish a session and report token expiry.
//!
//! Token values are never printed.

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use keyward_client::TokenRecord;
use serde::Serialize;

use super::Context;

/// Arguments for the token command.
#[derive(Args, Debug)]
pub struct TokenArgs {
    /// End the session afterwards (notifies the logout endpoint)
    #[arg(long)]
    pub logout: bool,
}

/// Expiry report for one token.
#[derive(Debug, Serialize)]
struct TokenStatus {
    issued: bool,
    valid: bool,
    expires_at: Option<DateTime<Utc>>,
    expires_in_secs: Option<i64>,
}

impl TokenStatus {
    fn of(record: &TokenRecord, now: DateTime<Utc>) -> Self {
        Self {
            issued: record.is_issued(),
            valid: record.is_valid_at(now),
            expires_at: record.expiry,
            expires_in_secs: record.expires_in(now).map(|d| d.num_seconds()),
        }
    }

    fn describe(&self) -> String {
        match (self.issued, self.expires_at, self.expires_in_secs) {
            (false, _, _) => "not issued".to_string(),
            (true, Some(at), Some(secs)) => format!(
                "{} (expires {}, in {}s)",
                if self.valid { "valid" } else { "expired" },
                at.to_rfc3339(),
                secs
            ),
            (true, _, _) => "issued, no readable expiry".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SessionStatus {
    access: TokenStatus,
    refresh: TokenStatus,
}

/// Run the token command.
pub async fn run(args: TokenArgs, ctx: &Context) -> Result<()> {
    let client = keyward_config::build_client(&ctx.settings)?;
    tracing::debug!(base_url = ?ctx.settings.base_url, "establishing session");
    client
        .authenticate()
        .await
        .context("could not establish a session")?;

    let tokens = client.tokens();
    let now = Utc::now();
    let status = SessionStatus {
        access: TokenStatus::of(&tokens.access(), now),
        refresh: TokenStatus::of(&tokens.refresh(), now),
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("access:  {}", status.access.describe());
        println!("refresh: {}", status.refresh.describe());
    }

    if args.logout {
        tracing::info!("ending session");
        client.logout().await.context("logout failed")?;
        if !ctx.json_output {
            println!("session ended");
        }
    }
    Ok(())
}
