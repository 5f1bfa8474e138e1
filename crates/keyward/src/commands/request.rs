//! Request command - one authenticated HTTP request.

use anyhow::{Context as _, Result};
use clap::Args;
use keyward_client::{Method, RequestConfig};
use serde_json::Value;

use super::Context;

/// Arguments for the request command.
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE, ...)
    pub method: String,

    /// Path relative to the base URL, or an absolute URL
    pub path: String,

    /// JSON request body
    #[arg(short, long)]
    pub data: Option<String>,

    /// Query parameter as key=value (repeatable)
    #[arg(short, long = "query", value_parser = parse_query)]
    pub query: Vec<(String, String)>,

    /// Report upstream failures as-is instead of normalizing them
    #[arg(long)]
    pub raw: bool,
}

/// Run the request command.
pub async fn run(args: RequestArgs, ctx: &Context) -> Result<()> {
    let request = build_request(args)?;
    let client = keyward_config::build_client(&ctx.settings)?;
    tracing::debug!(
        method = %request.method,
        url = %request.url,
        raw = request.raw,
        "sending request"
    );

    match client.request(request).await {
        Ok(response) => {
            if ctx.verbose {
                eprintln!("{} {}", response.status, response.status_text);
            }
            print_body(&response.data, ctx.json_output)
        }
        Err(e) => {
            let normalized = e.normalized();
            tracing::debug!(
                kind = ?normalized.kind,
                status = normalized.status,
                auth = e.auth_failure().is_some(),
                "request failed"
            );
            print_body(&normalized.data, ctx.json_output)?;
            Err(anyhow::Error::new(e).context(format!(
                "request failed with status {} {}",
                normalized.status, normalized.status_text
            )))
        }
    }
}

fn build_request(args: RequestArgs) -> Result<RequestConfig> {
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method '{}'", args.method))?;

    let mut request = RequestConfig::new(method, args.path);
    for (key, value) in args.query {
        request = request.with_query(key, value);
    }
    if let Some(data) = &args.data {
        let body: Value = serde_json::from_str(data).context("--data is not valid JSON")?;
        request = request.with_body(body);
    }
    if args.raw {
        request = request.raw();
    }
    Ok(request)
}

fn print_body(data: &Value, json_output: bool) -> Result<()> {
    match data {
        Value::Null => {}
        Value::String(text) if !json_output => println!("{}", text),
        _ if json_output => println!("{}", serde_json::to_string(data)?),
        _ => println!("{}", serde_json::to_string_pretty(data)?),
    }
    Ok(())
}

fn parse_query(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}
