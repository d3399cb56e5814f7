//! CLI entry point for the restclient tool.

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use restclient_core::{BodyData, ClientConfig, HttpClient, JsonData, UrlEncodedData, select_probe};
use serde_json::Value;
use tracing::{debug, info};

mod cli;

use cli::{Args, Command};

/// Exit status reported by `reachable` when the host is offline.
const EXIT_OFFLINE: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr; stdout carries command output only.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Args carries the token; log the command alone.
    debug!(command = ?args.command, "CLI arguments parsed");

    match &args.command {
        Command::Reachable { assume_offline } => {
            let probe = select_probe(!assume_offline);
            let online = probe.is_reachable();
            debug!(probe = probe.name(), online, "reachability checked");
            println!("{}", if online { "online" } else { "offline" });
            Ok(if online {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_OFFLINE)
            })
        }
        Command::Get { path, headers } => {
            let client = build_client(&args)?;
            let document = client
                .get(path, &header_refs(headers))
                .await
                .with_context(|| format!("GET {path} failed"))?;
            print_document(&document)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Post {
            path,
            form,
            json,
            headers,
        } => {
            let client = build_client(&args)?;
            let body = post_body(form, json.as_deref())?;
            let document = client
                .post(path, body.as_ref(), &header_refs(headers))
                .await
                .with_context(|| format!("POST {path} failed"))?;
            print_document(&document)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Download {
            path,
            dest,
            headers,
        } => {
            let client = build_client(&args)?;
            let file = client
                .download(path, &header_refs(headers), dest)
                .await
                .with_context(|| format!("download of {path} failed"))?;
            info!(
                filename = %file.filename(),
                bytes = file.bytes_written(),
                "saved"
            );
            println!("{}", file.path().display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_client(args: &Args) -> Result<HttpClient> {
    let Some(prefix) = args.prefix.as_deref() else {
        bail!("--prefix is required for this command");
    };
    let mut config = ClientConfig::new(prefix)
        .with_ui_language(&args.lang)
        .with_timeouts(args.connect_timeout, args.read_timeout);
    if let Some(auth) = &args.auth {
        config = config.with_authorization(auth);
    }
    if let Some(proxy) = &args.proxy {
        config = config.with_proxy(proxy);
    }
    HttpClient::new(config).context("failed to create HTTP client")
}

fn post_body(form: &[(String, String)], json: Option<&str>) -> Result<Box<dyn BodyData>> {
    if let Some(text) = json {
        let document: Value = serde_json::from_str(text).context("--json is not valid JSON")?;
        return Ok(Box::new(JsonData::new(&document)));
    }
    let mut data = UrlEncodedData::new();
    for (key, value) in form {
        data.add_value(key, value);
    }
    Ok(Box::new(data))
}

fn header_refs(headers: &[(String, String)]) -> Vec<(&str, &str)> {
    headers
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect()
}

fn print_document(document: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(document)?);
    Ok(())
}
