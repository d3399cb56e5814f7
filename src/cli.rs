//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use restclient_core::client::{CONNECT_TIMEOUT_SECS, DEFAULT_UI_LANGUAGE, READ_TIMEOUT_SECS};

/// Talk to a JSON REST API from the command line.
///
/// Requests carry the standard client headers, gzip responses are inflated,
/// and failures are reported with the server's own error message.
#[derive(Parser, Debug)]
#[command(name = "restclient")]
#[command(author, version, about)]
#[command(subcommand_required = true, arg_required_else_help = true)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// URL prefix request paths are resolved against
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    /// Authorization header value, e.g. "Bearer <token>"
    #[arg(long, global = true)]
    pub auth: Option<String>,

    /// UI language sent as Accept-Language
    #[arg(long, default_value = DEFAULT_UI_LANGUAGE, global = true)]
    pub lang: String,

    /// Proxy URL for all traffic (overrides https_proxy/http_proxy)
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    /// Connect timeout in seconds
    #[arg(long, default_value_t = CONNECT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600), global = true)]
    pub connect_timeout: u64,

    /// Total request timeout in seconds
    #[arg(long, default_value_t = READ_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=86400), global = true)]
    pub read_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations exposed by the CLI.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// GET a path and print the JSON response
    Get {
        /// Path relative to the prefix
        path: String,

        /// Extra request header as "Name: value" (repeatable)
        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
    },

    /// POST a form or JSON document and print the JSON response
    Post {
        /// Path relative to the prefix
        path: String,

        /// Form field as key=value (repeatable)
        #[arg(long = "form", value_parser = parse_form_field, conflicts_with = "json")]
        form: Vec<(String, String)>,

        /// JSON document to send as the body
        #[arg(long)]
        json: Option<String>,

        /// Extra request header as "Name: value" (repeatable)
        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
    },

    /// Download a path to a file or directory and print the saved path
    Download {
        /// Path relative to the prefix
        path: String,

        /// Destination file, or an existing directory to save into
        dest: PathBuf,

        /// Extra request header as "Name: value" (repeatable)
        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
    },

    /// Report whether the host is online (exit 0) or offline (exit 2)
    Reachable {
        /// Report offline when the host offers no way to tell
        #[arg(long)]
        assume_offline: bool,
    },
}

/// Parses `Name: value` into a header pair.
fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected \"Name: value\", got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header name is empty in {raw:?}"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Parses `key=value` into a form field.
fn parse_form_field(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    if key.is_empty() {
        return Err(format!("form key is empty in {raw:?}"));
    }
    Ok((key.to_string(), value.to_string()))
}
