//! User-Agent string shared by every request.
//!
//! Format: `<product>/<version> (<platform>)`, e.g. `restclient/0.1.0 (Unix)`.

use sysinfo::System;

/// Default product name (this crate).
pub(crate) const DEFAULT_PRODUCT: &str = env!("CARGO_PKG_NAME");

/// Default product version (this crate).
pub(crate) const DEFAULT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Builds the User-Agent for `product`/`version` on the current platform.
#[must_use]
pub(crate) fn user_agent(product: &str, version: &str) -> String {
    format!("{product}/{version} ({})", platform_descriptor())
}

/// Short OS descriptor for the User-Agent comment.
#[must_use]
pub(crate) fn platform_descriptor() -> String {
    describe_platform(std::env::consts::OS, System::os_version().as_deref())
}

fn describe_platform(os: &str, version: Option<&str>) -> String {
    let version = version.map(str::trim).filter(|v| !v.is_empty());
    match (os, version) {
        ("windows", Some(version)) => format!("Windows NT {version}"),
        ("windows", None) => "Windows NT".to_string(),
        ("macos", Some(version)) => format!("macOS {version}"),
        ("macos", None) => "macOS".to_string(),
        _ => "Unix".to_string(),
    }
}
