//! Interface state readers behind the probes.

use std::fmt;
use std::fs;
use std::net::IpAddr;
use std::path::PathBuf;

use sysinfo::Networks;
use tracing::debug;

/// Default location of per-interface link state on Linux.
const SYSFS_NET_ROOT: &str = "/sys/class/net";

/// An address assigned to a named interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddress {
    /// Interface name, e.g. `eth0`.
    pub interface: String,
    /// Assigned address.
    pub address: IpAddr,
}

/// Operational state of a named interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkState {
    /// Interface name.
    pub name: String,
    /// Link reports `up`.
    pub up: bool,
}

/// Supplies interface addresses.
pub trait AddressSource: Send + Sync + fmt::Debug {
    /// Current addresses, or `None` when the platform offers no table.
    fn addresses(&self) -> Option<Vec<InterfaceAddress>>;

    /// Whether this source yields anything to reason about.
    fn is_available(&self) -> bool {
        self.addresses().is_some_and(|addresses| !addresses.is_empty())
    }
}

/// Supplies interface link states.
pub trait LinkSource: Send + Sync + fmt::Debug {
    /// Current link states, or `None` when the platform offers none.
    fn links(&self) -> Option<Vec<LinkState>>;

    /// Whether this source can be read at all.
    fn is_available(&self) -> bool {
        self.links().is_some()
    }
}

/// The host's interface table, via `sysinfo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAddresses;

impl AddressSource for SystemAddresses {
    fn addresses(&self) -> Option<Vec<InterfaceAddress>> {
        let networks = Networks::new_with_refreshed_list();
        let addresses: Vec<InterfaceAddress> = networks
            .list()
            .iter()
            .flat_map(|(name, data)| {
                data.ip_networks().iter().map(move |network| InterfaceAddress {
                    interface: name.clone(),
                    address: network.addr,
                })
            })
            .collect();
        Some(addresses)
    }
}

/// Link states read from `operstate` files under a sysfs root.
#[derive(Debug, Clone)]
pub struct SysfsLinks {
    root: PathBuf,
}

impl SysfsLinks {
    /// Reads from `root` instead of `/sys/class/net`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for SysfsLinks {
    fn default() -> Self {
        Self::with_root(SYSFS_NET_ROOT)
    }
}

impl LinkSource for SysfsLinks {
    fn links(&self) -> Option<Vec<LinkState>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(error) => {
                debug!(root = %self.root.display(), error = %error, "link states unavailable");
                return None;
            }
        };
        let links = entries
            .filter_map(Result::ok)
            .map(|entry| {
                let up = fs::read_to_string(entry.path().join("operstate"))
                    .is_ok_and(|state| state.trim() == "up");
                LinkState {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    up,
                }
            })
            .collect();
        Some(links)
    }
}
