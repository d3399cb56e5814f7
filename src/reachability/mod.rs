//! Host network reachability.
//!
//! Answers "is outbound Internet connectivity available right now?" from
//! local interface state only; no probe performs network I/O. Three variants
//! exist behind [`ReachabilityProbe`], and [`select_probe`] picks the first
//! one the host supports when a client is created:
//!
//! 1. [`ConnectivityProbe`]: a non-loopback interface holds a globally
//!    routable IPv4 or IPv6 address.
//! 2. [`InterfaceProbe`]: a non-loopback interface reports its link as up.
//! 3. [`FixedProbe`]: a configured answer for hosts with neither API.

mod sources;

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tracing::{debug, trace};

pub use sources::{
    AddressSource, InterfaceAddress, LinkSource, LinkState, SysfsLinks, SystemAddresses,
};

/// Loopback interface names skipped by every probe.
const LOOPBACK_NAMES: &[&str] = &["lo", "lo0"];

/// Reports whether outbound connectivity is currently available.
pub trait ReachabilityProbe: Send + Sync + fmt::Debug {
    /// Current answer. Must not block on the network.
    fn is_reachable(&self) -> bool;

    /// Short variant name, for logs.
    fn name(&self) -> &'static str;
}

/// Per-family Internet connectivity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Connectivity {
    /// A global IPv4 address is configured.
    pub ipv4: bool,
    /// A global IPv6 address is configured.
    pub ipv6: bool,
}

impl Connectivity {
    /// True when either family has connectivity.
    #[must_use]
    pub fn any(self) -> bool {
        self.ipv4 || self.ipv6
    }
}

/// Internet-level probe over interface addresses.
#[derive(Debug)]
pub struct ConnectivityProbe<S = SystemAddresses> {
    source: S,
}

impl ConnectivityProbe<SystemAddresses> {
    /// Probe over the host's interface table.
    #[must_use]
    pub fn system() -> Self {
        Self::new(SystemAddresses)
    }
}

impl<S: AddressSource> ConnectivityProbe<S> {
    /// Probe over a custom address source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Per-family connectivity from the current interface addresses.
    #[must_use]
    pub fn connectivity(&self) -> Connectivity {
        let mut connectivity = Connectivity::default();
        for entry in self.source.addresses().unwrap_or_default() {
            if is_loopback_name(&entry.interface) {
                continue;
            }
            match entry.address {
                IpAddr::V4(v4) if is_global_v4(v4) => connectivity.ipv4 = true,
                IpAddr::V6(v6) if is_global_v6(v6) => connectivity.ipv6 = true,
                _ => {}
            }
        }
        connectivity
    }
}

impl<S: AddressSource> ReachabilityProbe for ConnectivityProbe<S> {
    fn is_reachable(&self) -> bool {
        let connectivity = self.connectivity();
        trace!(ipv4 = connectivity.ipv4, ipv6 = connectivity.ipv6, "connectivity probed");
        connectivity.any()
    }

    fn name(&self) -> &'static str {
        "connectivity"
    }
}

/// Link-state probe: any non-loopback interface is up.
#[derive(Debug)]
pub struct InterfaceProbe<S = SysfsLinks> {
    source: S,
}

impl InterfaceProbe<SysfsLinks> {
    /// Probe over `/sys/class/net`.
    #[must_use]
    pub fn system() -> Self {
        Self::new(SysfsLinks::default())
    }
}

impl<S: LinkSource> InterfaceProbe<S> {
    /// Probe over a custom link source.
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: LinkSource> ReachabilityProbe for InterfaceProbe<S> {
    fn is_reachable(&self) -> bool {
        self.source
            .links()
            .unwrap_or_default()
            .iter()
            .any(|link| link.up && !is_loopback_name(&link.name))
    }

    fn name(&self) -> &'static str {
        "interface"
    }
}

/// Constant answer for hosts without a usable API.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub bool);

impl ReachabilityProbe for FixedProbe {
    fn is_reachable(&self) -> bool {
        self.0
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Picks the most precise probe the host supports.
///
/// `default_reachable` is the answer when neither the address table nor link
/// states can be read.
#[must_use]
pub fn select_probe(default_reachable: bool) -> Box<dyn ReachabilityProbe> {
    select_from(SystemAddresses, SysfsLinks::default(), default_reachable)
}

fn select_from<A, L>(addresses: A, links: L, default_reachable: bool) -> Box<dyn ReachabilityProbe>
where
    A: AddressSource + 'static,
    L: LinkSource + 'static,
{
    let probe: Box<dyn ReachabilityProbe> = if addresses.is_available() {
        Box::new(ConnectivityProbe::new(addresses))
    } else if links.is_available() {
        Box::new(InterfaceProbe::new(links))
    } else {
        Box::new(FixedProbe(default_reachable))
    };
    debug!(probe = probe.name(), "reachability probe selected");
    probe
}

fn is_loopback_name(name: &str) -> bool {
    LOOPBACK_NAMES.contains(&name)
}

/// Private ranges count: NAT still reaches the Internet.
fn is_global_v4(address: Ipv4Addr) -> bool {
    !(address.is_loopback()
        || address.is_unspecified()
        || address.is_link_local()
        || address.is_broadcast()
        || address.is_documentation()
        || address.is_multicast())
}

/// Global unicast is `2000::/3`.
fn is_global_v6(address: Ipv6Addr) -> bool {
    (address.segments()[0] & 0xe000) == 0x2000
}
