//! Network interface enumeration and address probing.
//!
//! Interface properties come from `/sys/class/net/<name>/*`; bound addresses
//! come from `sysinfo`. Host names and reachability go through the
//! [`AddressProbe`] trait so reports can be tested without a network.

use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, SocketAddr, TcpStream};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::collector::traits::FileSystem;

/// Directory listing one entry per network interface.
pub const SYS_CLASS_NET: &str = "/sys/class/net";

/// Upper bound for a single reachability probe.
pub const REACHABILITY_TIMEOUT: Duration = Duration::from_millis(5000);

// Bits of `/sys/class/net/<name>/flags` (see `if.h`).
const IFF_UP: u32 = 0x1;
const IFF_LOOPBACK: u32 = 0x8;
const IFF_POINTOPOINT: u32 = 0x10;
const IFF_MULTICAST: u32 = 0x1000;

/// Error raised when the interface list cannot be obtained at all.
#[derive(Debug)]
pub struct CollectError {
    pub message: String,
    pub source: Option<io::Error>,
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Boolean interface properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterfaceFlags {
    pub loopback: bool,
    pub point_to_point: bool,
    pub up: bool,
    pub is_virtual: bool,
    pub multicast: bool,
}

impl InterfaceFlags {
    /// Decodes the kernel flag word.
    pub fn from_bits(bits: u32, is_virtual: bool) -> Self {
        Self {
            loopback: bits & IFF_LOOPBACK != 0,
            point_to_point: bits & IFF_POINTOPOINT != 0,
            up: bits & IFF_UP != 0,
            is_virtual,
            multicast: bits & IFF_MULTICAST != 0,
        }
    }

    /// Labels of the flags that are set, in fixed order.
    pub fn labels(&self) -> Vec<&'static str> {
        [
            (self.loopback, "loopback"),
            (self.point_to_point, "point-to-point"),
            (self.up, "up"),
            (self.is_virtual, "virtual"),
            (self.multicast, "multicast"),
        ]
        .into_iter()
        .filter(|(set, _)| *set)
        .map(|(_, label)| label)
        .collect()
    }
}

/// An address bound to an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceAddress {
    pub addr: IpAddr,
    pub prefix: u8,
}

/// One network interface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkInterface {
    pub name: String,
    pub index: Option<u32>,
    pub mtu: Option<u32>,
    pub flags: InterfaceFlags,
    /// `None` when the interface has no hardware address (or an all-zero one).
    pub hardware_address: Option<Vec<u8>>,
    pub addresses: Vec<InterfaceAddress>,
}

/// Parses `aa:bb:cc:dd:ee:ff`. All-zero addresses count as absent.
pub fn parse_hardware_address(s: &str) -> Option<Vec<u8>> {
    let bytes: Vec<u8> = s
        .trim()
        .split(':')
        .map(|part| u8::from_str_radix(part, 16))
        .collect::<Result<_, _>>()
        .ok()?;
    if bytes.is_empty() || bytes.iter().all(|b| *b == 0) {
        None
    } else {
        Some(bytes)
    }
}

fn parse_flags(s: &str) -> Option<u32> {
    let s = s.trim();
    u32::from_str_radix(s.strip_prefix("0x").unwrap_or(s), 16).ok()
}

/// Lists interfaces, sorted by index then name.
///
/// `addresses` maps interface names to their bound addresses; interfaces
/// without an entry get none. Failure to list the directory is an error;
/// failure to read one property only leaves that property empty.
pub fn enumerate_interfaces(
    fs: &dyn FileSystem,
    addresses: &HashMap<String, Vec<InterfaceAddress>>,
) -> Result<Vec<NetworkInterface>, CollectError> {
    let root = Path::new(SYS_CLASS_NET);
    let entries = fs.read_dir(root).map_err(|e| CollectError {
        message: format!("cannot list network interfaces in {}", SYS_CLASS_NET),
        source: Some(e),
    })?;

    let mut interfaces: Vec<NetworkInterface> = entries
        .iter()
        .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .map(|name| {
            let dir = root.join(&name);
            let read = |file: &str| fs.read_to_string(&dir.join(file)).ok();
            let is_virtual = fs.exists(&Path::new("/sys/devices/virtual/net").join(&name));
            NetworkInterface {
                index: read("ifindex").and_then(|s| s.trim().parse().ok()),
                mtu: read("mtu").and_then(|s| s.trim().parse().ok()),
                flags: read("flags")
                    .and_then(|s| parse_flags(&s))
                    .map(|bits| InterfaceFlags::from_bits(bits, is_virtual))
                    .unwrap_or(InterfaceFlags {
                        is_virtual,
                        ..Default::default()
                    }),
                hardware_address: read("address").and_then(|s| parse_hardware_address(&s)),
                addresses: addresses.get(&name).cloned().unwrap_or_default(),
                name,
            }
        })
        .collect();

    interfaces.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.name.cmp(&b.name)));
    Ok(interfaces)
}

/// Addresses bound to each interface, as seen by `sysinfo`.
pub fn system_addresses() -> HashMap<String, Vec<InterfaceAddress>> {
    let networks = sysinfo::Networks::new_with_refreshed_list();
    networks
        .list()
        .iter()
        .map(|(name, data)| {
            let addrs = data
                .ip_networks()
                .iter()
                .map(|net| InterfaceAddress {
                    addr: net.addr,
                    prefix: net.prefix,
                })
                .collect();
            (name.clone(), addrs)
        })
        .collect()
}

/// Name resolution and reachability checks for one address.
pub trait AddressProbe: Send + Sync {
    /// Host name for the address; falls back to the textual address.
    fn host_name(&self, addr: IpAddr) -> io::Result<String>;

    /// Fully qualified name for the address; falls back to the textual address.
    fn canonical_host_name(&self, addr: IpAddr) -> io::Result<String>;

    /// Whether the address answers within `timeout`.
    fn is_reachable(&self, addr: IpAddr, timeout: Duration) -> io::Result<bool>;
}

/// Probe backed by `/etc/hosts` and a TCP echo-port connect.
pub struct SystemProbe {
    fs: Arc<dyn FileSystem>,
}

impl SystemProbe {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    fn hosts_names(&self, addr: IpAddr) -> io::Result<Vec<String>> {
        let content = match self.fs.read_to_string(Path::new("/etc/hosts")) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        Ok(parse_hosts(&content, addr))
    }
}

/// Names listed for `addr` in `/etc/hosts` content, canonical name first.
pub fn parse_hosts(content: &str, addr: IpAddr) -> Vec<String> {
    for line in content.lines() {
        let line = line.split('#').next().unwrap_or("");
        let mut parts = line.split_whitespace();
        let Some(ip) = parts.next() else {
            continue;
        };
        if ip.parse::<IpAddr>().ok() == Some(addr) {
            return parts.map(str::to_string).collect();
        }
    }
    Vec::new()
}

impl AddressProbe for SystemProbe {
    fn host_name(&self, addr: IpAddr) -> io::Result<String> {
        let names = self.hosts_names(addr)?;
        // Prefer a short alias, like a resolver answering for the local domain.
        Ok(names
            .iter()
            .find(|n| !n.contains('.'))
            .or_else(|| names.first())
            .cloned()
            .unwrap_or_else(|| addr.to_string()))
    }

    fn canonical_host_name(&self, addr: IpAddr) -> io::Result<String> {
        Ok(self
            .hosts_names(addr)?
            .into_iter()
            .next()
            .unwrap_or_else(|| addr.to_string()))
    }

    fn is_reachable(&self, addr: IpAddr, timeout: Duration) -> io::Result<bool> {
        // A refused connection still proves the host is up.
        match TcpStream::connect_timeout(&SocketAddr::new(addr, 7), timeout) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(false),
            Err(e) => Err(e),
        }
    }
}
