//! Report unit contract and the facet catalogue.
//!
//! A report unit collects the facts of one facet and writes them as a single
//! INFO block. Units own only their constructor inputs and never let a
//! failure escape [`Report::run`]; faults become inline markers instead.

use std::io;

use serde::{Deserialize, Serialize};

/// One environment facet, in declared report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReportKind {
    Runtime,
    Memory,
    OperatingSystem,
    User,
    Locale,
    Charset,
    FileSystem,
    Calendar,
    NetworkInterface,
    SslContext,
    TrustStore,
    Connection,
    SystemProperties,
    Environment,
    CommandLine,
    LibraryPath,
    Allocator,
    PhysicalSystem,
    ContainerInfo,
    SecurityProviders,
}

impl ReportKind {
    /// Every facet, in declared order.
    pub const ALL: [ReportKind; 20] = [
        ReportKind::Runtime,
        ReportKind::Memory,
        ReportKind::OperatingSystem,
        ReportKind::User,
        ReportKind::Locale,
        ReportKind::Charset,
        ReportKind::FileSystem,
        ReportKind::Calendar,
        ReportKind::NetworkInterface,
        ReportKind::SslContext,
        ReportKind::TrustStore,
        ReportKind::Connection,
        ReportKind::SystemProperties,
        ReportKind::Environment,
        ReportKind::CommandLine,
        ReportKind::LibraryPath,
        ReportKind::Allocator,
        ReportKind::PhysicalSystem,
        ReportKind::ContainerInfo,
        ReportKind::SecurityProviders,
    ];

    /// Block title, without the trailing colon.
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Runtime => "Runtime",
            ReportKind::Memory => "Memory",
            ReportKind::OperatingSystem => "Operating System",
            ReportKind::User => "User",
            ReportKind::Locale => "Locale",
            ReportKind::Charset => "Charset",
            ReportKind::FileSystem => "File System",
            ReportKind::Calendar => "Calendar",
            ReportKind::NetworkInterface => "Network Interface",
            ReportKind::SslContext => "SSL Context",
            ReportKind::TrustStore => "Trust Store",
            ReportKind::Connection => "Database Connection",
            ReportKind::SystemProperties => "System Properties",
            ReportKind::Environment => "Environment Variables",
            ReportKind::CommandLine => "Command Line",
            ReportKind::LibraryPath => "Library Path",
            ReportKind::Allocator => "Allocator",
            ReportKind::PhysicalSystem => "Physical System",
            ReportKind::ContainerInfo => "Container Info",
            ReportKind::SecurityProviders => "Security Providers",
        }
    }

    /// URL path segment addressing this facet, e.g. `networkinterface`.
    pub fn path_segment(&self) -> &'static str {
        match self {
            ReportKind::Runtime => "runtime",
            ReportKind::Memory => "memory",
            ReportKind::OperatingSystem => "operatingsystem",
            ReportKind::User => "user",
            ReportKind::Locale => "locale",
            ReportKind::Charset => "charset",
            ReportKind::FileSystem => "filesystem",
            ReportKind::Calendar => "calendar",
            ReportKind::NetworkInterface => "networkinterface",
            ReportKind::SslContext => "sslcontext",
            ReportKind::TrustStore => "truststore",
            ReportKind::Connection => "connection",
            ReportKind::SystemProperties => "systemproperties",
            ReportKind::Environment => "environment",
            ReportKind::CommandLine => "commandline",
            ReportKind::LibraryPath => "librarypath",
            ReportKind::Allocator => "allocator",
            ReportKind::PhysicalSystem => "physicalsystem",
            ReportKind::ContainerInfo => "containerinfo",
            ReportKind::SecurityProviders => "securityproviders",
        }
    }

    /// Configuration key of the enablement flag, `None` for on-demand facets.
    pub fn config_key(&self) -> Option<&'static str> {
        Some(match self {
            ReportKind::Runtime => "RUNTIME_REPORT",
            ReportKind::Memory => "MEMORY_REPORT",
            ReportKind::OperatingSystem => "OPERATING_SYSTEM_REPORT",
            ReportKind::User => "USER_REPORT",
            ReportKind::Locale => "LOCALE_REPORT",
            ReportKind::Charset => "CHARSET_REPORT",
            ReportKind::FileSystem => "FILE_SYSTEM_REPORT",
            ReportKind::Calendar => "CALENDAR_REPORT",
            ReportKind::NetworkInterface => "NETWORK_INTERFACE_REPORT",
            ReportKind::SslContext => "SSL_CONTEXT_REPORT",
            ReportKind::TrustStore => "TRUST_STORE_REPORT",
            ReportKind::Connection => return None,
            ReportKind::SystemProperties => "SYSTEM_PROPERTIES_REPORT",
            ReportKind::Environment => "ENVIRONMENT_REPORT",
            ReportKind::CommandLine => "COMMAND_LINE_REPORT",
            ReportKind::LibraryPath => "LIBRARY_PATH_REPORT",
            ReportKind::Allocator => "ALLOCATOR_REPORT",
            ReportKind::PhysicalSystem => "PHYSICAL_SYSTEM_REPORT",
            ReportKind::ContainerInfo => "CONTAINER_INFO_REPORT",
            ReportKind::SecurityProviders => "SECURITY_PROVIDERS_REPORT",
        })
    }

    /// Resolves the last segment of a request path, case-insensitively.
    ///
    /// `"/Memory"`, `"memory"` and `"/reports/MEMORY/"` all resolve to
    /// [`ReportKind::Memory`]. Empty or unknown segments yield `None`.
    pub fn from_path_suffix(path: &str) -> Option<ReportKind> {
        let segment = path.trim_end_matches('/').rsplit('/').next()?;
        if segment.is_empty() {
            return None;
        }
        ReportKind::ALL
            .into_iter()
            .find(|k| k.path_segment().eq_ignore_ascii_case(segment))
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// A self-contained unit producing one facet's block.
pub trait Report: Send {
    fn kind(&self) -> ReportKind;

    /// Collects, formats and writes the block. Never panics on I/O faults.
    fn run(&self);
}

/// Inline marker for an I/O fault in place of the missing value.
pub fn io_marker(e: &io::Error) -> String {
    match e.kind() {
        io::ErrorKind::PermissionDenied => "access denied".to_string(),
        io::ErrorKind::NotFound => "Not available".to_string(),
        _ => format!("n/a ({})", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_suffix() {
        assert_eq!(ReportKind::from_path_suffix("/Memory"), Some(ReportKind::Memory));
        assert_eq!(
            ReportKind::from_path_suffix("/reports/NetworkInterface/"),
            Some(ReportKind::NetworkInterface)
        );
        assert_eq!(ReportKind::from_path_suffix("sslcontext"), Some(ReportKind::SslContext));
        assert_eq!(ReportKind::from_path_suffix("/unknown"), None);
        assert_eq!(ReportKind::from_path_suffix(""), None);
        assert_eq!(ReportKind::from_path_suffix("/"), None);
    }

    #[test]
    fn test_every_kind_resolves_from_its_segment() {
        for kind in ReportKind::ALL {
            let path = format!("/{}", kind.path_segment().to_uppercase());
            assert_eq!(ReportKind::from_path_suffix(&path), Some(kind));
        }
    }

    #[test]
    fn test_config_keys_unique() {
        let mut keys: Vec<_> = ReportKind::ALL.iter().filter_map(|k| k.config_key()).collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
        assert_eq!(ReportKind::Connection.config_key(), None);
    }

    #[test]
    fn test_io_marker() {
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert_eq!(io_marker(&denied), "access denied");
        let missing = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(io_marker(&missing), "Not available");
        let other = io::Error::other("boom");
        assert_eq!(io_marker(&other), "n/a (boom)");
    }
}
