//! Report units, one per facet.
//!
//! Each unit holds a sink handle plus the inputs of its facet, and writes a
//! single block from [`Report::run`](crate::report::Report::run). Host access
//! goes through [`FileSystem`], [`Environment`] and the probe traits so every
//! unit can be exercised against fixed inputs.

mod allocator;
mod calendar;
mod charset;
mod command_line;
mod connection;
mod container_info;
mod environment;
mod file_system;
mod library_path;
mod locale;
mod memory;
mod network_interface;
mod operating_system;
mod physical_system;
mod runtime;
mod security_providers;
mod ssl_context;
mod system_properties;
mod trust_store;
mod user;

pub use allocator::{AllocatorReport, AllocatorStats, NoAllocatorStats};
#[cfg(not(target_env = "msvc"))]
pub use allocator::JemallocStats;
pub use calendar::CalendarReport;
pub use charset::CharsetReport;
pub use command_line::CommandLineReport;
pub use connection::ConnectionReport;
pub use container_info::ContainerInfoReport;
pub use environment::EnvironmentReport;
pub use file_system::{DiskInfo, FileSystemReport};
pub use library_path::LibraryPathReport;
pub use locale::{LocaleName, LocaleReport};
pub use memory::MemoryReport;
pub use network_interface::NetworkInterfaceReport;
pub use operating_system::{OsInfo, OperatingSystemReport};
pub use physical_system::PhysicalSystemReport;
pub use runtime::{BuildInfo, RuntimeReport};
pub use security_providers::SecurityProvidersReport;
pub use ssl_context::SslContextReport;
pub use system_properties::SystemPropertiesReport;
pub use trust_store::TrustStoreReport;
pub use user::UserReport;

use std::path::Path;

use crate::collector::{FileSystem, ParseError};
use crate::report::io_marker;

/// Reads and parses one file, turning any fault into its inline marker.
pub(crate) fn read_with<T>(
    fs: &dyn FileSystem,
    path: &str,
    parse: impl FnOnce(&str) -> Result<T, ParseError>,
) -> Result<T, String> {
    let content = fs
        .read_to_string(Path::new(path))
        .map_err(|e| io_marker(&e))?;
    parse(&content).map_err(|e| format!("n/a ({})", e))
}

/// Names of the entries of a directory, sorted. Faults become markers.
pub(crate) fn dir_names(fs: &dyn FileSystem, path: &str) -> Result<Vec<String>, String> {
    let entries = fs.read_dir(Path::new(path)).map_err(|e| io_marker(&e))?;
    let mut names: Vec<String> = entries
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    Ok(names)
}
