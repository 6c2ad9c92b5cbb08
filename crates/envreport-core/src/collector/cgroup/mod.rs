//! Cgroup limit reader.
//!
//! Reads the memory, CPU and PIDs limits that apply to the current process
//! from cgroup v2 (unified) or v1 (per-controller) hierarchies.

pub mod parser;

use std::io;
use std::path::{Path, PathBuf};

use crate::collector::procfs::ParseError;
use crate::collector::traits::FileSystem;

pub use parser::{CpuQuota, LimitValue};

/// Default mount point of the cgroup filesystem.
pub const DEFAULT_CGROUP_ROOT: &str = "/sys/fs/cgroup";

/// Cgroup hierarchy layout detected under the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CgroupVersion {
    V1,
    V2,
}

impl std::fmt::Display for CgroupVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CgroupVersion::V1 => write!(f, "v1"),
            CgroupVersion::V2 => write!(f, "v2"),
        }
    }
}

/// Outcome of reading one cgroup value.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading<T> {
    /// The file does not exist.
    NotAvailable,
    /// The file exists and reports no limit.
    NoLimit,
    Value(T),
    /// The file exists but could not be read or parsed.
    Error(String),
}

/// Limits that apply to the current process.
#[derive(Debug, Clone)]
pub struct CgroupLimits {
    pub version: Option<CgroupVersion>,
    pub controllers: Vec<String>,
    pub memory_limit: Reading<u64>,
    pub memory_usage: Reading<u64>,
    pub cpu: Reading<CpuQuota>,
    pub pids_limit: Reading<u64>,
}

/// Reader for cgroup limit files.
pub struct CgroupReader<'a> {
    fs: &'a dyn FileSystem,
    root: PathBuf,
}

impl<'a> CgroupReader<'a> {
    /// Creates a reader rooted at `root` (usually [`DEFAULT_CGROUP_ROOT`]).
    pub fn new(fs: &'a dyn FileSystem, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
        }
    }

    /// Detects the hierarchy layout.
    pub fn version(&self) -> Option<CgroupVersion> {
        if self.fs.exists(&self.root.join("cgroup.controllers")) {
            Some(CgroupVersion::V2)
        } else if self.fs.exists(&self.root.join("memory")) || self.fs.exists(&self.root.join("cpu"))
        {
            Some(CgroupVersion::V1)
        } else {
            None
        }
    }

    /// Reads all limits. Never fails; each value carries its own outcome.
    pub fn read_limits(&self) -> CgroupLimits {
        match self.version() {
            Some(CgroupVersion::V2) => CgroupLimits {
                version: Some(CgroupVersion::V2),
                controllers: self
                    .read("cgroup.controllers")
                    .map(|c| parser::parse_controllers(&c))
                    .unwrap_or_default(),
                memory_limit: self.limit("memory.max", parser::parse_memory_limit),
                memory_usage: self.value("memory.current", parser::parse_number),
                cpu: self.cpu_v2(),
                pids_limit: self.limit("pids.max", parser::parse_pids_max),
            },
            Some(CgroupVersion::V1) => CgroupLimits {
                version: Some(CgroupVersion::V1),
                controllers: self.v1_controllers(),
                memory_limit: self.limit("memory/memory.limit_in_bytes", parser::parse_memory_limit),
                memory_usage: self.value("memory/memory.usage_in_bytes", parser::parse_number),
                cpu: self.cpu_v1(),
                pids_limit: self.limit("pids/pids.max", parser::parse_pids_max),
            },
            None => CgroupLimits {
                version: None,
                controllers: Vec::new(),
                memory_limit: Reading::NotAvailable,
                memory_usage: Reading::NotAvailable,
                cpu: Reading::NotAvailable,
                pids_limit: Reading::NotAvailable,
            },
        }
    }

    fn read(&self, relative: &str) -> io::Result<String> {
        self.fs.read_to_string(&self.root.join(relative))
    }

    fn value<T>(&self, relative: &str, parse: fn(&str) -> Result<T, ParseError>) -> Reading<T> {
        match self.read(relative) {
            Ok(content) => match parse(&content) {
                Ok(v) => Reading::Value(v),
                Err(e) => Reading::Error(e.message),
            },
            Err(e) => io_reading(e),
        }
    }

    fn limit(
        &self,
        relative: &str,
        parse: fn(&str) -> Result<LimitValue, ParseError>,
    ) -> Reading<u64> {
        match self.value(relative, parse) {
            Reading::Value(LimitValue::Limited(v)) => Reading::Value(v),
            Reading::Value(LimitValue::Unlimited) => Reading::NoLimit,
            Reading::NotAvailable => Reading::NotAvailable,
            Reading::NoLimit => Reading::NoLimit,
            Reading::Error(e) => Reading::Error(e),
        }
    }

    fn cpu_v2(&self) -> Reading<CpuQuota> {
        match self.value("cpu.max", parser::parse_cpu_max) {
            Reading::Value(CpuQuota { quota: None, .. }) => Reading::NoLimit,
            other => other,
        }
    }

    fn cpu_v1(&self) -> Reading<CpuQuota> {
        let quota = match self.value("cpu/cpu.cfs_quota_us", parser::parse_cfs_quota) {
            Reading::Value(Some(q)) => q,
            Reading::Value(None) => return Reading::NoLimit,
            Reading::NotAvailable => return Reading::NotAvailable,
            Reading::NoLimit => return Reading::NoLimit,
            Reading::Error(e) => return Reading::Error(e),
        };
        match self.value("cpu/cpu.cfs_period_us", parser::parse_number) {
            Reading::Value(period) => Reading::Value(CpuQuota {
                quota: Some(quota),
                period,
            }),
            Reading::NotAvailable => Reading::NotAvailable,
            Reading::NoLimit => Reading::NoLimit,
            Reading::Error(e) => Reading::Error(e),
        }
    }

    fn v1_controllers(&self) -> Vec<String> {
        let mut controllers: Vec<String> = self
            .fs
            .read_dir(&self.root)
            .unwrap_or_default()
            .iter()
            .filter(|p| self.fs.is_dir(p))
            .filter_map(|p| file_name(p))
            .collect();
        controllers.sort();
        controllers
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

fn io_reading<T>(e: io::Error) -> Reading<T> {
    match e.kind() {
        io::ErrorKind::NotFound => Reading::NotAvailable,
        _ => Reading::Error(e.to_string()),
    }
}
