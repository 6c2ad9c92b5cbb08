use std::sync::Arc;

use sysinfo::System;

use crate::report::{Report, ReportKind};
use crate::sink::{InfoWriter, LogSink};

/// Operating system facts. Absent values render as `n/a`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OsInfo {
    pub name: Option<String>,
    pub long_version: Option<String>,
    pub version: Option<String>,
    pub kernel: Option<String>,
    pub distribution: String,
    pub arch: String,
    pub family: String,
    pub cpu_count: Option<usize>,
}

impl OsInfo {
    /// Collects facts about the running host.
    pub fn collect() -> Self {
        Self {
            name: System::name(),
            long_version: System::long_os_version(),
            version: System::os_version(),
            kernel: System::kernel_version(),
            distribution: System::distribution_id(),
            arch: std::env::consts::ARCH.to_string(),
            family: std::env::consts::FAMILY.to_string(),
            cpu_count: std::thread::available_parallelism().ok().map(|n| n.get()),
        }
    }
}

pub struct OperatingSystemReport {
    sink: Arc<dyn LogSink>,
    info: OsInfo,
}

impl OperatingSystemReport {
    pub fn new(sink: Arc<dyn LogSink>, info: OsInfo) -> Self {
        Self { sink, info }
    }
}

fn or_na(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("n/a")
}

impl Report for OperatingSystemReport {
    fn kind(&self) -> ReportKind {
        ReportKind::OperatingSystem
    }

    fn run(&self) {
        let Some(mut w) = InfoWriter::open(&self.sink) else {
            return;
        };
        let info = &self.info;
        w.title(self.kind().title());
        w.entry("name", or_na(&info.name));
        w.entry("version", or_na(&info.version));
        w.entry("long version", or_na(&info.long_version));
        w.entry("kernel", or_na(&info.kernel));
        w.entry("distribution", &info.distribution);
        w.entry("architecture", &info.arch);
        w.entry("family", &info.family);
        match info.cpu_count {
            Some(n) => w.entry("available processors", n),
            None => w.entry("available processors", "n/a"),
        }
    }
}
