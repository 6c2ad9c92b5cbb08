use std::sync::Arc;

use crate::collector::FileSystem;
use crate::collector::procfs::{Limit, parse_limits, parse_proc_status};
use crate::fmt;
use crate::report::{Report, ReportKind};
use crate::reports::read_with;
use crate::sink::{InfoWriter, LogSink};

/// `/proc/self/limits` rows shown, with their labels.
const LIMITS: [(&str, &str); 4] = [
    ("max address space", "Max address space"),
    ("max data size", "Max data size"),
    ("max resident set", "Max resident set"),
    ("max stack size", "Max stack size"),
];

/// Process memory usage and the limits that bound it.
pub struct MemoryReport {
    sink: Arc<dyn LogSink>,
    fs: Arc<dyn FileSystem>,
}

impl MemoryReport {
    pub fn new(sink: Arc<dyn LogSink>, fs: Arc<dyn FileSystem>) -> Self {
        Self { sink, fs }
    }
}

fn limit_value(limit: Option<&Limit>) -> String {
    match limit {
        Some(Limit { soft: None, .. }) => fmt::bytes(fmt::NO_LIMIT),
        Some(Limit { soft: Some(v), .. }) => fmt::bytes_u64(*v),
        None => "n/a".to_string(),
    }
}

impl Report for MemoryReport {
    fn kind(&self) -> ReportKind {
        ReportKind::Memory
    }

    fn run(&self) {
        let Some(mut w) = InfoWriter::open(&self.sink) else {
            return;
        };
        w.title(self.kind().title());

        match read_with(self.fs.as_ref(), "/proc/self/status", parse_proc_status) {
            Ok(status) => {
                w.entry("resident", fmt::kib(status.vm_rss));
                w.entry("peak resident", fmt::kib(status.vm_hwm));
                w.entry("virtual", fmt::kib(status.vm_size));
                w.entry("peak virtual", fmt::kib(status.vm_peak));
                w.entry("data", fmt::kib(status.vm_data));
                w.entry("swap", fmt::kib(status.vm_swap));
            }
            Err(marker) => w.entry("usage", marker),
        }

        match read_with(self.fs.as_ref(), "/proc/self/limits", parse_limits) {
            Ok(limits) => {
                for (label, name) in LIMITS {
                    w.entry(label, limit_value(limits.get(name)));
                }
            }
            Err(marker) => w.entry("limits", marker),
        }
    }
}
