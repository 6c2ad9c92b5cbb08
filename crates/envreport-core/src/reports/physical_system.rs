use std::sync::Arc;

use crate::collector::FileSystem;
use crate::collector::procfs::{parse_global_stat, parse_loadavg, parse_meminfo};
use crate::fmt;
use crate::report::{Report, ReportKind};
use crate::reports::read_with;
use crate::sink::{InfoWriter, LogSink};

/// Host-wide memory, CPU and load figures.
pub struct PhysicalSystemReport {
    sink: Arc<dyn LogSink>,
    fs: Arc<dyn FileSystem>,
}

impl PhysicalSystemReport {
    pub fn new(sink: Arc<dyn LogSink>, fs: Arc<dyn FileSystem>) -> Self {
        Self { sink, fs }
    }
}

impl Report for PhysicalSystemReport {
    fn kind(&self) -> ReportKind {
        ReportKind::PhysicalSystem
    }

    fn run(&self) {
        let Some(mut w) = InfoWriter::open(&self.sink) else {
            return;
        };
        w.title(self.kind().title());
        let fs = self.fs.as_ref();

        match read_with(fs, "/proc/meminfo", parse_meminfo) {
            Ok(mem) => {
                w.entry("total memory", fmt::kib(mem.mem_total));
                w.entry("free memory", fmt::kib(mem.mem_free));
                w.entry("available memory", fmt::kib(mem.mem_available));
                w.entry("total swap", fmt::kib(mem.swap_total));
                w.entry("free swap", fmt::kib(mem.swap_free));
            }
            Err(marker) => w.entry("memory", marker),
        }

        match read_with(fs, "/proc/stat", parse_global_stat) {
            Ok(stat) => {
                w.entry("cpu count", stat.cpu_count);
                w.entry("boot time", fmt::epoch_utc(stat.btime as i64));
                w.entry("processes created", stat.processes);
            }
            Err(marker) => w.entry("cpu", marker),
        }

        match read_with(fs, "/proc/loadavg", parse_loadavg) {
            Ok(load) => {
                w.entry(
                    "load average",
                    format!("{:.2}, {:.2}, {:.2}", load.load1, load.load5, load.load15),
                );
                w.entry("tasks", format!("{} running, {} total", load.running, load.total));
            }
            Err(marker) => w.entry("load average", marker),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;
    use crate::reports::testing::{capture, output};

    const MEMINFO: &str = "\
MemTotal:       16384000 kB
MemFree:         2048000 kB
MemAvailable:    8192000 kB
Buffers:          100000 kB
Cached:          4000000 kB
SwapTotal:       2097152 kB
SwapFree:        2097152 kB
";

    const STAT: &str = "\
cpu  100 0 50 1000 0 0 0 0 0 0
cpu0 50 0 25 500 0 0 0 0 0 0
cpu1 50 0 25 500 0 0 0 0 0 0
ctxt 12345
btime 1700000000
processes 4242
procs_running 2
";

    #[test]
    fn test_physical_system_report() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/meminfo", MEMINFO);
        fs.add_file("/proc/stat", STAT);
        fs.add_file("/proc/loadavg", "0.50 0.25 0.10 2/311 4242\n");
        let (sink, dyn_sink) = capture();
        let report = PhysicalSystemReport::new(dyn_sink, Arc::new(fs));

        assert_eq!(
            output(&sink, &report),
            "Physical System:\n\
             \x20 - total memory: 15.6GB\n\
             \x20 - free memory: 2.0GB\n\
             \x20 - available memory: 7.8GB\n\
             \x20 - total swap: 2.0GB\n\
             \x20 - free swap: 2.0GB\n\
             \x20 - cpu count: 2\n\
             \x20 - boot time: 2023-11-14 22:13:20 UTC\n\
             \x20 - processes created: 4242\n\
             \x20 - load average: 0.50, 0.25, 0.10\n\
             \x20 - tasks: 2 running, 311 total"
        );
    }

    #[test]
    fn test_faults_are_inline() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/meminfo", "garbage\n");
        fs.add_file("/proc/stat", STAT);
        fs.deny("/proc/stat");
        let (sink, dyn_sink) = capture();
        let text = output(&sink, &PhysicalSystemReport::new(dyn_sink, Arc::new(fs)));

        assert_eq!(
            text,
            "Physical System:\n\
             \x20 - memory: n/a (Parse error: missing MemTotal in meminfo)\n\
             \x20 - cpu: access denied\n\
             \x20 - load average: Not available"
        );
    }
}
