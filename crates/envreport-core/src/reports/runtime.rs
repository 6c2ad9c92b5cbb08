//! Runtime identity: build metadata and the current process.

use std::path::Path;
use std::sync::Arc;

use crate::collector::FileSystem;
use crate::collector::procfs::{parse_global_stat, parse_proc_stat, parse_uptime};
use crate::fmt;
use crate::report::{Report, ReportKind, io_marker};
use crate::reports::read_with;
use crate::sink::{InfoWriter, LogSink};

/// Kernel clock ticks per second (`USER_HZ`), fixed at 100 on Linux.
const CLOCK_TICKS: u64 = 100;

/// Identity of the running build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildInfo {
    pub package: String,
    pub version: String,
    pub rustc: String,
    pub target: String,
}

impl BuildInfo {
    /// Metadata embedded at compile time.
    pub fn current() -> Self {
        Self {
            package: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            rustc: env!("ENVREPORT_RUSTC_VERSION").to_string(),
            target: env!("ENVREPORT_BUILD_TARGET").to_string(),
        }
    }
}

pub struct RuntimeReport {
    sink: Arc<dyn LogSink>,
    fs: Arc<dyn FileSystem>,
    build: BuildInfo,
}

impl RuntimeReport {
    pub fn new(sink: Arc<dyn LogSink>, fs: Arc<dyn FileSystem>, build: BuildInfo) -> Self {
        Self { sink, fs, build }
    }
}

impl Report for RuntimeReport {
    fn kind(&self) -> ReportKind {
        ReportKind::Runtime
    }

    fn run(&self) {
        let Some(mut w) = InfoWriter::open(&self.sink) else {
            return;
        };
        w.title(self.kind().title());
        w.entry("package", &self.build.package);
        w.entry("version", &self.build.version);
        w.entry("compiler", &self.build.rustc);
        w.entry("target", &self.build.target);

        let fs = self.fs.as_ref();
        let stat = read_with(fs, "/proc/self/stat", parse_proc_stat);
        match &stat {
            Ok(stat) => {
                w.entry("pid", stat.pid);
                w.entry("parent pid", stat.ppid);
                w.entry("command", &stat.comm);
                w.entry("state", stat.state);
                w.entry("threads", stat.num_threads);
            }
            Err(marker) => w.entry("process", marker),
        }

        match fs.read_link(Path::new("/proc/self/exe")) {
            Ok(path) => w.entry("executable", path.display()),
            Err(e) => w.entry("executable", io_marker(&e)),
        }

        if let Ok(stat) = &stat {
            let started_after_boot = stat.starttime / CLOCK_TICKS;
            let start = read_with(fs, "/proc/stat", parse_global_stat)
                .map(|g| fmt::epoch_utc((g.btime + started_after_boot) as i64));
            w.entry("start time", start.unwrap_or_else(|m| m));

            let uptime = read_with(fs, "/proc/uptime", parse_uptime).map(|since_boot| {
                fmt::duration(since_boot.saturating_sub(started_after_boot) as i64)
            });
            w.entry("uptime", uptime.unwrap_or_else(|m| m));
        }

        match std::thread::available_parallelism() {
            Ok(n) => w.entry("available parallelism", n),
            Err(e) => w.entry("available parallelism", io_marker(&e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;
    use crate::reports::testing::{assert_line, capture, output};

    fn build() -> BuildInfo {
        BuildInfo {
            package: "envreport-core".to_string(),
            version: "0.1.0".to_string(),
            rustc: "rustc 1.85.0".to_string(),
            target: "x86_64-unknown-linux-gnu".to_string(),
        }
    }

    fn proc_fs() -> MockFs {
        let mut fs = MockFs::new();
        // starttime = 50000 ticks = 500s after boot
        fs.add_file(
            "/proc/self/stat",
            "4242 (envreport) R 1 4242 4242 0 -1 4194304 100 0 0 0 1 1 0 0 20 0 4 0 50000 1000000 500",
        );
        fs.add_file("/proc/stat", "cpu 1 2 3 4\ncpu0 1 2 3 4\nbtime 1700000000\n");
        fs.add_file("/proc/uptime", "685.50 1000.00\n");
        fs.add_link("/proc/self/exe", "/usr/bin/envreport");
        fs
    }

    #[test]
    fn test_runtime_report() {
        let (sink, dyn_sink) = capture();
        let report = RuntimeReport::new(dyn_sink, Arc::new(proc_fs()), build());
        let text = output(&sink, &report);

        assert!(text.starts_with("Runtime:\n"));
        assert_line(&text, "  - package: envreport-core");
        assert_line(&text, "  - compiler: rustc 1.85.0");
        assert_line(&text, "  - pid: 4242");
        assert_line(&text, "  - command: envreport");
        assert_line(&text, "  - threads: 4");
        assert_line(&text, "  - executable: /usr/bin/envreport");
        assert_line(&text, "  - start time: 2023-11-14 22:21:40 UTC");
        assert_line(&text, "  - uptime: 3m 5s");
    }

    #[test]
    fn test_runtime_report_without_proc() {
        let (sink, dyn_sink) = capture();
        let report = RuntimeReport::new(dyn_sink, Arc::new(MockFs::new()), build());
        let text = output(&sink, &report);

        assert_line(&text, "  - process: Not available");
        assert_line(&text, "  - executable: Not available");
        assert!(!text.contains("uptime"));
    }

    #[test]
    fn test_build_info_current() {
        let info = BuildInfo::current();
        assert_eq!(info.package, "envreport-core");
        assert!(!info.rustc.is_empty());
    }
}
