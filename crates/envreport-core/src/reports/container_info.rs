use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::collector::cgroup::{CgroupReader, Reading};
use crate::collector::{Environment, FileSystem, container};
use crate::fmt;
use crate::report::{Report, ReportKind, io_marker};
use crate::sink::{InfoWriter, LogSink};

/// Cgroup controllers per output line.
const CONTROLLERS_PER_LINE: usize = 8;

const HOSTNAME_PATHS: [&str; 2] = ["/proc/sys/kernel/hostname", "/etc/hostname"];

/// Container detection plus the cgroup limits the process runs under.
pub struct ContainerInfoReport {
    sink: Arc<dyn LogSink>,
    fs: Arc<dyn FileSystem>,
    env: Arc<Environment>,
    cgroup_root: PathBuf,
}

impl ContainerInfoReport {
    pub fn new(
        sink: Arc<dyn LogSink>,
        fs: Arc<dyn FileSystem>,
        env: Arc<Environment>,
        cgroup_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sink,
            fs,
            env,
            cgroup_root: cgroup_root.into(),
        }
    }

    fn hostname(&self) -> String {
        let mut last_error = None;
        for path in HOSTNAME_PATHS {
            match self.fs.read_to_string(Path::new(path)) {
                Ok(name) if !name.trim().is_empty() => return name.trim().to_string(),
                Ok(_) => {}
                Err(e) => last_error = Some(e),
            }
        }
        if let Some(name) = self.env.get("HOSTNAME") {
            return name.to_string();
        }
        last_error
            .map(|e| io_marker(&e))
            .unwrap_or_else(|| "n/a".to_string())
    }

    /// Renders one cgroup reading; unreadable values are also warned about.
    fn limit<T>(&self, what: &str, reading: &Reading<T>, render: impl FnOnce(&T) -> String) -> String {
        match reading {
            Reading::NotAvailable => "Not available".to_string(),
            Reading::NoLimit => "No limit set".to_string(),
            Reading::Value(v) => render(v),
            Reading::Error(detail) => {
                let message = format!("Error reading {}: {}", what, detail);
                self.sink.warn(&message, None);
                message
            }
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn or_none(value: Option<impl Display>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "none".to_string())
}

impl Report for ContainerInfoReport {
    fn kind(&self) -> ReportKind {
        ReportKind::ContainerInfo
    }

    fn run(&self) {
        let Some(mut w) = InfoWriter::open(&self.sink) else {
            return;
        };
        w.title(self.kind().title());
        w.entry("hostname", self.hostname());

        let markers = container::detect(self.fs.as_ref(), &self.env);
        w.entry("in container", yes_no(markers.is_container()));
        w.entry("runtime", markers.runtime());
        if markers.is_container() {
            w.item("markers:");
            w.nested("kubernetes env", yes_no(markers.kubernetes_env));
            w.nested("service account", yes_no(markers.service_account));
            w.nested("container env", or_none(markers.container_env.as_deref()));
            w.nested("/.dockerenv", yes_no(markers.dockerenv));
            w.nested("/run/.containerenv", yes_no(markers.containerenv));
            w.nested("cgroup pattern", or_none(markers.cgroup_pattern));
        }

        let limits = CgroupReader::new(self.fs.as_ref(), self.cgroup_root.clone()).read_limits();
        let Some(version) = limits.version else {
            w.entry("cgroup", "Not available");
            return;
        };
        w.entry("cgroup version", version);
        w.wrapped("controllers", &limits.controllers, CONTROLLERS_PER_LINE);
        w.entry(
            "memory limit",
            self.limit("memory limit", &limits.memory_limit, |v| fmt::bytes_u64(*v)),
        );
        w.entry(
            "memory usage",
            self.limit("memory usage", &limits.memory_usage, |v| fmt::bytes_u64(*v)),
        );
        w.entry(
            "cpu limit",
            self.limit("cpu limit", &limits.cpu, |q| match q.cpus() {
                Some(cpus) => format!("{:.2} cpus ({}/{})", cpus, q.quota.unwrap_or(0), q.period),
                None => "No limit set".to_string(),
            }),
        );
        w.entry(
            "pids limit",
            self.limit("pids limit", &limits.pids_limit, |v| v.to_string()),
        );
    }
}
