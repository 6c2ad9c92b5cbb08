//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use envreport_core::collector::{AddressProbe, Environment, MockFs};
use envreport_core::executor::run_guarded;
use envreport_core::reports::{DiskInfo, NoAllocatorStats, OsInfo};
use envreport_core::tls::{TlsContextError, TlsContextFactory, TlsContextInfo};
use envreport_core::{CapturingSink, Executor, Report, ReportKind, Reporter};

/// Records every unit it receives and optionally runs it.
pub struct CountingExecutor {
    run: bool,
    kinds: Mutex<Vec<ReportKind>>,
}

impl CountingExecutor {
    pub fn counting() -> Self {
        Self {
            run: false,
            kinds: Mutex::new(Vec::new()),
        }
    }

    pub fn running() -> Self {
        Self {
            run: true,
            kinds: Mutex::new(Vec::new()),
        }
    }

    pub fn kinds(&self) -> Vec<ReportKind> {
        self.kinds.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.kinds.lock().unwrap().len()
    }
}

impl Executor for CountingExecutor {
    fn execute(&self, report: Box<dyn Report>) {
        self.kinds.lock().unwrap().push(report.kind());
        if self.run {
            run_guarded(report);
        }
    }
}

pub struct FakeProbe;

impl AddressProbe for FakeProbe {
    fn host_name(&self, addr: IpAddr) -> io::Result<String> {
        Ok(addr.to_string())
    }

    fn canonical_host_name(&self, addr: IpAddr) -> io::Result<String> {
        Ok(addr.to_string())
    }

    fn is_reachable(&self, _addr: IpAddr, _timeout: Duration) -> io::Result<bool> {
        Ok(true)
    }
}

pub struct FakeTls;

impl TlsContextFactory for FakeTls {
    fn create(&self, name: &str) -> Result<TlsContextInfo, TlsContextError> {
        if name == "SSLv2" {
            return Err(TlsContextError::NoSuchProtocol(name.to_string()));
        }
        Ok(TlsContextInfo {
            name: name.to_string(),
            provider: "Fake".to_string(),
            min_protocol: None,
            max_protocol: None,
        })
    }
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 0)
        .single()
        .unwrap_or_default()
}

/// Host with one interface and a handful of `/proc` files.
pub fn host_fs() -> MockFs {
    let mut fs = MockFs::new();
    fs.add_file("/sys/class/net/lo/ifindex", "1\n");
    fs.add_file("/sys/class/net/lo/mtu", "65536\n");
    fs.add_file("/sys/class/net/lo/flags", "0x9\n");
    fs.add_file("/proc/loadavg", "0.10 0.20 0.30 1/100 4242\n");
    fs.add_file("/proc/meminfo", "MemTotal: 1024 kB\nMemFree: 512 kB\n");
    fs.add_file("/etc/hostname", "test-host\n");
    fs
}

/// Reporter over fixed inputs only, writing to the returned sink.
pub fn reporter(env: &[(&str, &str)]) -> (Arc<CapturingSink>, Reporter) {
    let sink = Arc::new(CapturingSink::new("envreport-test"));
    let reporter = Reporter::new(sink.clone())
        .with_file_system(Arc::new(host_fs()))
        .with_environment(Environment::from_pairs(env.iter().copied()))
        .with_probe(Arc::new(FakeProbe))
        .with_tls_factory(Arc::new(FakeTls))
        .with_allocator(Arc::new(NoAllocatorStats))
        .with_properties(BTreeMap::from([
            ("app.name".to_string(), "demo".to_string()),
            ("db.password".to_string(), "hunter2".to_string()),
        ]))
        .with_args(vec!["demo".to_string(), "--api-token=abc123".to_string()])
        .with_os_info(OsInfo {
            name: Some("Linux".to_string()),
            arch: "x86_64".to_string(),
            family: "unix".to_string(),
            ..Default::default()
        })
        .with_disks(vec![DiskInfo {
            mount_point: "/".to_string(),
            file_system: "ext4".to_string(),
            kind: "SSD".to_string(),
            total: 1 << 30,
            available: 1 << 29,
            removable: false,
        }])
        .with_addresses(HashMap::new())
        .with_cgroup_root("/sys/fs/cgroup")
        .with_clock(fixed_now);
    (sink, reporter)
}
