//! Reporter dispatcher.
//!
//! [`Reporter`] turns a configuration into report units and hands them to an
//! [`Executor`]. It owns the host handles the units read from (file system,
//! environment snapshot, probes) so that tests and embedders can swap any of
//! them out through the `with_*` builders.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::collector::cgroup::DEFAULT_CGROUP_ROOT;
use crate::collector::network::{self, InterfaceAddress};
use crate::collector::{AddressProbe, Environment, FileSystem, RealFs, SystemProbe};
use crate::config::{self, ReportConfig};
use crate::db::DatabaseConnection;
use crate::executor::Executor;
use crate::redact::Redactor;
use crate::report::{Report, ReportKind};
use crate::reports::{
    AllocatorReport, AllocatorStats, BuildInfo, CalendarReport, CharsetReport, CommandLineReport,
    ConnectionReport, ContainerInfoReport, DiskInfo, EnvironmentReport, FileSystemReport,
    LibraryPathReport, LocaleReport, MemoryReport, NetworkInterfaceReport, OperatingSystemReport,
    OsInfo, PhysicalSystemReport, RuntimeReport, SecurityProvidersReport, SslContextReport,
    SystemPropertiesReport, TrustStoreReport, UserReport,
};
use crate::sink::{LogSink, TracingSink};
use crate::tls::{NativeTlsFactory, TlsContextFactory};

/// Source of the current time for the calendar report.
pub type Clock = fn() -> DateTime<Utc>;

fn default_allocator() -> Arc<dyn AllocatorStats> {
    #[cfg(not(target_env = "msvc"))]
    {
        Arc::new(crate::reports::JemallocStats)
    }
    #[cfg(target_env = "msvc")]
    {
        Arc::new(crate::reports::NoAllocatorStats)
    }
}

/// Properties describing the running process, keyed in dotted form.
pub fn process_properties(build: &BuildInfo, env: &Environment) -> BTreeMap<String, String> {
    let mut props = BTreeMap::new();
    let mut put = |key: &str, value: String| {
        props.insert(key.to_string(), value);
    };
    put("envreport.version", build.version.clone());
    put("rust.version", build.rustc.clone());
    put("rust.target", build.target.clone());
    put("os.name", std::env::consts::OS.to_string());
    put("os.arch", std::env::consts::ARCH.to_string());
    put("os.family", std::env::consts::FAMILY.to_string());
    put("process.id", std::process::id().to_string());
    if let Ok(exe) = std::env::current_exe() {
        put("process.executable", exe.display().to_string());
    }
    if let Ok(dir) = std::env::current_dir() {
        put("user.dir", dir.display().to_string());
    }
    if let Some(home) = env.get("HOME") {
        put("user.home", home.to_string());
    }
    put("file.separator", std::path::MAIN_SEPARATOR.to_string());
    put(
        "path.separator",
        if cfg!(windows) { ";" } else { ":" }.to_string(),
    );
    props
}

/// Builds report units and dispatches them.
pub struct Reporter {
    sink: Arc<dyn LogSink>,
    fs: Arc<dyn FileSystem>,
    env: Arc<Environment>,
    probe: Arc<dyn AddressProbe>,
    tls: Arc<dyn TlsContextFactory>,
    allocator: Arc<dyn AllocatorStats>,
    build: BuildInfo,
    properties: BTreeMap<String, String>,
    args: Vec<String>,
    cgroup_root: PathBuf,
    os_info: Option<OsInfo>,
    disks: Option<Vec<DiskInfo>>,
    addresses: Option<HashMap<String, Vec<InterfaceAddress>>>,
    clock: Clock,
    connection: Option<Arc<dyn DatabaseConnection>>,
}

impl Reporter {
    /// Creates a reporter over the live host, writing to `sink`.
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFs::new());
        let env = Arc::new(Environment::capture());
        let build = BuildInfo::current();
        Self {
            sink,
            probe: Arc::new(SystemProbe::new(Arc::clone(&fs))),
            tls: Arc::new(NativeTlsFactory),
            allocator: default_allocator(),
            properties: process_properties(&build, &env),
            args: CommandLineReport::current_args(),
            cgroup_root: PathBuf::from(DEFAULT_CGROUP_ROOT),
            os_info: None,
            disks: None,
            addresses: None,
            clock: Utc::now,
            connection: None,
            fs,
            env,
            build,
        }
    }

    /// Creates a reporter that logs through `tracing` under the configured
    /// logger name.
    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(Arc::new(TracingSink::new(config.logger_name.clone())))
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_environment(mut self, env: Environment) -> Self {
        self.env = Arc::new(env);
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn AddressProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_tls_factory(mut self, tls: Arc<dyn TlsContextFactory>) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_allocator(mut self, allocator: Arc<dyn AllocatorStats>) -> Self {
        self.allocator = allocator;
        self
    }

    /// Replaces every process property.
    pub fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties = properties;
        self
    }

    /// Adds or overrides one process property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Command line to report; index 0 is the program.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_cgroup_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cgroup_root = root.into();
        self
    }

    /// Fixes the operating system facts instead of querying the host.
    pub fn with_os_info(mut self, info: OsInfo) -> Self {
        self.os_info = Some(info);
        self
    }

    /// Fixes the disk list instead of querying the host.
    pub fn with_disks(mut self, disks: Vec<DiskInfo>) -> Self {
        self.disks = Some(disks);
        self
    }

    /// Fixes interface addresses instead of querying the host.
    pub fn with_addresses(mut self, addresses: HashMap<String, Vec<InterfaceAddress>>) -> Self {
        self.addresses = Some(addresses);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Connection used by [`ReportKind::Connection`] in [`log_report`] and
    /// [`log_all_reports`].
    ///
    /// [`log_report`]: Reporter::log_report
    /// [`log_all_reports`]: Reporter::log_all_reports
    pub fn with_connection(mut self, connection: Arc<dyn DatabaseConnection>) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }

    /// Runs every facet enabled in the process-wide configuration.
    pub fn log_default_reports(&self, executor: &dyn Executor) {
        self.log_default_reports_with(&config::global(), executor);
    }

    /// Runs every facet enabled in `config`.
    pub fn log_default_reports_with(&self, config: &ReportConfig, executor: &dyn Executor) {
        let kinds = config.enabled_kinds();
        if kinds.is_empty() {
            return;
        }
        let redactor = self.redactor(config);
        for kind in kinds {
            self.dispatch(kind, config, &redactor, executor);
        }
    }

    /// Runs every facet regardless of flags.
    pub fn log_all_reports(&self, executor: &dyn Executor) {
        let config = config::global();
        let redactor = self.redactor(&config);
        for kind in ReportKind::ALL {
            self.dispatch(kind, &config, &redactor, executor);
        }
    }

    /// Runs one facet regardless of flags.
    pub fn log_report(&self, kind: ReportKind, executor: &dyn Executor) {
        let config = config::global();
        let redactor = self.redactor(&config);
        self.dispatch(kind, &config, &redactor, executor);
    }

    /// Reports on `connection`.
    pub fn log_connection_report(
        &self,
        connection: Arc<dyn DatabaseConnection>,
        executor: &dyn Executor,
    ) {
        let config = config::global();
        let redactor = self.redactor(&config);
        executor.execute(Box::new(ConnectionReport::new(
            Arc::clone(&self.sink),
            connection,
            redactor,
            config.connection_type_map,
        )));
    }

    /// Compiles the configured pattern, falling back to the default one.
    fn redactor(&self, config: &ReportConfig) -> Redactor {
        match Redactor::new(&config.redact_pattern) {
            Ok(r) => r,
            Err(e) => {
                self.sink.warn(
                    &format!(
                        "Invalid redaction pattern '{}', using the default",
                        config.redact_pattern
                    ),
                    Some(&e),
                );
                Redactor::default()
            }
        }
    }

    fn dispatch(
        &self,
        kind: ReportKind,
        config: &ReportConfig,
        redactor: &Redactor,
        executor: &dyn Executor,
    ) {
        let units = self.units(kind, config, redactor);
        debug!(report = %kind, units = units.len(), "Dispatching report");
        for unit in units {
            executor.execute(unit);
        }
    }

    /// Builds the units of one facet. Most facets have exactly one; network
    /// interfaces have one per interface.
    fn units(
        &self,
        kind: ReportKind,
        config: &ReportConfig,
        redactor: &Redactor,
    ) -> Vec<Box<dyn Report>> {
        let sink = Arc::clone(&self.sink);
        let fs = Arc::clone(&self.fs);
        let env = Arc::clone(&self.env);
        let unit: Box<dyn Report> = match kind {
            ReportKind::Runtime => Box::new(RuntimeReport::new(sink, fs, self.build.clone())),
            ReportKind::Memory => Box::new(MemoryReport::new(sink, fs)),
            ReportKind::OperatingSystem => Box::new(OperatingSystemReport::new(
                sink,
                self.os_info.clone().unwrap_or_else(OsInfo::collect),
            )),
            ReportKind::User => Box::new(UserReport::new(sink, fs, env)),
            ReportKind::Locale => Box::new(LocaleReport::new(sink, fs, env)),
            ReportKind::Charset => Box::new(CharsetReport::new(sink, fs, env)),
            ReportKind::FileSystem => Box::new(FileSystemReport::new(
                sink,
                self.disks.clone().unwrap_or_else(DiskInfo::collect),
                env,
            )),
            ReportKind::Calendar => Box::new(CalendarReport::new(sink, fs, env, (self.clock)())),
            ReportKind::NetworkInterface => return self.interface_units(),
            ReportKind::SslContext => Box::new(SslContextReport::new(sink, Arc::clone(&self.tls))),
            ReportKind::TrustStore => Box::new(TrustStoreReport::new(sink, fs, env)),
            ReportKind::Connection => match &self.connection {
                Some(conn) => Box::new(ConnectionReport::new(
                    sink,
                    Arc::clone(conn),
                    redactor.clone(),
                    config.connection_type_map,
                )),
                None => {
                    debug!("No database connection configured");
                    return Vec::new();
                }
            },
            ReportKind::SystemProperties => Box::new(SystemPropertiesReport::new(
                sink,
                self.properties.clone(),
                redactor.clone(),
            )),
            ReportKind::Environment => {
                Box::new(EnvironmentReport::new(sink, env, redactor.clone()))
            }
            ReportKind::CommandLine => Box::new(CommandLineReport::new(
                sink,
                self.args.clone(),
                redactor.clone(),
            )),
            ReportKind::LibraryPath => Box::new(LibraryPathReport::new(sink, fs, env)),
            ReportKind::Allocator => {
                Box::new(AllocatorReport::new(sink, Arc::clone(&self.allocator)))
            }
            ReportKind::PhysicalSystem => Box::new(PhysicalSystemReport::new(sink, fs)),
            ReportKind::ContainerInfo => Box::new(ContainerInfoReport::new(
                sink,
                fs,
                env,
                self.cgroup_root.clone(),
            )),
            ReportKind::SecurityProviders => {
                Box::new(SecurityProvidersReport::new(sink, env, redactor.clone()))
            }
        };
        vec![unit]
    }

    /// One unit per interface. An enumeration failure is warned about and
    /// yields no units.
    fn interface_units(&self) -> Vec<Box<dyn Report>> {
        let addresses = self.addresses.clone().unwrap_or_else(network::system_addresses);
        match network::enumerate_interfaces(self.fs.as_ref(), &addresses) {
            Ok(interfaces) => interfaces
                .into_iter()
                .map(|iface| {
                    Box::new(NetworkInterfaceReport::new(
                        Arc::clone(&self.sink),
                        iface,
                        Arc::clone(&self.probe),
                    )) as Box<dyn Report>
                })
                .collect(),
            Err(e) => {
                self.sink
                    .warn("Failed to enumerate network interfaces", Some(&e));
                Vec::new()
            }
        }
    }
}
