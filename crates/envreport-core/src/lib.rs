//! envreport-core: environment diagnostics reported through a logging sink.
//!
//! Provides:
//! - `collector`: host fact sources (`/proc`, cgroups, interfaces, certificates)
//! - `reports`: one report unit per facet, each writing a single INFO block
//! - `dispatcher`: the `Reporter` that builds units from a configuration
//! - `executor`: same-thread and `rayon` pool executors
//! - `config`: flags and redaction settings, from env vars or JSON
//! - `sink`: the logging sink abstraction and the scoped `InfoWriter`
//! - `redact`, `fmt`: shared redaction and value formatting
//! - `db`, `tls`: database connection and TLS context probing
//!
//! With `postgres` feature (default):
//! - `db::PostgresConnection`: connection properties over the `postgres` client
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use envreport_core::{Reporter, SameThreadExecutor, TracingSink};
//!
//! let reporter = Reporter::new(Arc::new(TracingSink::new("envreport")));
//! reporter.log_default_reports(&SameThreadExecutor);
//! ```

pub mod collector;
pub mod config;
pub mod db;
pub mod dispatcher;
pub mod executor;
pub mod fmt;
pub mod redact;
pub mod report;
pub mod reports;
pub mod sink;
pub mod tls;

pub use config::{ConfigError, ReportConfig};
pub use dispatcher::Reporter;
pub use executor::{Executor, SameThreadExecutor, ThreadPoolExecutor};
pub use redact::Redactor;
pub use report::{Report, ReportKind};
pub use sink::{CapturingSink, InfoWriter, LogSink, TracingSink};
