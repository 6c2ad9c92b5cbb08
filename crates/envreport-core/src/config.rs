//! Report configuration.
//!
//! Settings come from `ENVREPORT_*` environment variables or a JSON file.
//! A process-wide instance is kept for hosts that configure once at startup;
//! the reporter takes a snapshot of it at the start of every invocation.

use std::path::Path;
use std::sync::{LazyLock, RwLock};

use serde::{Deserialize, Serialize};

use crate::redact::{DEFAULT_PATTERN, Redactor};
use crate::report::ReportKind;

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "ENVREPORT_";

/// Default logger name.
pub const DEFAULT_LOGGER_NAME: &str = "envreport";

/// Key of the type-map switch inside the connection report.
pub const CONNECTION_TYPE_MAP_KEY: &str = "CONNECTION_TYPE_MAP";

/// Error produced while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// A flag value that is not a boolean.
    InvalidBool { key: String, value: String },
    /// A redaction pattern that does not compile.
    InvalidPattern { key: String, message: String },
    /// The configuration file cannot be read.
    Io {
        path: String,
        source: std::io::Error,
    },
    /// The configuration file is not valid JSON for this schema.
    Json(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidBool { key, value } => {
                write!(f, "{}: expected a boolean, got '{}'", key, value)
            }
            ConfigError::InvalidPattern { key, message } => {
                write!(f, "{}: invalid pattern: {}", key, message)
            }
            ConfigError::Io { path, source } => write!(f, "cannot read {}: {}", path, source),
            ConfigError::Json(e) => write!(f, "invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Json(e) => Some(e),
            _ => None,
        }
    }
}

/// Which reports run by default, and how they render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub logger_name: String,
    /// Case-insensitive regex matched against keys; empty disables redaction.
    pub redact_pattern: String,
    pub runtime_report: bool,
    pub memory_report: bool,
    pub operating_system_report: bool,
    pub user_report: bool,
    pub locale_report: bool,
    pub charset_report: bool,
    pub file_system_report: bool,
    pub calendar_report: bool,
    pub network_interface_report: bool,
    pub ssl_context_report: bool,
    pub trust_store_report: bool,
    pub system_properties_report: bool,
    pub environment_report: bool,
    pub command_line_report: bool,
    pub library_path_report: bool,
    pub allocator_report: bool,
    pub physical_system_report: bool,
    pub container_info_report: bool,
    pub security_providers_report: bool,
    /// Include the type map in connection reports.
    pub connection_type_map: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            logger_name: DEFAULT_LOGGER_NAME.to_string(),
            redact_pattern: DEFAULT_PATTERN.to_string(),
            runtime_report: true,
            memory_report: true,
            operating_system_report: true,
            user_report: true,
            locale_report: true,
            charset_report: true,
            file_system_report: true,
            calendar_report: false,
            network_interface_report: false,
            ssl_context_report: false,
            trust_store_report: false,
            system_properties_report: true,
            environment_report: false,
            command_line_report: true,
            library_path_report: false,
            allocator_report: true,
            physical_system_report: true,
            container_info_report: true,
            security_providers_report: false,
            connection_type_map: false,
        }
    }
}

impl ReportConfig {
    /// Loads from `ENVREPORT_*` variables of the current process.
    pub fn from_env() -> (Self, Vec<ConfigError>) {
        Self::from_lookup(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok())
    }

    /// Loads from a key lookup (keys without the prefix, e.g. `MEMORY_REPORT`).
    ///
    /// Bad values are collected as errors and the default is kept for them.
    pub fn from_lookup<F>(lookup: F) -> (Self, Vec<ConfigError>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut errors = Vec::new();

        if let Some(name) = lookup("LOGGER_NAME") {
            config.logger_name = name;
        }

        if let Some(pattern) = lookup("REDACT_PATTERN") {
            match Redactor::new(&pattern) {
                Ok(_) => config.redact_pattern = pattern,
                Err(e) => errors.push(ConfigError::InvalidPattern {
                    key: "REDACT_PATTERN".to_string(),
                    message: e.to_string(),
                }),
            }
        }

        for kind in ReportKind::ALL {
            let Some(key) = kind.config_key() else {
                continue;
            };
            if let Some(value) = lookup(key) {
                match parse_bool(&value) {
                    Some(enabled) => config.set_enabled(kind, enabled),
                    None => errors.push(ConfigError::InvalidBool {
                        key: key.to_string(),
                        value,
                    }),
                }
            }
        }

        if let Some(value) = lookup(CONNECTION_TYPE_MAP_KEY) {
            match parse_bool(&value) {
                Some(enabled) => config.connection_type_map = enabled,
                None => errors.push(ConfigError::InvalidBool {
                    key: CONNECTION_TYPE_MAP_KEY.to_string(),
                    value,
                }),
            }
        }

        (config, errors)
    }

    /// Loads from a JSON file; absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json(&content)
    }

    /// Parses JSON configuration; the redaction pattern must compile.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content).map_err(ConfigError::Json)?;
        Redactor::new(&config.redact_pattern).map_err(|e| ConfigError::InvalidPattern {
            key: "redact_pattern".to_string(),
            message: e.to_string(),
        })?;
        Ok(config)
    }

    /// Returns whether `kind` runs by default. On-demand facets never do.
    pub fn is_enabled(&self, kind: ReportKind) -> bool {
        match kind {
            ReportKind::Runtime => self.runtime_report,
            ReportKind::Memory => self.memory_report,
            ReportKind::OperatingSystem => self.operating_system_report,
            ReportKind::User => self.user_report,
            ReportKind::Locale => self.locale_report,
            ReportKind::Charset => self.charset_report,
            ReportKind::FileSystem => self.file_system_report,
            ReportKind::Calendar => self.calendar_report,
            ReportKind::NetworkInterface => self.network_interface_report,
            ReportKind::SslContext => self.ssl_context_report,
            ReportKind::TrustStore => self.trust_store_report,
            ReportKind::Connection => false,
            ReportKind::SystemProperties => self.system_properties_report,
            ReportKind::Environment => self.environment_report,
            ReportKind::CommandLine => self.command_line_report,
            ReportKind::LibraryPath => self.library_path_report,
            ReportKind::Allocator => self.allocator_report,
            ReportKind::PhysicalSystem => self.physical_system_report,
            ReportKind::ContainerInfo => self.container_info_report,
            ReportKind::SecurityProviders => self.security_providers_report,
        }
    }

    /// Switches `kind` on or off. Ignored for on-demand facets.
    pub fn set_enabled(&mut self, kind: ReportKind, enabled: bool) {
        let flag = match kind {
            ReportKind::Runtime => &mut self.runtime_report,
            ReportKind::Memory => &mut self.memory_report,
            ReportKind::OperatingSystem => &mut self.operating_system_report,
            ReportKind::User => &mut self.user_report,
            ReportKind::Locale => &mut self.locale_report,
            ReportKind::Charset => &mut self.charset_report,
            ReportKind::FileSystem => &mut self.file_system_report,
            ReportKind::Calendar => &mut self.calendar_report,
            ReportKind::NetworkInterface => &mut self.network_interface_report,
            ReportKind::SslContext => &mut self.ssl_context_report,
            ReportKind::TrustStore => &mut self.trust_store_report,
            ReportKind::Connection => return,
            ReportKind::SystemProperties => &mut self.system_properties_report,
            ReportKind::Environment => &mut self.environment_report,
            ReportKind::CommandLine => &mut self.command_line_report,
            ReportKind::LibraryPath => &mut self.library_path_report,
            ReportKind::Allocator => &mut self.allocator_report,
            ReportKind::PhysicalSystem => &mut self.physical_system_report,
            ReportKind::ContainerInfo => &mut self.container_info_report,
            ReportKind::SecurityProviders => &mut self.security_providers_report,
        };
        *flag = enabled;
    }

    /// Switches every flagged facet on or off.
    pub fn set_all(&mut self, enabled: bool) {
        for kind in ReportKind::ALL {
            self.set_enabled(kind, enabled);
        }
    }

    /// Facets enabled by this configuration, in declared order.
    pub fn enabled_kinds(&self) -> Vec<ReportKind> {
        ReportKind::ALL
            .into_iter()
            .filter(|k| self.is_enabled(*k))
            .collect()
    }

    /// Restores every setting to its default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Parses `true/false`, `1/0`, `yes/no`, `on/off`, case-insensitively.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

static GLOBAL: LazyLock<RwLock<ReportConfig>> =
    LazyLock::new(|| RwLock::new(ReportConfig::default()));

/// Snapshot of the process-wide configuration.
pub fn global() -> ReportConfig {
    GLOBAL.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Replaces the process-wide configuration.
pub fn set_global(config: ReportConfig) {
    *GLOBAL.write().unwrap_or_else(|e| e.into_inner()) = config;
}

/// Restores the process-wide configuration to defaults.
pub fn reset_global() {
    GLOBAL.write().unwrap_or_else(|e| e.into_inner()).reset();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ReportConfig::default();
        assert!(config.is_enabled(ReportKind::Memory));
        assert!(config.is_enabled(ReportKind::ContainerInfo));
        assert!(!config.is_enabled(ReportKind::NetworkInterface));
        assert!(!config.is_enabled(ReportKind::SslContext));
        assert!(!config.is_enabled(ReportKind::Environment));
        assert!(!config.is_enabled(ReportKind::Connection));
        assert!(!config.connection_type_map);
        assert_eq!(config.logger_name, "envreport");
        assert_eq!(config.redact_pattern, DEFAULT_PATTERN);
        assert_eq!(config.enabled_kinds().len(), 12);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let (config, errors) = ReportConfig::from_lookup(lookup(&[
            ("MEMORY_REPORT", "false"),
            ("NETWORK_INTERFACE_REPORT", "on"),
            ("CONNECTION_TYPE_MAP", "YES"),
            ("LOGGER_NAME", "diag"),
            ("REDACT_PATTERN", ""),
        ]));
        assert!(errors.is_empty());
        assert!(!config.is_enabled(ReportKind::Memory));
        assert!(config.is_enabled(ReportKind::NetworkInterface));
        assert!(config.connection_type_map);
        assert_eq!(config.logger_name, "diag");
        assert_eq!(config.redact_pattern, "");
    }

    #[test]
    fn test_from_lookup_collects_errors_and_keeps_defaults() {
        let (config, errors) = ReportConfig::from_lookup(lookup(&[
            ("MEMORY_REPORT", "maybe"),
            ("REDACT_PATTERN", "(broken"),
        ]));
        assert_eq!(errors.len(), 2);
        assert!(config.is_enabled(ReportKind::Memory));
        assert_eq!(config.redact_pattern, DEFAULT_PATTERN);
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        assert!(messages.iter().any(|m| m.contains("REDACT_PATTERN")));
        assert!(messages.iter().any(|m| m.contains("'maybe'")));
    }

    #[test]
    fn test_set_enabled_and_reset() {
        let mut config = ReportConfig::default();
        config.set_all(false);
        assert!(config.enabled_kinds().is_empty());
        config.set_enabled(ReportKind::Calendar, true);
        assert_eq!(config.enabled_kinds(), vec![ReportKind::Calendar]);
        config.set_enabled(ReportKind::Connection, true);
        assert!(!config.is_enabled(ReportKind::Connection));
        config.reset();
        assert_eq!(config, ReportConfig::default());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"logger_name": "json", "memory_report": false, "trust_store_report": true}}"#
        )
        .unwrap();

        let config = ReportConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.logger_name, "json");
        assert!(!config.is_enabled(ReportKind::Memory));
        assert!(config.is_enabled(ReportKind::TrustStore));
        assert!(config.is_enabled(ReportKind::Runtime));
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        assert!(matches!(
            ReportConfig::from_json(r#"{"unknown_field": true}"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            ReportConfig::from_json(r#"{"redact_pattern": "[a-"}"#),
            Err(ConfigError::InvalidPattern { .. })
        ));
        assert!(matches!(
            ReportConfig::from_json_file(Path::new("/nonexistent/envreport.json")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool(" TRUE "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool(""), None);
        assert_eq!(parse_bool("2"), None);
    }
}
