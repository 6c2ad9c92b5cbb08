//! Database connection abstraction for the connection report.
//!
//! Every accessor may fail independently; the report renders each failure
//! in place of that one value.

use std::collections::BTreeMap;
use std::time::Duration;

/// Result holdability codes.
pub const HOLD_CURSORS_OVER_COMMIT: i32 = 1;
pub const CLOSE_CURSORS_AT_COMMIT: i32 = 2;

/// Transaction isolation codes.
pub const TRANSACTION_NONE: i32 = 0;
pub const TRANSACTION_READ_UNCOMMITTED: i32 = 1;
pub const TRANSACTION_READ_COMMITTED: i32 = 2;
pub const TRANSACTION_REPEATABLE_READ: i32 = 4;
pub const TRANSACTION_SERIALIZABLE: i32 = 8;

/// SQL state conventions.
pub const SQL_STATE_XOPEN: i32 = 1;
pub const SQL_STATE_SQL: i32 = 2;

/// Failure of one connection accessor.
#[derive(Debug, Clone, PartialEq)]
pub enum DbError {
    /// The connection was closed.
    Closed,
    /// Could not establish the connection.
    Connection(String),
    /// A query failed.
    Query(String),
    /// The driver does not support the accessor.
    Unsupported(&'static str),
}

impl std::fmt::Display for DbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbError::Closed => write!(f, "connection is closed"),
            DbError::Connection(msg) => write!(f, "connection failed: {}", msg),
            DbError::Query(msg) => write!(f, "query failed: {}", msg),
            DbError::Unsupported(what) => write!(f, "{} not supported", what),
        }
    }
}

impl std::error::Error for DbError {}

/// Server and driver description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionMetadata {
    pub product_name: String,
    pub product_version: String,
    pub driver_name: String,
    pub driver_version: String,
    pub url: String,
    pub user_name: String,
    pub sql_state_type: i32,
    /// `None` when the server imposes no limit.
    pub max_connections: Option<u32>,
}

/// An open database connection, as seen by the report.
pub trait DatabaseConnection: Send + Sync {
    fn is_closed(&self) -> bool;
    fn catalog(&self) -> Result<String, DbError>;
    fn schema(&self) -> Result<String, DbError>;
    fn auto_commit(&self) -> Result<bool, DbError>;
    fn read_only(&self) -> Result<bool, DbError>;
    fn holdability(&self) -> Result<i32, DbError>;
    fn transaction_isolation(&self) -> Result<i32, DbError>;
    /// `None` means no timeout.
    fn network_timeout(&self) -> Result<Option<Duration>, DbError>;
    fn client_info(&self) -> Result<BTreeMap<String, String>, DbError>;
    /// Database type name to the fully qualified name of the mapped Rust type.
    fn type_map(&self) -> Result<BTreeMap<String, String>, DbError>;
    fn metadata(&self) -> Result<ConnectionMetadata, DbError>;
}

pub fn holdability_label(code: i32) -> &'static str {
    match code {
        HOLD_CURSORS_OVER_COMMIT => "hold cursors over commit;",
        CLOSE_CURSORS_AT_COMMIT => "close cursors at commit;",
        _ => "unknown;",
    }
}

pub fn isolation_label(code: i32) -> &'static str {
    match code {
        TRANSACTION_NONE => "none;",
        TRANSACTION_READ_UNCOMMITTED => "read uncommitted;",
        TRANSACTION_READ_COMMITTED => "read committed;",
        TRANSACTION_REPEATABLE_READ => "repeatable read;",
        TRANSACTION_SERIALIZABLE => "serializable;",
        _ => "unknown;",
    }
}

pub fn sql_state_label(code: i32) -> &'static str {
    match code {
        SQL_STATE_XOPEN => "X/Open SQL CLI;",
        SQL_STATE_SQL => "SQL:2003;",
        _ => "unknown;",
    }
}

#[cfg(feature = "postgres")]
pub use self::pg::PostgresConnection;

#[cfg(feature = "postgres")]
mod pg {
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use postgres::config::Host;
    use postgres::{Client, Config, NoTls};

    use super::*;

    /// Connection adapter over the synchronous `postgres` client.
    pub struct PostgresConnection {
        client: Mutex<Client>,
        config: Config,
    }

    impl PostgresConnection {
        /// Connects using `PGHOST`, `PGPORT`, `PGUSER`, `PGPASSWORD` and
        /// `PGDATABASE`, with `USER` as the fallback user.
        pub fn from_env() -> Result<Self, DbError> {
            let user = std::env::var("PGUSER")
                .or_else(|_| std::env::var("USER"))
                .map_err(|_| DbError::Connection("PGUSER or USER not set".to_string()))?;
            let host = std::env::var("PGHOST").unwrap_or_else(|_| "localhost".to_string());
            let port = std::env::var("PGPORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5432);
            let database = std::env::var("PGDATABASE").unwrap_or_else(|_| user.clone());

            let mut config = Config::new();
            config
                .host(&host)
                .port(port)
                .user(&user)
                .dbname(&database)
                .application_name("envreport");
            if let Ok(password) = std::env::var("PGPASSWORD")
                && !password.is_empty()
            {
                config.password(password);
            }
            Self::connect(config)
        }

        pub fn connect(config: Config) -> Result<Self, DbError> {
            let client = config
                .connect(NoTls)
                .map_err(|e| DbError::Connection(format_postgres_error(&e)))?;
            Ok(Self {
                client: Mutex::new(client),
                config,
            })
        }

        fn query_string(&self, sql: &str) -> Result<String, DbError> {
            let mut client = self.client.lock().unwrap_or_else(|e| e.into_inner());
            if client.is_closed() {
                return Err(DbError::Closed);
            }
            let row = client
                .query_one(sql, &[])
                .map_err(|e| DbError::Query(format_postgres_error(&e)))?;
            row.try_get::<_, String>(0)
                .map_err(|e| DbError::Query(format_postgres_error(&e)))
        }

        fn show(&self, setting: &str) -> Result<String, DbError> {
            self.query_string(&format!("SHOW {}", setting))
        }

        fn url(&self) -> String {
            let host = match self.config.get_hosts().first() {
                Some(Host::Tcp(h)) => h.clone(),
                #[cfg(unix)]
                Some(Host::Unix(p)) => p.display().to_string(),
                None => "localhost".to_string(),
            };
            let port = self.config.get_ports().first().copied().unwrap_or(5432);
            format!(
                "postgresql://{}:{}/{}",
                host,
                port,
                self.config.get_dbname().unwrap_or_default()
            )
        }
    }

    impl DatabaseConnection for PostgresConnection {
        fn is_closed(&self) -> bool {
            self.client
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .is_closed()
        }

        fn catalog(&self) -> Result<String, DbError> {
            self.query_string("SELECT current_database()::text")
        }

        fn schema(&self) -> Result<String, DbError> {
            self.query_string("SELECT current_schema()::text")
        }

        fn auto_commit(&self) -> Result<bool, DbError> {
            // The client runs each statement in its own implicit transaction.
            Ok(true)
        }

        fn read_only(&self) -> Result<bool, DbError> {
            Ok(self.show("transaction_read_only")? == "on")
        }

        fn holdability(&self) -> Result<i32, DbError> {
            Ok(CLOSE_CURSORS_AT_COMMIT)
        }

        fn transaction_isolation(&self) -> Result<i32, DbError> {
            Ok(isolation_code(&self.show("transaction_isolation")?))
        }

        fn network_timeout(&self) -> Result<Option<Duration>, DbError> {
            Ok(self.config.get_connect_timeout().copied())
        }

        fn client_info(&self) -> Result<BTreeMap<String, String>, DbError> {
            let mut info = BTreeMap::new();
            info.insert("ApplicationName".to_string(), self.show("application_name")?);
            info.insert("client_encoding".to_string(), self.show("client_encoding")?);
            if let Some(user) = self.config.get_user() {
                info.insert("ClientUser".to_string(), user.to_string());
            }
            if let Some(password) = self.config.get_password() {
                info.insert(
                    "password".to_string(),
                    String::from_utf8_lossy(password).into_owned(),
                );
            }
            Ok(info)
        }

        fn type_map(&self) -> Result<BTreeMap<String, String>, DbError> {
            Ok(default_type_map())
        }

        fn metadata(&self) -> Result<ConnectionMetadata, DbError> {
            let version = self.show("server_version")?;
            let max_connections = self.show("max_connections")?.trim().parse().ok();
            Ok(ConnectionMetadata {
                product_name: "PostgreSQL".to_string(),
                product_version: version,
                driver_name: "rust-postgres".to_string(),
                driver_version: "0.19".to_string(),
                url: self.url(),
                user_name: self.config.get_user().unwrap_or_default().to_string(),
                sql_state_type: SQL_STATE_SQL,
                max_connections,
            })
        }
    }

    /// Formats a PostgreSQL error for display.
    fn format_postgres_error(e: &postgres::Error) -> String {
        if let Some(db_error) = e.as_db_error() {
            format!("{}: {}", db_error.severity(), db_error.message())
        } else {
            let msg = e.to_string();
            if msg.contains("Connection refused") {
                "connection refused".to_string()
            } else if msg.contains("password authentication failed") {
                "password authentication failed".to_string()
            } else {
                msg
            }
        }
    }
}

/// Maps a PostgreSQL `transaction_isolation` setting to its code.
pub fn isolation_code(setting: &str) -> i32 {
    match setting.trim().to_ascii_lowercase().as_str() {
        "read uncommitted" => TRANSACTION_READ_UNCOMMITTED,
        "read committed" => TRANSACTION_READ_COMMITTED,
        "repeatable read" => TRANSACTION_REPEATABLE_READ,
        "serializable" => TRANSACTION_SERIALIZABLE,
        _ => TRANSACTION_NONE,
    }
}

/// Column types the `postgres` client converts natively.
pub fn default_type_map() -> BTreeMap<String, String> {
    use std::any::type_name;
    [
        ("bool", type_name::<bool>()),
        ("bytea", type_name::<Vec<u8>>()),
        ("float4", type_name::<f32>()),
        ("float8", type_name::<f64>()),
        ("int2", type_name::<i16>()),
        ("int4", type_name::<i32>()),
        ("int8", type_name::<i64>()),
        ("oid", type_name::<u32>()),
        ("text", type_name::<String>()),
        ("varchar", type_name::<String>()),
        ("_text", type_name::<Vec<String>>()),
        ("inet", type_name::<std::net::IpAddr>()),
        ("timestamp", type_name::<std::time::SystemTime>()),
        ("interval", type_name::<std::time::Duration>()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
