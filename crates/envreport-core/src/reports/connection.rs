use std::sync::Arc;

use crate::db::{self, DatabaseConnection, DbError};
use crate::fmt::simple_type_name;
use crate::redact::Redactor;
use crate::report::{Report, ReportKind};
use crate::sink::{InfoWriter, LogSink};

/// Properties of one open database connection.
pub struct ConnectionReport {
    sink: Arc<dyn LogSink>,
    connection: Arc<dyn DatabaseConnection>,
    redactor: Redactor,
    type_map: bool,
}

impl ConnectionReport {
    pub fn new(
        sink: Arc<dyn LogSink>,
        connection: Arc<dyn DatabaseConnection>,
        redactor: Redactor,
        type_map: bool,
    ) -> Self {
        Self {
            sink,
            connection,
            redactor,
            type_map,
        }
    }
}

/// Renders an accessor result, or `error (<message>)`.
fn value<T>(result: Result<T, DbError>, render: impl FnOnce(T) -> String) -> String {
    match result {
        Ok(v) => render(v),
        Err(e) => format!("error ({})", e),
    }
}

impl Report for ConnectionReport {
    fn kind(&self) -> ReportKind {
        ReportKind::Connection
    }

    fn run(&self) {
        let Some(mut w) = InfoWriter::open(&self.sink) else {
            return;
        };
        w.title(self.kind().title());

        let conn = self.connection.as_ref();
        if conn.is_closed() {
            w.item("Closed!");
            return;
        }

        w.entry("catalog", value(conn.catalog(), |v| v));
        w.entry("schema", value(conn.schema(), |v| v));
        w.entry("auto commit", value(conn.auto_commit(), |v| v.to_string()));
        w.entry("read only", value(conn.read_only(), |v| v.to_string()));
        w.entry(
            "holdability",
            value(conn.holdability(), |v| db::holdability_label(v).to_string()),
        );
        w.entry(
            "transaction isolation",
            value(conn.transaction_isolation(), |v| {
                db::isolation_label(v).to_string()
            }),
        );
        w.entry(
            "network timeout",
            value(conn.network_timeout(), |v| match v {
                Some(d) => format!("{}ms", d.as_millis()),
                None => "none".to_string(),
            }),
        );

        match conn.client_info() {
            Ok(info) if info.is_empty() => w.entry("client info", "none"),
            Ok(info) => {
                w.item("client info:");
                for (key, val) in &info {
                    w.nested(key, self.redactor.render(key, val));
                }
            }
            Err(e) => w.entry("client info", format!("error ({})", e)),
        }

        match conn.metadata() {
            Ok(meta) => {
                w.entry("database", format!("{} {}", meta.product_name, meta.product_version));
                w.entry("driver", format!("{} {}", meta.driver_name, meta.driver_version));
                w.entry("url", &meta.url);
                w.entry("user", &meta.user_name);
                w.entry("sql state type", db::sql_state_label(meta.sql_state_type));
                match meta.max_connections {
                    Some(n) => w.entry("max connections", n),
                    None => w.entry("max connections", "no limit"),
                }
            }
            Err(e) => w.entry("metadata", format!("error ({})", e)),
        }

        if self.type_map {
            match conn.type_map() {
                Ok(map) if map.is_empty() => w.entry("type map", "none"),
                Ok(map) => {
                    w.item("type map:");
                    for (name, type_name) in &map {
                        w.nested(name, simple_type_name(type_name));
                    }
                }
                Err(e) => w.entry("type map", format!("error ({})", e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ConnectionMetadata;
    use crate::reports::testing::{assert_line, capture, output};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Connection with fixed answers that counts property accesses.
    struct MockConnection {
        closed: bool,
        holdability: i32,
        isolation: i32,
        sql_state_type: i32,
        accesses: AtomicUsize,
    }

    impl MockConnection {
        fn open() -> Self {
            Self {
                closed: false,
                holdability: db::HOLD_CURSORS_OVER_COMMIT,
                isolation: db::TRANSACTION_READ_COMMITTED,
                sql_state_type: db::SQL_STATE_SQL,
                accesses: AtomicUsize::new(0),
            }
        }

        fn touch(&self) {
            self.accesses.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl DatabaseConnection for MockConnection {
        fn is_closed(&self) -> bool {
            self.closed
        }

        fn catalog(&self) -> Result<String, DbError> {
            self.touch();
            Ok("app".to_string())
        }

        fn schema(&self) -> Result<String, DbError> {
            self.touch();
            Err(DbError::Unsupported("schema"))
        }

        fn auto_commit(&self) -> Result<bool, DbError> {
            self.touch();
            Ok(true)
        }

        fn read_only(&self) -> Result<bool, DbError> {
            self.touch();
            Ok(false)
        }

        fn holdability(&self) -> Result<i32, DbError> {
            self.touch();
            Ok(self.holdability)
        }

        fn transaction_isolation(&self) -> Result<i32, DbError> {
            self.touch();
            Ok(self.isolation)
        }

        fn network_timeout(&self) -> Result<Option<Duration>, DbError> {
            self.touch();
            Ok(Some(Duration::from_secs(30)))
        }

        fn client_info(&self) -> Result<BTreeMap<String, String>, DbError> {
            self.touch();
            Ok(BTreeMap::from([
                ("ApplicationName".to_string(), "billing".to_string()),
                ("password".to_string(), "hunter2".to_string()),
            ]))
        }

        fn type_map(&self) -> Result<BTreeMap<String, String>, DbError> {
            self.touch();
            Ok(db::default_type_map())
        }

        fn metadata(&self) -> Result<ConnectionMetadata, DbError> {
            self.touch();
            Ok(ConnectionMetadata {
                product_name: "PostgreSQL".to_string(),
                product_version: "16.2".to_string(),
                driver_name: "rust-postgres".to_string(),
                driver_version: "0.19".to_string(),
                url: "postgresql://db:5432/app".to_string(),
                user_name: "app".to_string(),
                sql_state_type: self.sql_state_type,
                max_connections: Some(100),
            })
        }
    }

    fn run(conn: MockConnection, type_map: bool) -> (String, Arc<MockConnection>) {
        let conn = Arc::new(conn);
        let (sink, dyn_sink) = capture();
        let report = ConnectionReport::new(dyn_sink, conn.clone(), Redactor::default(), type_map);
        (output(&sink, &report), conn)
    }

    #[test]
    fn test_closed_connection_touches_nothing() {
        let (text, conn) = run(
            MockConnection {
                closed: true,
                ..MockConnection::open()
            },
            true,
        );
        assert_eq!(text, "Database Connection:\n  - Closed!");
        assert_eq!(conn.accesses.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_open_connection() {
        let (text, _) = run(MockConnection::open(), false);

        assert_line(&text, "  - catalog: app");
        assert_line(&text, "  - schema: error (schema not supported)");
        assert_line(&text, "  - holdability: hold cursors over commit;");
        assert_line(&text, "  - transaction isolation: read committed;");
        assert_line(&text, "  - network timeout: 30000ms");
        assert_line(&text, "      ApplicationName: billing");
        assert_line(&text, "      password: ********");
        assert_line(&text, "  - database: PostgreSQL 16.2");
        assert_line(&text, "  - sql state type: SQL:2003;");
        assert!(!text.contains("hunter2"));
        assert!(!text.contains("type map"));
    }

    #[test]
    fn test_unknown_codes() {
        let (text, _) = run(
            MockConnection {
                holdability: 7,
                isolation: 3,
                sql_state_type: 0,
                ..MockConnection::open()
            },
            false,
        );
        assert_line(&text, "  - holdability: unknown;");
        assert_line(&text, "  - transaction isolation: unknown;");
        assert_line(&text, "  - sql state type: unknown;");
    }

    #[test]
    fn test_type_map_uses_simple_names() {
        let (text, _) = run(MockConnection::open(), true);
        assert_line(&text, "  - type map:");
        assert_line(&text, "      text: String");
        assert_line(&text, "      _text: Vec<String>");
        assert_line(&text, "      inet: IpAddr");
        assert!(!text.contains("alloc::"));
    }
}
