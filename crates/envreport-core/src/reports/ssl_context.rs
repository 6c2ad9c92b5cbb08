use std::sync::Arc;

use crate::report::{Report, ReportKind};
use crate::sink::{InfoWriter, LogSink};
use crate::tls::{CONTEXT_NAMES, TlsContextFactory};

/// Which TLS client contexts can be built, and their protocol bounds.
pub struct SslContextReport {
    sink: Arc<dyn LogSink>,
    factory: Arc<dyn TlsContextFactory>,
}

impl SslContextReport {
    pub fn new(sink: Arc<dyn LogSink>, factory: Arc<dyn TlsContextFactory>) -> Self {
        Self { sink, factory }
    }
}

impl Report for SslContextReport {
    fn kind(&self) -> ReportKind {
        ReportKind::SslContext
    }

    fn run(&self) {
        let Some(mut w) = InfoWriter::open(&self.sink) else {
            return;
        };
        w.title(self.kind().title());

        for name in CONTEXT_NAMES {
            match self.factory.create(name) {
                Ok(info) => {
                    w.item(format!("{}:", name));
                    w.nested("provider", &info.provider);
                    w.nested(
                        "min protocol",
                        info.min_protocol.as_deref().unwrap_or("default"),
                    );
                    w.nested(
                        "max protocol",
                        info.max_protocol.as_deref().unwrap_or("default"),
                    );
                }
                Err(e) => w.entry(name, format!("failed ({})", e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::testing::{assert_line, capture, output};
    use crate::tls::{TlsContextError, TlsContextInfo};

    /// Knows every name except SSLv2; refuses SSLv3 at the backend.
    struct FakeFactory;

    impl TlsContextFactory for FakeFactory {
        fn create(&self, name: &str) -> Result<TlsContextInfo, TlsContextError> {
            match name {
                "SSLv2" => Err(TlsContextError::NoSuchProtocol(name.to_string())),
                "SSLv3" => Err(TlsContextError::Backend("protocol disabled".to_string())),
                _ => Ok(TlsContextInfo {
                    name: name.to_string(),
                    provider: "FakeTLS".to_string(),
                    min_protocol: (name != "Default").then(|| name.to_string()),
                    max_protocol: None,
                }),
            }
        }
    }

    #[test]
    fn test_unsupported_contexts_degrade_per_name() {
        let (sink, dyn_sink) = capture();
        let text = output(&sink, &SslContextReport::new(dyn_sink, Arc::new(FakeFactory)));

        assert!(text.starts_with("SSL Context:\n"));
        assert_line(&text, "  - SSLv2: failed (no such protocol: SSLv2)");
        assert_line(&text, "  - SSLv3: failed (protocol disabled)");
        for name in ["Default", "SSL", "TLS", "TLSv1", "TLSv1.1", "TLSv1.2"] {
            assert_line(&text, &format!("  - {}:", name));
        }
        assert_line(&text, "      min protocol: default");
        assert_line(&text, "      min protocol: TLSv1.2");
        // TLSv1.2 comes last even though earlier names failed.
        assert!(text.ends_with("      max protocol: default"));
    }

    #[test]
    fn test_native_factory_reports_sslv2_failure() {
        let (sink, dyn_sink) = capture();
        let report = SslContextReport::new(dyn_sink, Arc::new(crate::tls::NativeTlsFactory));
        let text = output(&sink, &report);
        assert_line(&text, "  - SSLv2: failed (no such protocol: SSLv2)");
        assert!(text.contains("TLSv1.2"));
    }
}
