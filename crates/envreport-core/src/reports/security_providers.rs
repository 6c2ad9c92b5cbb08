use std::sync::Arc;

use crate::collector::Environment;
use crate::redact::Redactor;
use crate::report::{Report, ReportKind};
use crate::sink::{InfoWriter, LogSink};
use crate::tls::{BACKEND_SERVICES, backend_name};

const SERVICES_PER_LINE: usize = 5;

/// Prefixes of variables that steer the TLS backend.
const TLS_VARIABLE_PREFIXES: [&str; 3] = ["SSL", "OPENSSL_", "TLS_"];

/// The TLS provider, what it offers, and the environment that configures it.
pub struct SecurityProvidersReport {
    sink: Arc<dyn LogSink>,
    env: Arc<Environment>,
    redactor: Redactor,
}

impl SecurityProvidersReport {
    pub fn new(sink: Arc<dyn LogSink>, env: Arc<Environment>, redactor: Redactor) -> Self {
        Self {
            sink,
            env,
            redactor,
        }
    }
}

impl Report for SecurityProvidersReport {
    fn kind(&self) -> ReportKind {
        ReportKind::SecurityProviders
    }

    fn run(&self) {
        let Some(mut w) = InfoWriter::open(&self.sink) else {
            return;
        };
        w.title(self.kind().title());
        w.wrapped(backend_name(), &BACKEND_SERVICES[..], SERVICES_PER_LINE);

        let vars: Vec<(&str, &str)> = self
            .env
            .iter()
            .filter(|(name, _)| TLS_VARIABLE_PREFIXES.iter().any(|p| name.starts_with(p)))
            .collect();
        if vars.is_empty() {
            w.entry("tls environment", "none");
            return;
        }
        w.item("tls environment:");
        for (name, value) in vars {
            w.nested(name, self.redactor.render(name, value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::testing::{capture, output};

    #[test]
    fn test_security_providers_report() {
        let env = Environment::from_pairs([
            ("SSL_CERT_FILE", "/opt/ca.pem"),
            ("SSLKEYLOGFILE", "/tmp/keys"),
            ("OPENSSL_CONF", "/etc/ssl/openssl.cnf"),
            ("TLS_PRIVATE_KEY", "-----BEGIN"),
            ("HOME", "/root"),
        ]);
        let (sink, dyn_sink) = capture();
        let report = SecurityProvidersReport::new(dyn_sink, Arc::new(env), Redactor::default());

        assert_eq!(
            output(&sink, &report),
            format!(
                "Security Providers:\n\
                 \x20 - {}: TLS client, TLS server, X.509 certificates, PEM certificates, PKCS#12 identities\n\
                 \x20     PKCS#8 keys, ALPN, SNI, hostname verification\n\
                 \x20 - tls environment:\n\
                 \x20     OPENSSL_CONF: /etc/ssl/openssl.cnf\n\
                 \x20     SSLKEYLOGFILE: ********\n\
                 \x20     SSL_CERT_FILE: /opt/ca.pem\n\
                 \x20     TLS_PRIVATE_KEY: ********",
                backend_name()
            )
        );
    }

    #[test]
    fn test_no_tls_environment() {
        let (sink, dyn_sink) = capture();
        let report = SecurityProvidersReport::new(
            dyn_sink,
            Arc::new(Environment::from_pairs([("HOME", "/root")])),
            Redactor::default(),
        );
        let text = output(&sink, &report);
        assert!(text.ends_with("\n  - tls environment: none"));
    }
}
