use std::path::Path;
use std::sync::Arc;

use crate::collector::x509::{pem_certificates, summarize};
use crate::collector::{Environment, FileSystem, ParseError};
use crate::report::{Report, ReportKind, io_marker};
use crate::sink::{InfoWriter, LogSink};

/// CA bundle locations of common distributions, probed in order.
const BUNDLE_PATHS: [&str; 5] = [
    "/etc/ssl/certs/ca-certificates.crt",
    "/etc/pki/tls/certs/ca-bundle.crt",
    "/etc/ssl/ca-bundle.pem",
    "/etc/pki/tls/cacert.pem",
    "/etc/ssl/cert.pem",
];

/// Certificates the TLS stack trusts by default.
pub struct TrustStoreReport {
    sink: Arc<dyn LogSink>,
    fs: Arc<dyn FileSystem>,
    env: Arc<Environment>,
}

impl TrustStoreReport {
    pub fn new(sink: Arc<dyn LogSink>, fs: Arc<dyn FileSystem>, env: Arc<Environment>) -> Self {
        Self { sink, fs, env }
    }

    /// `SSL_CERT_FILE` if set, else the first well-known bundle that exists.
    fn locate(&self) -> Option<String> {
        if let Some(path) = self.env.get("SSL_CERT_FILE") {
            return Some(path.to_string());
        }
        BUNDLE_PATHS
            .iter()
            .find(|p| self.fs.exists(Path::new(p)))
            .map(|p| p.to_string())
    }
}

/// Splits bundle content into DER blobs; non-PEM content is one DER blob.
fn certificates(content: Vec<u8>) -> Vec<Result<Vec<u8>, ParseError>> {
    match String::from_utf8(content) {
        Ok(text) if text.contains("-----BEGIN") => pem_certificates(&text),
        Ok(text) => vec![Ok(text.into_bytes())],
        Err(e) => vec![Ok(e.into_bytes())],
    }
}

impl Report for TrustStoreReport {
    fn kind(&self) -> ReportKind {
        ReportKind::TrustStore
    }

    fn run(&self) {
        let Some(mut w) = InfoWriter::open(&self.sink) else {
            return;
        };
        w.title(self.kind().title());

        let Some(location) = self.locate() else {
            w.entry("location", "Not available");
            return;
        };
        w.entry("location", &location);

        let content = match self.fs.read(Path::new(&location)) {
            Ok(c) => c,
            Err(e) => {
                w.entry("certificates", io_marker(&e));
                return;
            }
        };

        let blocks = certificates(content);
        w.entry("certificates", blocks.len());
        for (i, block) in blocks.iter().enumerate() {
            match block.as_ref().map_err(Clone::clone).and_then(|der| summarize(der)) {
                Ok(cert) => {
                    w.item(format!("{}:", cert.subject));
                    w.nested("issuer", &cert.issuer);
                    w.nested("valid until", &cert.not_after);
                }
                Err(e) => w.entry(&format!("certificate #{}", i + 1), format!("n/a ({})", e)),
            }
        }
    }
}
