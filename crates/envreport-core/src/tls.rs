//! TLS context probing over `native-tls`.

use native_tls::{Protocol, TlsConnector};

/// Context names probed by the SSL context report, in report order.
pub const CONTEXT_NAMES: [&str; 8] = [
    "Default", "SSL", "SSLv2", "SSLv3", "TLS", "TLSv1", "TLSv1.1", "TLSv1.2",
];

/// Services every `native-tls` backend provides.
pub const BACKEND_SERVICES: [&str; 9] = [
    "TLS client",
    "TLS server",
    "X.509 certificates",
    "PEM certificates",
    "PKCS#12 identities",
    "PKCS#8 keys",
    "ALPN",
    "SNI",
    "hostname verification",
];

/// Failure to build one context.
#[derive(Debug, Clone, PartialEq)]
pub enum TlsContextError {
    /// The name does not map to any protocol the backend knows.
    NoSuchProtocol(String),
    /// The backend refused the configuration.
    Backend(String),
}

impl std::fmt::Display for TlsContextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TlsContextError::NoSuchProtocol(name) => write!(f, "no such protocol: {}", name),
            TlsContextError::Backend(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for TlsContextError {}

/// Description of a context that was built successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct TlsContextInfo {
    pub name: String,
    pub provider: String,
    /// Lowest protocol accepted; `None` leaves the backend default.
    pub min_protocol: Option<String>,
    /// Highest protocol accepted; `None` leaves the backend default.
    pub max_protocol: Option<String>,
}

/// Builds TLS client contexts by name.
pub trait TlsContextFactory: Send + Sync {
    fn create(&self, name: &str) -> Result<TlsContextInfo, TlsContextError>;
}

/// Name of the platform TLS implementation behind `native-tls`.
pub fn backend_name() -> &'static str {
    if cfg!(any(target_os = "macos", target_os = "ios")) {
        "Security.framework"
    } else if cfg!(windows) {
        "SChannel"
    } else {
        "OpenSSL"
    }
}

/// Factory backed by `native_tls::TlsConnector`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeTlsFactory;

type Bounds = (Option<Protocol>, Option<Protocol>);

/// Protocol bounds for a context name; `None` if the name is unknown.
fn bounds(name: &str) -> Option<Bounds> {
    Some(match name {
        "Default" => (None, None),
        "SSL" => (Some(Protocol::Sslv3), None),
        "SSLv3" => (Some(Protocol::Sslv3), Some(Protocol::Sslv3)),
        "TLS" => (Some(Protocol::Tlsv10), None),
        "TLSv1" => (Some(Protocol::Tlsv10), Some(Protocol::Tlsv10)),
        "TLSv1.1" => (Some(Protocol::Tlsv11), Some(Protocol::Tlsv11)),
        "TLSv1.2" => (Some(Protocol::Tlsv12), Some(Protocol::Tlsv12)),
        _ => return None,
    })
}

fn protocol_name(p: Protocol) -> String {
    match p {
        Protocol::Sslv3 => "SSLv3".to_string(),
        Protocol::Tlsv10 => "TLSv1".to_string(),
        Protocol::Tlsv11 => "TLSv1.1".to_string(),
        Protocol::Tlsv12 => "TLSv1.2".to_string(),
        other => format!("{:?}", other),
    }
}

impl TlsContextFactory for NativeTlsFactory {
    fn create(&self, name: &str) -> Result<TlsContextInfo, TlsContextError> {
        let (min, max) =
            bounds(name).ok_or_else(|| TlsContextError::NoSuchProtocol(name.to_string()))?;
        TlsConnector::builder()
            .min_protocol_version(min)
            .max_protocol_version(max)
            .build()
            .map_err(|e| TlsContextError::Backend(e.to_string()))?;
        Ok(TlsContextInfo {
            name: name.to_string(),
            provider: backend_name().to_string(),
            min_protocol: min.map(protocol_name),
            max_protocol: max.map(protocol_name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sslv2_is_unknown() {
        assert_eq!(
            NativeTlsFactory.create("SSLv2"),
            Err(TlsContextError::NoSuchProtocol("SSLv2".to_string()))
        );
        assert!(matches!(
            NativeTlsFactory.create("QUIC"),
            Err(TlsContextError::NoSuchProtocol(_))
        ));
    }

    #[test]
    fn test_bounds_cover_all_names_but_sslv2() {
        for name in CONTEXT_NAMES {
            assert_eq!(bounds(name).is_some(), name != "SSLv2", "{}", name);
        }
    }

    #[test]
    fn test_protocol_names() {
        assert_eq!(protocol_name(Protocol::Tlsv10), "TLSv1");
        assert_eq!(protocol_name(Protocol::Tlsv12), "TLSv1.2");
    }

    #[test]
    fn test_error_display() {
        let e = TlsContextError::NoSuchProtocol("SSLv2".to_string());
        assert_eq!(e.to_string(), "no such protocol: SSLv2");
    }
}
