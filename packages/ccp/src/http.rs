//! HTTP transport for talking to the CCP.
//!
//! The client only needs a single GET primitive, expressed by [`Transport`].
//! [`HttpTransport`] implements it on top of a blocking `reqwest` client that
//! is configured once with the client certificate and CA trust settings.

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::{Certificate, Identity};
use url::Url;

use crate::config::{ClientConfig, TlsVerification, USER_AGENT};
use crate::error::{CcpError, Result, TransportError};

/// Raw response handed back by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// A blocking HTTP GET primitive.
///
/// Implementations own their connection pool and TLS setup. The timeout is
/// passed per call and bounds the whole request.
pub trait Transport: Send + Sync {
    fn get(&self, url: &Url, timeout: Duration) -> std::result::Result<HttpResponse, TransportError>;
}

/// Production transport backed by `reqwest::blocking::Client`.
///
/// The underlying client keeps a connection pool, so one transport should be
/// reused for all calls of a [`CcpClient`](crate::client::CcpClient).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport from the TLS settings in `config`.
    ///
    /// The client certificate and CA bundle are read here, once.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT);

        if let Some(cert_path) = config.cert_path() {
            builder = builder.identity(load_identity(cert_path)?);
        }

        match config.verify() {
            TlsVerification::Enabled => {}
            TlsVerification::Disabled => {
                tracing::warn!("TLS certificate verification is disabled");
                builder = builder.danger_accept_invalid_certs(true);
            }
            TlsVerification::CaBundle(path) => {
                for cert in load_ca_bundle(path)? {
                    builder = builder.add_root_certificate(cert);
                }
            }
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url, timeout: Duration) -> std::result::Result<HttpResponse, TransportError> {
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                TransportError::Timeout {
                    secs: timeout.as_secs(),
                }
            } else if e.is_connect() {
                TransportError::Connect(Box::new(e))
            } else {
                TransportError::Request(Box::new(e))
            }
        };

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .map_err(map_err)?;

        let status = response.status().as_u16();
        let body = response.bytes().map_err(map_err)?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| CcpError::Certificate {
        path: path.to_path_buf(),
        source: Box::new(e),
    })
}

/// Load a PEM client identity (certificate chain plus private key).
fn load_identity(path: &Path) -> Result<Identity> {
    let is_pkcs12 = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("p12") || ext.eq_ignore_ascii_case("pfx"));
    if is_pkcs12 {
        return Err(CcpError::Config(format!(
            "PKCS#12 client certificates are not supported ({}); convert to PEM with the key included",
            path.display()
        )));
    }

    let pem = read_file(path)?;
    Identity::from_pem(&pem).map_err(|e| CcpError::Certificate {
        path: path.to_path_buf(),
        source: Box::new(e),
    })
}

/// Load every certificate in a PEM CA bundle.
fn load_ca_bundle(path: &Path) -> Result<Vec<Certificate>> {
    let pem = read_file(path)?;
    let certs = Certificate::from_pem_bundle(&pem).map_err(|e| CcpError::Certificate {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    if certs.is_empty() {
        return Err(CcpError::Certificate {
            path: path.to_path_buf(),
            source: "no certificates found in CA bundle".into(),
        });
    }
    Ok(certs)
}

/// Test utilities for the transport.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Mock transport for testing. Returns pre-configured responses in order
    /// and records every requested URL.
    pub struct MockTransport {
        responses: Mutex<Vec<std::result::Result<HttpResponse, TransportError>>>,
        requests: Mutex<Vec<(Url, Duration)>>,
    }

    impl MockTransport {
        pub fn new(responses: Vec<std::result::Result<HttpResponse, TransportError>>) -> Self {
            // Reverse so we can pop from the end
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn with_response(status: u16, body: &str) -> Self {
            Self::new(vec![Ok(HttpResponse {
                status,
                body: body.as_bytes().to_vec(),
            })])
        }

        pub fn with_json(status: u16, body: &serde_json::Value) -> Self {
            Self::with_response(status, &body.to_string())
        }

        pub fn with_error(error: TransportError) -> Self {
            Self::new(vec![Err(error)])
        }

        /// URLs and timeouts requested so far.
        pub fn requests(&self) -> Vec<(Url, Duration)> {
            self.requests
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone()
        }
    }

    impl Transport for MockTransport {
        fn get(
            &self,
            url: &Url,
            timeout: Duration,
        ) -> std::result::Result<HttpResponse, TransportError> {
            self.requests
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push((url.clone(), timeout));
            self.responses
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop()
                .unwrap_or_else(|| Err(TransportError::Request("no more mock responses".into())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config() -> crate::config::ClientConfigBuilder {
        ClientConfig::builder("https://ccp.example.com", "TestApp")
    }

    fn fixture(name: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    #[test]
    fn test_create_transport() {
        let transport = HttpTransport::new(&config().build().unwrap());
        assert!(transport.is_ok());
    }

    #[test]
    fn test_create_transport_without_verification() {
        let transport = HttpTransport::new(&config().verify(false).build().unwrap());
        assert!(transport.is_ok());
    }

    #[test]
    fn test_missing_client_certificate() {
        let config = config().cert_path("/nonexistent/client.pem").build().unwrap();
        let err = HttpTransport::new(&config).unwrap_err();
        assert!(matches!(err, CcpError::Certificate { .. }));
        assert!(err.to_string().contains("/nonexistent/client.pem"));
    }

    #[test]
    fn test_pem_identity_and_ca_bundle() {
        let config = config()
            .cert_path(fixture("client.pem"))
            .verify(fixture("ca.pem"))
            .build()
            .unwrap();
        assert!(HttpTransport::new(&config).is_ok());
    }

    #[test]
    fn test_ca_bundle_alone() {
        let config = config().verify(fixture("ca.pem")).build().unwrap();
        assert!(HttpTransport::new(&config).is_ok());
    }

    #[test]
    fn test_identity_without_private_key() {
        let config = config().cert_path(fixture("ca.pem")).build().unwrap();
        let err = HttpTransport::new(&config).unwrap_err();
        assert!(matches!(err, CcpError::Certificate { .. }));
        assert!(err.to_string().contains("ca.pem"));
    }

    #[test]
    fn test_pkcs12_certificate_rejected() {
        let config = config().cert_path("/path/to/cert.p12").build().unwrap();
        let err = HttpTransport::new(&config).unwrap_err();
        assert!(err.to_string().contains("PKCS#12"));
    }

    #[test]
    fn test_garbage_ca_bundle() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not a certificate").unwrap();
        let config = config()
            .verify(file.path().to_path_buf())
            .build()
            .unwrap();
        let err = HttpTransport::new(&config).unwrap_err();
        assert!(matches!(err, CcpError::Certificate { .. }));
    }

    #[test]
    fn test_mock_transport_records_requests() {
        let transport = test_support::MockTransport::with_response(200, "{}");
        let url = Url::parse("https://ccp.example.com/AIMWebService/api/Accounts?AppID=A").unwrap();
        let response = transport.get(&url, Duration::from_secs(5)).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(transport.requests(), vec![(url.clone(), Duration::from_secs(5))]);
        assert!(transport.get(&url, Duration::from_secs(5)).is_err());
    }
}
