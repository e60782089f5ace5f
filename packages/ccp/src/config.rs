//! Client configuration and constants.

use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::error::{CcpError, Result};

/// Path of the Accounts endpoint, relative to the CCP base URL.
pub const ACCOUNTS_PATH: &str = "/AIMWebService/api/Accounts";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string identifying this client.
pub const USER_AGENT: &str = concat!("cyberark-ccp/", env!("CARGO_PKG_VERSION"));

/// Environment variable holding the CCP base URL.
pub const ENV_URL: &str = "CYBERARK_CCP_URL";
/// Environment variable holding the application ID.
pub const ENV_APP_ID: &str = "CYBERARK_CCP_APP_ID";
/// Environment variable holding the client certificate path.
pub const ENV_CERT_PATH: &str = "CYBERARK_CCP_CERT_PATH";
/// Environment variable holding `true`, `false`, or a CA bundle path.
pub const ENV_VERIFY: &str = "CYBERARK_CCP_VERIFY";
/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT: &str = "CYBERARK_CCP_TIMEOUT";

/// Server certificate verification mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// Verify against the built-in root store.
    #[default]
    Enabled,
    /// Accept any server certificate. Only meant for development setups.
    Disabled,
    /// Verify against the PEM CA bundle at this path.
    CaBundle(PathBuf),
}

impl From<bool> for TlsVerification {
    fn from(verify: bool) -> Self {
        if verify {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

impl From<PathBuf> for TlsVerification {
    fn from(path: PathBuf) -> Self {
        Self::CaBundle(path)
    }
}

impl TlsVerification {
    /// Parse `true`/`false` or treat the value as a CA bundle path.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("true") {
            Self::Enabled
        } else if value.eq_ignore_ascii_case("false") {
            Self::Disabled
        } else {
            Self::CaBundle(PathBuf::from(value))
        }
    }
}

/// Immutable settings for a [`CcpClient`](crate::client::CcpClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    endpoint: Url,
    app_id: String,
    cert_path: Option<PathBuf>,
    verify: TlsVerification,
    timeout_secs: u64,
}

impl ClientConfig {
    /// Start building a configuration.
    pub fn builder(base_url: impl Into<String>, app_id: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            base_url: base_url.into(),
            app_id: app_id.into(),
            cert_path: None,
            verify: TlsVerification::Enabled,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `CYBERARK_CCP_URL` and `CYBERARK_CCP_APP_ID` are required.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration from a variable lookup using the `CYBERARK_CCP_*`
    /// names. An empty cert path counts as unset.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url =
            var(ENV_URL).ok_or_else(|| CcpError::Config(format!("{ENV_URL} not set")))?;
        let app_id =
            var(ENV_APP_ID).ok_or_else(|| CcpError::Config(format!("{ENV_APP_ID} not set")))?;

        let mut builder = Self::builder(base_url, app_id);

        if let Some(cert_path) = var(ENV_CERT_PATH).filter(|p| !p.trim().is_empty()) {
            builder = builder.cert_path(cert_path);
        }

        if let Some(verify) = var(ENV_VERIFY) {
            builder = builder.verify(TlsVerification::parse(&verify));
        }

        if let Some(timeout) = var(ENV_TIMEOUT) {
            let secs = timeout.trim().parse().map_err(|_| {
                CcpError::Config(format!("{ENV_TIMEOUT} must be a positive integer, got '{timeout}'"))
            })?;
            builder = builder.timeout_secs(secs);
        }

        builder.build()
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of the Accounts endpoint, without query parameters.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn cert_path(&self) -> Option<&Path> {
        self.cert_path.as_deref()
    }

    pub fn verify(&self) -> &TlsVerification {
        &self.verify
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    base_url: String,
    app_id: String,
    cert_path: Option<PathBuf>,
    verify: TlsVerification,
    timeout_secs: u64,
}

impl ClientConfigBuilder {
    pub fn cert_path(mut self, cert_path: impl Into<PathBuf>) -> Self {
        self.cert_path = Some(cert_path.into());
        self
    }

    pub fn verify(mut self, verify: impl Into<TlsVerification>) -> Self {
        self.verify = verify.into();
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Validate the settings and derive the endpoint URL.
    ///
    /// The application ID is not checked here; an empty one is rejected on
    /// every call instead.
    pub fn build(self) -> Result<ClientConfig> {
        let base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(CcpError::Config("base URL must not be empty".into()));
        }

        let endpoint = Url::parse(&format!("{base_url}{ACCOUNTS_PATH}"))
            .map_err(|e| CcpError::Config(format!("invalid base URL '{base_url}': {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(CcpError::Config(format!(
                "unsupported URL scheme '{}': expected http or https",
                endpoint.scheme()
            )));
        }

        if self.timeout_secs == 0 {
            return Err(CcpError::Config("timeout must be a positive number of seconds".into()));
        }

        Ok(ClientConfig {
            base_url,
            endpoint,
            app_id: self.app_id,
            cert_path: self.cert_path,
            verify: self.verify,
            timeout_secs: self.timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::builder("https://test.com", "MyApp").build().unwrap();
        assert_eq!(config.base_url(), "https://test.com");
        assert_eq!(config.app_id(), "MyApp");
        assert_eq!(config.verify(), &TlsVerification::Enabled);
        assert_eq!(config.timeout_secs(), 30);
        assert!(config.cert_path().is_none());
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let config = ClientConfig::builder("https://test.com/", "MyApp")
            .cert_path("/path/to/cert.pem")
            .verify(false)
            .timeout_secs(60)
            .build()
            .unwrap();
        assert_eq!(config.base_url(), "https://test.com");
        assert_eq!(
            config.endpoint().as_str(),
            "https://test.com/AIMWebService/api/Accounts"
        );
        assert_eq!(config.cert_path(), Some(Path::new("/path/to/cert.pem")));
        assert_eq!(config.verify(), &TlsVerification::Disabled);
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_base_url_with_prefix_path() {
        let config = ClientConfig::builder("https://test.com/ccp//", "MyApp").build().unwrap();
        assert_eq!(
            config.endpoint().as_str(),
            "https://test.com/ccp/AIMWebService/api/Accounts"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ClientConfig::builder("", "MyApp").build().is_err());
        assert!(ClientConfig::builder("not a url", "MyApp").build().is_err());
        assert!(ClientConfig::builder("ftp://test.com", "MyApp").build().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = ClientConfig::builder("https://test.com", "MyApp")
            .timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_tls_verification_parse() {
        assert_eq!(TlsVerification::parse("true"), TlsVerification::Enabled);
        assert_eq!(TlsVerification::parse("FALSE"), TlsVerification::Disabled);
        assert_eq!(
            TlsVerification::parse("/etc/ssl/ca.pem"),
            TlsVerification::CaBundle(PathBuf::from("/etc/ssl/ca.pem"))
        );
        // Only true/false are booleans; anything else is a bundle path
        assert_eq!(
            TlsVerification::parse("yes"),
            TlsVerification::CaBundle(PathBuf::from("yes"))
        );
        assert_eq!(
            TlsVerification::parse("0"),
            TlsVerification::CaBundle(PathBuf::from("0"))
        );
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_from_vars() {
        let config = ClientConfig::from_vars(vars(&[
            (ENV_URL, "https://ccp.example.com/"),
            (ENV_APP_ID, "MyApp"),
            (ENV_VERIFY, "false"),
            (ENV_TIMEOUT, "12"),
            (ENV_CERT_PATH, ""),
        ]))
        .unwrap();
        assert_eq!(config.base_url(), "https://ccp.example.com");
        assert_eq!(config.app_id(), "MyApp");
        assert_eq!(config.verify(), &TlsVerification::Disabled);
        assert_eq!(config.timeout_secs(), 12);
        assert!(config.cert_path().is_none());
    }

    #[test]
    fn test_from_vars_defaults_and_cert_path() {
        let config = ClientConfig::from_vars(vars(&[
            (ENV_URL, "https://ccp.example.com"),
            (ENV_APP_ID, "MyApp"),
            (ENV_CERT_PATH, "/etc/ccp/client.pem"),
        ]))
        .unwrap();
        assert_eq!(config.verify(), &TlsVerification::Enabled);
        assert_eq!(config.timeout_secs(), DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.cert_path(), Some(Path::new("/etc/ccp/client.pem")));
    }

    #[test]
    fn test_from_vars_missing_required() {
        let err = ClientConfig::from_vars(vars(&[(ENV_APP_ID, "MyApp")])).unwrap_err();
        assert_eq!(err.to_string(), "configuration error: CYBERARK_CCP_URL not set");

        let err = ClientConfig::from_vars(vars(&[(ENV_URL, "https://ccp.example.com")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "configuration error: CYBERARK_CCP_APP_ID not set");
    }

    #[test]
    fn test_from_vars_bad_timeout() {
        for timeout in ["abc", "-5", "0"] {
            let err = ClientConfig::from_vars(vars(&[
                (ENV_URL, "https://ccp.example.com"),
                (ENV_APP_ID, "MyApp"),
                (ENV_TIMEOUT, timeout),
            ]))
            .unwrap_err();
            assert_eq!(err.kind(), crate::error::ErrorKind::Configuration, "{timeout}");
        }
    }

    #[test]
    fn test_from_env_reads_process_environment() {
        // Other unit tests always pass --url and --app-id explicitly
        std::env::set_var(ENV_URL, "https://env.example.com");
        std::env::set_var(ENV_APP_ID, "EnvApp");
        std::env::remove_var(ENV_CERT_PATH);
        std::env::remove_var(ENV_VERIFY);
        std::env::remove_var(ENV_TIMEOUT);

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.base_url(), "https://env.example.com");
        assert_eq!(config.app_id(), "EnvApp");
        assert_eq!(config.timeout_secs(), DEFAULT_TIMEOUT_SECS);
    }
}
