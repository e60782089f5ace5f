//! Client façade for the CCP Accounts endpoint.

use tracing::{debug, warn};

use crate::classify::{classify, ClientOutcome};
use crate::config::ClientConfig;
use crate::error::{CcpError, ErrorKind, Result, ServerFailure};
use crate::http::{HttpTransport, Transport};
use crate::request::build;
use crate::types::{AccountResult, SearchParameters};
use crate::validate::validate;

/// CCP client.
///
/// Holds the immutable configuration and one transport for its whole
/// lifetime. Each call validates the parameters, builds the request URL,
/// performs a single GET and classifies the response. Nothing is retried.
///
/// The session is released when the client is dropped or [`close`]d.
///
/// [`close`]: CcpClient::close
pub struct CcpClient<T: Transport = HttpTransport> {
    config: ClientConfig,
    transport: T,
}

impl CcpClient<HttpTransport> {
    /// Create a client with the production HTTP transport.
    ///
    /// Client certificate and CA bundle are loaded here and applied to every
    /// request made by this client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> CcpClient<T> {
    /// Create a client around an existing transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Retrieve the account matching `params`.
    ///
    /// Validation failures are returned before any network I/O.
    pub fn get_account(&self, params: SearchParameters) -> Result<AccountResult> {
        let validated = validate(&self.config, params)?;
        let url = build(&self.config, &validated);

        debug!(url = %url, "Requesting account from CCP");
        let response = self.transport.get(&url, self.config.timeout())?;
        debug!(status = response.status, "CCP responded");

        match classify(response.status, &response.body) {
            ClientOutcome::Success(account) => Ok(account),
            ClientOutcome::Failure(failure) => {
                warn!(
                    kind = %failure.kind,
                    status = failure.status,
                    code = failure.code.as_deref().unwrap_or("-"),
                    "CCP request failed"
                );
                Err(failure.into())
            }
        }
    }

    /// Retrieve only the password of the account matching `params`.
    ///
    /// A successful response without `Content` is reported as an invalid
    /// response rather than an empty password.
    pub fn get_password(&self, params: SearchParameters) -> Result<String> {
        let account = self.get_account(params)?;
        account.content.ok_or_else(|| {
            CcpError::Server(ServerFailure {
                kind: ErrorKind::InvalidResponse,
                status: 200,
                code: None,
                message: "CCP response did not contain a Content property".to_string(),
            })
        })
    }

    /// Release the session.
    pub fn close(self) {
        drop(self);
    }
}

impl<T: Transport> Drop for CcpClient<T> {
    fn drop(&mut self) {
        debug!(base_url = self.config.base_url(), "Closing CCP client session");
    }
}

impl<T: Transport> std::fmt::Debug for CcpClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CcpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
