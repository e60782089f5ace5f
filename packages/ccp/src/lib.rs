//! CyberArk CCP client - Retrieve passwords from the Central Credential Provider.
//!
//! This crate talks to the CCP `AIMWebService/api/Accounts` REST endpoint.
//! Search parameters are validated locally, serialized into the query string
//! the CCP expects, and the response is classified into either an
//! [`AccountResult`] or a [`CcpError`] with a specific [`ErrorKind`].
//!
//! # Example
//!
//! ```
//! use cyberark_ccp::{build, validate, ClientConfig, SearchParameters};
//!
//! let config = ClientConfig::builder("https://ccp.example.com", "MyApp").build().unwrap();
//! let params = SearchParameters::new().safe("Production").object("db-admin");
//!
//! let url = build(&config, &validate(&config, params).unwrap());
//! assert_eq!(
//!     url.as_str(),
//!     "https://ccp.example.com/AIMWebService/api/Accounts?AppID=MyApp&Safe=Production&Object=db-admin"
//! );
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Client configuration and constants
//! - [`types`]: Search parameters and account result
//! - [`validate`]: Pre-flight parameter validation
//! - [`request`]: Request URL construction
//! - [`classify`]: Vendor error table and response classification
//! - [`error`]: Error types and Result alias
//! - [`http`]: Transport trait and reqwest implementation
//! - [`client`]: The client façade
//! - [`cli`]: Command-line interface

pub mod classify;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod request;
pub mod types;
pub mod validate;

pub use classify::{classify, ClientOutcome};
pub use client::CcpClient;
pub use config::{ClientConfig, TlsVerification};
pub use error::{CcpError, ErrorKind, Result, ServerFailure, TransportError, ValidationError};
pub use http::{HttpResponse, HttpTransport, Transport};
pub use request::build;
pub use types::{AccountResult, QueryFormat, SearchParameters};
pub use validate::{validate, ValidatedParams};
