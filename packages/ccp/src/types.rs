//! Core data types for the CCP client.
//!
//! [`SearchParameters`] describes a single lookup, [`AccountResult`] is what
//! the CCP hands back on success.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// How the CCP interprets a free-form `Query`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryFormat {
    /// Property values must match exactly (upstream default).
    #[default]
    Exact,

    /// Property values are regular expressions.
    Regexp,
}

impl QueryFormat {
    /// Get the wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "Exact",
            Self::Regexp => "Regexp",
        }
    }
}

impl FromStr for QueryFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("exact") {
            Ok(Self::Exact)
        } else if s.eq_ignore_ascii_case("regexp") {
            Ok(Self::Regexp)
        } else {
            Err(ValidationError::InvalidQueryFormat(s.to_string()))
        }
    }
}

impl std::fmt::Display for QueryFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a loosely-typed connection timeout.
///
/// Only strictly positive integers are accepted; anything else is rejected
/// rather than passed through to the CCP.
///
/// # Examples
/// ```
/// use cyberark_ccp::types::parse_connection_timeout;
///
/// assert_eq!(parse_connection_timeout("60").ok(), Some(60));
/// assert!(parse_connection_timeout("0").is_err());
/// assert!(parse_connection_timeout("-1").is_err());
/// assert!(parse_connection_timeout("soon").is_err());
/// ```
pub fn parse_connection_timeout(value: &str) -> Result<u32, ValidationError> {
    match value.trim().parse::<u32>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ValidationError::InvalidConnectionTimeout(value.to_string())),
    }
}

/// Parse a loosely-typed boolean flag. Only `true` and `false` are accepted.
///
/// # Examples
/// ```
/// use cyberark_ccp::types::parse_flag;
///
/// assert_eq!(parse_flag("FailRequestOnPasswordChange", "TRUE").ok(), Some(true));
/// assert!(parse_flag("FailRequestOnPasswordChange", "yes").is_err());
/// ```
pub fn parse_flag(field: &'static str, value: &str) -> Result<bool, ValidationError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ValidationError::InvalidFlag {
            field,
            value: value.to_string(),
        })
    }
}

/// Search criteria and options for a single password retrieval.
///
/// Empty strings are treated the same as unset fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParameters {
    pub safe: Option<String>,
    /// Folder name (PAM self-hosted only).
    pub folder: Option<String>,
    /// Password object name.
    pub object: Option<String>,
    pub username: Option<String>,
    pub address: Option<String>,
    pub database: Option<String>,
    pub policy_id: Option<String>,
    /// Written to the Credential Provider audit log.
    pub reason: Option<String>,
    /// Free query on account properties. Overrides the discrete search fields.
    pub query: Option<String>,
    pub query_format: Option<QueryFormat>,
    /// Seconds the CCP keeps trying to reach the Vault.
    pub connection_timeout: Option<u32>,
    pub fail_request_on_password_change: Option<bool>,
}

impl SearchParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn safe(mut self, safe: impl Into<String>) -> Self {
        self.safe = Some(safe.into());
        self
    }

    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn policy_id(mut self, policy_id: impl Into<String>) -> Self {
        self.policy_id = Some(policy_id.into());
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn query_format(mut self, query_format: QueryFormat) -> Self {
        self.query_format = Some(query_format);
        self
    }

    pub fn connection_timeout(mut self, secs: u32) -> Self {
        self.connection_timeout = Some(secs);
        self
    }

    pub fn fail_request_on_password_change(mut self, fail: bool) -> Self {
        self.fail_request_on_password_change = Some(fail);
        self
    }

    /// Discrete search fields paired with their upstream parameter names.
    ///
    /// These are the fields a `Query` suppresses.
    pub fn search_fields(&self) -> [(&'static str, Option<&str>); 7] {
        [
            ("Safe", non_empty(&self.safe)),
            ("Folder", non_empty(&self.folder)),
            ("Object", non_empty(&self.object)),
            ("UserName", non_empty(&self.username)),
            ("Address", non_empty(&self.address)),
            ("Database", non_empty(&self.database)),
            ("PolicyID", non_empty(&self.policy_id)),
        ]
    }

    /// The free query, if set and non-empty.
    pub fn query_value(&self) -> Option<&str> {
        non_empty(&self.query)
    }

    /// The audit reason, if set and non-empty.
    pub fn reason_value(&self) -> Option<&str> {
        non_empty(&self.reason)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Account returned by a successful CCP lookup.
///
/// The CCP only returns properties that exist on the account, so every field
/// is optional.
///
/// NOTE: `Debug` is implemented by hand so that `content` never ends up in
/// logs.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountResult {
    /// The secret.
    #[serde(rename = "Content", default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(rename = "UserName", default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(rename = "Address", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(rename = "Database", default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    #[serde(
        rename = "PasswordChangeInProcess",
        default,
        deserialize_with = "deserialize_loose_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub password_change_in_process: Option<bool>,

    /// Any other account properties (`Folder`, `Name`, `PolicyID`, ...).
    #[serde(flatten)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl std::fmt::Debug for AccountResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountResult")
            .field("content", &self.content.as_ref().map(|_| "<redacted>"))
            .field("username", &self.username)
            .field("address", &self.address)
            .field("database", &self.database)
            .field("password_change_in_process", &self.password_change_in_process)
            .field("properties", &self.properties)
            .finish()
    }
}

/// The CCP sends `PasswordChangeInProcess` as `"False"`/`"True"` on some
/// versions and as a JSON boolean on others.
fn deserialize_loose_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LooseBool {
        Bool(bool),
        Text(String),
    }

    match Option::<LooseBool>::deserialize(deserializer)? {
        None => Ok(None),
        Some(LooseBool::Bool(b)) => Ok(Some(b)),
        Some(LooseBool::Text(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(LooseBool::Text(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(LooseBool::Text(s)) => Err(serde::de::Error::custom(format!(
            "invalid PasswordChangeInProcess value '{s}'"
        ))),
    }
}
