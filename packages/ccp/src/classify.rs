//! Response classification.
//!
//! Turns an HTTP status and body into either an [`AccountResult`] or a
//! [`ServerFailure`] whose [`ErrorKind`] is looked up from the CCP's
//! documented error codes.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Deserialize;

use crate::error::{ErrorKind, ServerFailure};
use crate::types::AccountResult;

/// Maximum number of body characters quoted in an invalid-response message.
const BODY_EXCERPT_CHARS: usize = 200;

/// A documented CCP error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorEntry {
    pub code: &'static str,
    /// HTTP status the CCP pairs this code with.
    pub status: u16,
    pub kind: ErrorKind,
    pub summary: &'static str,
}

const fn entry(code: &'static str, status: u16, kind: ErrorKind, summary: &'static str) -> ErrorEntry {
    ErrorEntry {
        code,
        status,
        kind,
        summary,
    }
}

/// Documented error codes of the Accounts endpoint.
pub const ERROR_TABLE: &[ErrorEntry] = &[
    entry("AIMWS030E", 400, ErrorKind::Validation, "Invalid query format"),
    entry("APPAP227E", 400, ErrorKind::NotFound, "Too many objects"),
    entry("APPAP228E", 400, ErrorKind::NotFound, "Too many objects"),
    entry("APPAP229E", 400, ErrorKind::NotFound, "Too many objects"),
    entry("APPAP007E", 400, ErrorKind::ConnectionFailure, "Connection to Vault failed"),
    entry("APPAP081E", 400, ErrorKind::Validation, "Request validation error"),
    entry("CASVL010E", 400, ErrorKind::Validation, "Request validation error"),
    entry("AIMWS031E", 400, ErrorKind::Validation, "Request validation error"),
    entry("APPAP306E", 403, ErrorKind::AuthenticationFailure, "Authentication failed"),
    entry("APPAP008E", 403, ErrorKind::AuthorizationFailure, "User not defined"),
    entry("APPAP004E", 404, ErrorKind::NotFound, "Safe not found"),
    entry("APPAP282E", 500, ErrorKind::Conflict, "Password change in progress"),
];

static ERROR_INDEX: LazyLock<HashMap<&'static str, &'static ErrorEntry>> =
    LazyLock::new(|| ERROR_TABLE.iter().map(|e| (e.code, e)).collect());

/// Look up a vendor error code.
pub fn lookup(code: &str) -> Option<&'static ErrorEntry> {
    ERROR_INDEX.get(code).copied()
}

/// Result of classifying a CCP response.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientOutcome {
    Success(AccountResult),
    Failure(ServerFailure),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "ErrorCode")]
    code: Option<String>,
    #[serde(rename = "ErrorMessage")]
    message: Option<String>,
}

/// Classify a CCP response.
///
/// Any 2xx body is parsed as an account. Otherwise the body is parsed as
/// `{ErrorCode, ErrorMessage}` and the code is looked up in [`ERROR_TABLE`].
/// Unknown codes, and known codes arriving with an unexpected status, fall
/// back to a kind derived from the status alone.
pub fn classify(status: u16, body: &[u8]) -> ClientOutcome {
    if (200..300).contains(&status) {
        return match serde_json::from_slice::<AccountResult>(body) {
            Ok(account) => ClientOutcome::Success(account),
            Err(e) => ClientOutcome::Failure(invalid_response(status, body, &e.to_string())),
        };
    }

    let error_body = match parse_error_body(body) {
        Ok(error_body) => error_body,
        Err(reason) => return ClientOutcome::Failure(invalid_response(status, body, &reason)),
    };

    let message = error_body
        .message
        .unwrap_or_else(|| "No message provided".to_string());
    let code = error_body.code;
    let code_label = code.as_deref().unwrap_or("Unknown");

    let (kind, summary) = match code.as_deref().and_then(lookup) {
        Some(entry) if entry.status == status => (entry.kind, entry.summary.to_string()),
        known => {
            if let Some(entry) = known {
                tracing::debug!(
                    code = entry.code,
                    expected_status = entry.status,
                    status,
                    "Error code arrived with unexpected status"
                );
            }
            status_fallback(status)
        }
    };

    let message = format!("{summary} ({code_label}): {message}");
    ClientOutcome::Failure(ServerFailure {
        kind,
        status,
        code,
        message,
    })
}

/// Parse `{ErrorCode, ErrorMessage}`. Only a JSON object is accepted;
/// serde would otherwise also take the fields from an array.
fn parse_error_body(body: &[u8]) -> Result<ErrorBody, String> {
    match serde_json::from_slice::<serde_json::Value>(body).map_err(|e| e.to_string())? {
        serde_json::Value::Object(map) => {
            serde_json::from_value(serde_json::Value::Object(map)).map_err(|e| e.to_string())
        }
        other => Err(format!("expected a JSON object, got {}", json_type(&other))),
    }
}

fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Kind and summary for a status without a recognized error code.
fn status_fallback(status: u16) -> (ErrorKind, String) {
    match status {
        400 => (ErrorKind::Validation, "Bad Request".to_string()),
        403 => (ErrorKind::AuthorizationFailure, "Authorization failed".to_string()),
        404 => (ErrorKind::NotFound, "Resource not found".to_string()),
        500 => (ErrorKind::Client, "Internal server error".to_string()),
        other => (ErrorKind::Client, format!("CCP API error {other}")),
    }
}

fn invalid_response(status: u16, body: &[u8], reason: &str) -> ServerFailure {
    let text = String::from_utf8_lossy(body);
    let excerpt: String = text.chars().take(BODY_EXCERPT_CHARS).collect();
    ServerFailure {
        kind: ErrorKind::InvalidResponse,
        status,
        code: None,
        message: format!("Invalid JSON response from server (HTTP {status}): {reason}: {excerpt}"),
    }
}
