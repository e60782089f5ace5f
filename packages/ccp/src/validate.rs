//! Pre-flight validation of search parameters.
//!
//! The CCP rejects some inputs only at runtime, with a vendor error that is
//! hard to act on. Everything that can be checked locally is checked here,
//! without touching the network.

use crate::config::ClientConfig;
use crate::error::ValidationError;
use crate::types::SearchParameters;

/// Characters the CCP does not accept in parameter values, even when
/// percent-encoded.
pub const RESTRICTED_CHARS: [char; 5] = ['+', '&', '%', ';', ' '];

/// Search parameters that passed [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedParams(pub(crate) SearchParameters);

impl ValidatedParams {
    pub fn params(&self) -> &SearchParameters {
        &self.0
    }

    pub fn into_inner(self) -> SearchParameters {
        self.0
    }
}

/// Validate search parameters against the CCP request rules.
///
/// Rules are checked in order: AppID present, at least one search criterion
/// other than `Folder`, no restricted characters, positive connection
/// timeout.
///
/// # Examples
/// ```
/// use cyberark_ccp::{validate, ClientConfig, SearchParameters};
///
/// let config = ClientConfig::builder("https://ccp.example.com", "MyApp").build().unwrap();
/// assert!(validate(&config, SearchParameters::new().safe("Prod")).is_ok());
/// assert!(validate(&config, SearchParameters::new()).is_err());
/// ```
pub fn validate(
    config: &ClientConfig,
    params: SearchParameters,
) -> Result<ValidatedParams, ValidationError> {
    if config.app_id().trim().is_empty() {
        return Err(ValidationError::MissingAppId);
    }

    if !locates_account(&params) {
        return Err(ValidationError::InsufficientCriteria);
    }

    for (field, value) in string_fields(&params) {
        if let Some(value) = value {
            check_value(field, value)?;
        }
    }

    if params.connection_timeout == Some(0) {
        return Err(ValidationError::InvalidConnectionTimeout("0".to_string()));
    }

    Ok(ValidatedParams(params))
}

/// Whether `params` names something the CCP can search on.
///
/// `Folder` only narrows a search, and `Reason` and the option flags do not
/// search at all, so none of them count.
fn locates_account(params: &SearchParameters) -> bool {
    params.query_value().is_some()
        || params
            .search_fields()
            .iter()
            .any(|(name, value)| *name != "Folder" && value.is_some())
}

/// Every string-valued parameter, including fields a `Query` would suppress.
fn string_fields(params: &SearchParameters) -> impl Iterator<Item = (&'static str, Option<&str>)> {
    params.search_fields().into_iter().chain([
        ("Reason", params.reason_value()),
        ("Query", params.query_value()),
    ])
}

/// Reject a value containing any of [`RESTRICTED_CHARS`].
///
/// Characters are checked in the order of [`RESTRICTED_CHARS`], so a value
/// with several offenders reports the first one in that list.
pub fn check_value(field: &'static str, value: &str) -> Result<(), ValidationError> {
    match RESTRICTED_CHARS.iter().find(|c| value.contains(**c)) {
        Some(&character) => Err(ValidationError::InvalidCharacter { field, character }),
        None => Ok(()),
    }
}
