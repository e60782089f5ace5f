//! Query string construction for the Accounts endpoint.

use url::Url;

use crate::config::ClientConfig;
use crate::validate::ValidatedParams;

/// Build the request URL for a validated lookup.
///
/// Parameters are appended in a fixed order: `AppID`, then either `Query`
/// (with `Query Format`) or the discrete search fields, then `Reason`,
/// `Connection Timeout` and `FailRequestOnPasswordChange`. Unset and empty
/// values are left out so the CCP applies its own defaults.
///
/// A `Query` always suppresses `Safe`, `Folder`, `Object`, `UserName`,
/// `Address`, `Database` and `PolicyID`, even if they were supplied.
pub fn build(config: &ClientConfig, validated: &ValidatedParams) -> Url {
    let params = validated.params();
    let mut url = config.endpoint().clone();

    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("AppID", config.app_id());

        if let Some(query) = params.query_value() {
            pairs.append_pair("Query", query);
            if let Some(format) = params.query_format {
                pairs.append_pair("Query Format", format.as_str());
            }
        } else {
            for (name, value) in params.search_fields() {
                if let Some(value) = value {
                    pairs.append_pair(name, value);
                }
            }
        }

        if let Some(reason) = params.reason_value() {
            pairs.append_pair("Reason", reason);
        }
        if let Some(secs) = params.connection_timeout {
            pairs.append_pair("Connection Timeout", &secs.to_string());
        }
        if let Some(fail) = params.fail_request_on_password_change {
            pairs.append_pair("FailRequestOnPasswordChange", if fail { "true" } else { "false" });
        }
    }

    url
}
