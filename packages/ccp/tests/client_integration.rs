//! End-to-end tests for the CCP client over real HTTP.
//!
//! A wiremock server stands in for the CCP. The client is blocking, so every
//! call runs inside `spawn_blocking` to stay off the async runtime threads.

use std::time::Duration;

use cyberark_ccp::{
    AccountResult, CcpClient, ClientConfig, ErrorKind, QueryFormat, Result, SearchParameters,
};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ACCOUNTS: &str = "/AIMWebService/api/Accounts";

fn config(uri: &str) -> ClientConfig {
    ClientConfig::builder(uri, "TestApp")
        .timeout_secs(1)
        .build()
        .expect("valid config")
}

/// Build a client against `uri` and fetch one account off the async runtime.
async fn fetch(uri: String, params: SearchParameters) -> Result<AccountResult> {
    tokio::task::spawn_blocking(move || {
        let client = CcpClient::new(config(&uri))?;
        client.get_account(params)
    })
    .await
    .expect("blocking task")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_account_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ACCOUNTS))
        .and(query_param("AppID", "TestApp"))
        .and(query_param("Safe", "TestSafe"))
        .and(query_param("Object", "TestObject"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Content": "test-password",
            "UserName": "test-user",
            "Address": "test.example.com",
            "PasswordChangeInProcess": "False",
            "Folder": "Root"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let account = fetch(
        mock_server.uri(),
        SearchParameters::new().safe("TestSafe").object("TestObject"),
    )
    .await
    .expect("account");

    assert_eq!(account.content.as_deref(), Some("test-password"));
    assert_eq!(account.username.as_deref(), Some("test-user"));
    assert_eq!(account.database, None);
    assert_eq!(account.password_change_in_process, Some(false));
    assert!(account.properties.contains_key("Folder"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_query_suppresses_search_fields_on_the_wire() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ACCOUNTS))
        .and(query_param("Query", "Safe=Prod,Address=db-.*"))
        .and(query_param("Query Format", "Regexp"))
        .and(query_param("Reason", "maintenance"))
        .and(query_param_is_missing("Safe"))
        .and(query_param_is_missing("Object"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "Content": "x" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let params = SearchParameters::new()
        .query("Safe=Prod,Address=db-.*")
        .query_format(QueryFormat::Regexp)
        .safe("Ignored")
        .object("Ignored")
        .reason("maintenance");

    let account = fetch(mock_server.uri(), params).await.expect("account");
    assert_eq!(account.content.as_deref(), Some("x"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_vendor_errors_are_classified() {
    let cases = [
        (403, "APPAP306E", ErrorKind::AuthenticationFailure),
        (403, "APPAP008E", ErrorKind::AuthorizationFailure),
        (404, "APPAP004E", ErrorKind::NotFound),
        (400, "APPAP007E", ErrorKind::ConnectionFailure),
        (500, "APPAP282E", ErrorKind::Conflict),
    ];

    for (status, code, kind) in cases {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ACCOUNTS))
            .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
                "ErrorCode": code,
                "ErrorMessage": "vendor message"
            })))
            .mount(&mock_server)
            .await;

        let err = fetch(mock_server.uri(), SearchParameters::new().safe("S"))
            .await
            .expect_err("should fail");
        assert_eq!(err.kind(), kind, "{code}");
        assert_eq!(err.code(), Some(code));
        assert!(err.to_string().contains("vendor message"));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_non_json_error_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ACCOUNTS))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let err = fetch(mock_server.uri(), SearchParameters::new().safe("S"))
        .await
        .expect_err("should fail");
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    assert!(err.to_string().contains("HTTP 500"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ACCOUNTS))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "Content": "late" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let err = fetch(mock_server.uri(), SearchParameters::new().safe("S"))
        .await
        .expect_err("should time out");
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(err.to_string(), "Request timed out after 1 seconds");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_validation_error_sends_no_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = fetch(mock_server.uri(), SearchParameters::new().safe("Test&Safe"))
        .await
        .expect_err("should fail validation");
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_connection_refused() {
    // Nothing listens on port 1
    let client = CcpClient::new(config("http://127.0.0.1:1")).expect("client");
    let err = client
        .get_password(SearchParameters::new().safe("S"))
        .expect_err("should fail");
    assert_eq!(err.kind(), ErrorKind::ConnectionFailure);
}
