//! HTTP-level tests for the Alidns record store against a mock server.

mod helpers;

use dnsguard::core::{RecordSpec, RecordStore};
use dnsguard::dns::{AlidnsStore, DnsError};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn spec(rr: &str) -> RecordSpec {
    RecordSpec {
        domain: "example.com".to_string(),
        rr: rr.to_string(),
        record_type: "A".to_string(),
        value: "203.0.113.1".to_string(),
        ttl: 600,
    }
}

fn describe_response(records: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "TotalCount": 1,
        "DomainRecords": { "Record": records }
    }))
}

#[tokio::test]
async fn upsert_creates_when_no_record_matches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("x-acs-action", "DescribeDomainRecords"))
        .and(query_param("DomainName", "example.com"))
        .and(query_param("KeyWord", "www"))
        .respond_with(describe_response(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("x-acs-action", "AddDomainRecord"))
        .and(query_param("RR", "www"))
        .and(query_param("Type", "A"))
        .and(query_param("Value", "203.0.113.1"))
        .and(query_param("TTL", "600"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "RecordId": "r-new" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = AlidnsStore::from_config(&helpers::mock_provider(&server.uri())).unwrap();
    store.upsert(&spec("www")).await.unwrap();
}

#[tokio::test]
async fn upsert_updates_in_place_when_the_exact_key_exists() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("x-acs-action", "DescribeDomainRecords"))
        .respond_with(describe_response(json!([
            { "RecordId": "r-1", "RR": "www", "Type": "A", "Value": "198.51.100.1" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(header("x-acs-action", "UpdateDomainRecord"))
        .and(query_param("RecordId", "r-1"))
        .and(query_param("Value", "203.0.113.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "RecordId": "r-1" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(header("x-acs-action", "AddDomainRecord"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let store = AlidnsStore::from_config(&helpers::mock_provider(&server.uri())).unwrap();
    store.upsert(&spec("www")).await.unwrap();
}

/// The provider's keyword search is a substring match; records with a
/// different name or type must not be treated as the target record.
#[tokio::test]
async fn lookup_ignores_near_matches_of_name_and_type() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("x-acs-action", "DescribeDomainRecords"))
        .respond_with(describe_response(json!([
            { "RecordId": "r-2", "RR": "www2", "Type": "A", "Value": "192.0.2.9" },
            { "RecordId": "r-3", "RR": "www", "Type": "TXT", "Value": "hello" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(header("x-acs-action", "AddDomainRecord"))
        .and(query_param("RR", "www"))
        .and(query_param("Type", "A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "RecordId": "r-4" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = AlidnsStore::from_config(&helpers::mock_provider(&server.uri())).unwrap();
    store.upsert(&spec("www")).await.unwrap();
}

#[tokio::test]
async fn provider_errors_surface_code_and_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("x-acs-action", "DescribeDomainRecords"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "Code": "InvalidDomainName.NoExist",
            "Message": "The specified domain name does not exist."
        })))
        .mount(&server)
        .await;

    let store = AlidnsStore::from_config(&helpers::mock_provider(&server.uri())).unwrap();
    let err = store.upsert(&spec("www")).await.unwrap_err();

    match err {
        DnsError::Api { code, message } => {
            assert_eq!(code, "InvalidDomainName.NoExist");
            assert!(message.contains("does not exist"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

/// Requests carry the ACS3 signature headers.
#[tokio::test]
async fn requests_are_signed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("x-acs-action", "DescribeDomainRecords"))
        .and(header("x-acs-version", "2015-01-09"))
        .respond_with(describe_response(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(header("x-acs-action", "AddDomainRecord"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "RecordId": "r-5" })))
        .mount(&server)
        .await;

    let store = AlidnsStore::from_config(&helpers::mock_provider(&server.uri())).unwrap();
    store.upsert(&spec("www")).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    for request in &requests {
        let auth = request
            .headers
            .get("authorization")
            .expect("missing Authorization header")
            .to_str()
            .unwrap();
        assert!(auth.starts_with("ACS3-HMAC-SHA256 Credential=test-access-key,"));
        assert!(auth.contains("SignedHeaders=host;x-acs-action;"));
        assert!(auth.contains("Signature="));
        assert!(request.headers.contains_key("x-acs-date"));
        assert!(request.headers.contains_key("x-acs-signature-nonce"));
        assert!(request.headers.contains_key("x-acs-content-sha256"));
    }
}
