use assert_matches::assert_matches;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reqwest::Method;
use shared_config::AppConfig;
use shared_database::{DatabaseError, SupabaseClient};

fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        supabase_jwt_secret: "test-secret".to_string(),
        clinic_utc_offset_minutes: 0,
        port: 3000,
    }
}

#[tokio::test]
async fn test_request_forwards_api_key_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.42"))
        .and(header("apikey", "test-anon-key"))
        .and(header("authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 42 }])))
        .expect(1)
        .mount(&server)
        .await;

    let client = SupabaseClient::new(&config_for(&server));
    let rows: Vec<Value> = client
        .request(Method::GET, "/rest/v1/doctors?id=eq.42", Some("user-token"), None)
        .await
        .expect("request should succeed");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], 42);
}

#[tokio::test]
async fn test_conflict_status_maps_to_conflict_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_string("exclusion constraint violated"))
        .mount(&server)
        .await;

    let client = SupabaseClient::new(&config_for(&server));
    let result: Result<Vec<Value>, _> = client
        .request(Method::POST, "/rest/v1/appointments", Some("t"), Some(json!({})))
        .await;

    assert_matches!(result, Err(DatabaseError::Conflict(msg)) if msg.contains("exclusion"));
}

#[tokio::test]
async fn test_error_statuses_are_classified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/forbidden"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/broken"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .mount(&server)
        .await;

    let client = SupabaseClient::new(&config_for(&server));

    let forbidden: Result<Vec<Value>, _> =
        client.request(Method::GET, "/rest/v1/forbidden", Some("t"), None).await;
    assert_matches!(forbidden, Err(DatabaseError::Unauthorized));

    let broken: Result<Vec<Value>, _> =
        client.request(Method::GET, "/rest/v1/broken", Some("t"), None).await;
    assert_matches!(broken, Err(DatabaseError::Api { status: 503, .. }));
}

#[tokio::test]
async fn test_empty_body_decodes_as_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = SupabaseClient::new(&config_for(&server));
    let rows: Vec<Value> = client
        .request(Method::DELETE, "/rest/v1/patients?id=eq.1", Some("t"), None)
        .await
        .expect("empty body should decode");

    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_unreachable_server_is_a_connection_error() {
    let config = AppConfig {
        supabase_url: "http://127.0.0.1:1".to_string(),
        supabase_anon_key: "k".to_string(),
        supabase_jwt_secret: "s".to_string(),
        clinic_utc_offset_minutes: 0,
        port: 3000,
    };
    let client = SupabaseClient::new(&config);
    let result: Result<Vec<Value>, _> =
        client.request(Method::GET, "/rest/v1/doctors", None, None).await;

    assert_matches!(result, Err(DatabaseError::ConnectionError(_)));
}
