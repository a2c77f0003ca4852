use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Method, Request, StatusCode},
};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::create_patient_router;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn patient_row(id: Uuid, email: &str) -> Value {
    json!({
        "id": id,
        "first_name": "Dewi",
        "last_name": "Lestari",
        "email": email,
        "phone_number": null,
        "date_of_birth": "1988-02-03",
        "address": null,
        "is_deleted": false,
        "created_by": id,
        "updated_by": id,
        "created_at": Utc::now().to_rfc3339(),
        "updated_at": Utc::now().to_rfc3339()
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_get_own_profile_forwards_token() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = TestUser::patient("dewi@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([patient_row(user.id, &user.email)])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = create_patient_router(config.to_arc())
        .oneshot(
            Request::builder()
                .uri(format!("/{}", user.id))
                .header(AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["email"], "dewi@example.com");
}

#[tokio::test]
async fn test_request_without_token_is_rejected() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let response = create_patient_router(config.to_arc())
        .oneshot(
            Request::builder()
                .uri(format!("/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_profile_returns_created() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = TestUser::patient("dewi@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);

    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(json!({ "id": user.id, "email": "dewi@example.com" })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!([patient_row(user.id, &user.email)])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = json!({
        "first_name": "Dewi",
        "last_name": "Lestari",
        "email": "dewi@example.com",
        "date_of_birth": "1988-02-03"
    });

    let response = create_patient_router(config.to_arc())
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/")
                .header(AUTHORIZATION, format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_duplicate_email_maps_to_conflict() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = TestUser::patient("dewi@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);

    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"patients_email_key\""
        })))
        .mount(&mock_server)
        .await;

    let request = json!({
        "first_name": "Dewi",
        "last_name": "Lestari",
        "email": "dewi@example.com"
    });

    let response = create_patient_router(config.to_arc())
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/")
                .header(AUTHORIZATION, format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_is_a_soft_delete() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let admin = TestUser::admin("admin@clinic.test");
    let token = JwtTestUtils::create_test_token(&admin, &config.jwt_secret, None);
    let patient_id = Uuid::new_v4();

    let mut deleted_row = patient_row(patient_id, "gone@example.com");
    deleted_row["is_deleted"] = json!(true);

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", format!("eq.{}", patient_id)))
        .and(body_partial_json(json!({ "is_deleted": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([deleted_row])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = create_patient_router(config.to_arc())
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/{}", patient_id))
                .header(AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
