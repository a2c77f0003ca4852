use axum::{
    body::Body,
    http::{header::AUTHORIZATION, header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::appointment_routes;
use appointment_cell::models::{AvailabilityCheckQuery, ErrorKind};
use appointment_cell::services::AppointmentBookingService;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

/// 2030-01-07 is a Monday.
fn monday_at(time: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&format!("2030-01-07T{}:00Z", time))
        .unwrap()
        .with_timezone(&Utc)
}

struct TestClinic {
    server: MockServer,
    router: Router,
    token: String,
    user: TestUser,
    doctor_id: Uuid,
}

impl TestClinic {
    async fn new(user: TestUser) -> Self {
        let server = MockServer::start().await;
        let config = TestConfig::with_supabase_url(&server.uri());
        let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);
        let doctor_id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/rest/v1/doctors"))
            .and(query_param("id", format!("eq.{}", doctor_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                MockSupabaseResponses::doctor_response(
                    doctor_id,
                    json!([{"dayOfWeek": 1, "startTime": "09:00", "endTime": "12:00"}]),
                )
            ])))
            .mount(&server)
            .await;

        Self {
            router: appointment_routes(config.to_arc()),
            server,
            token,
            user,
            doctor_id,
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {}", self.token));
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn mount_patient(&self, patient_id: Uuid) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/patients"))
            .and(query_param("id", format!("eq.{}", patient_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                MockSupabaseResponses::patient_response(patient_id, "budi@example.com")
            ])))
            .mount(&self.server)
            .await;
    }
}

#[tokio::test]
async fn test_available_slots_for_free_morning() {
    let clinic = TestClinic::new(TestUser::patient("budi@example.com")).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", clinic.doctor_id)))
        .and(query_param("status", "in.(requested,confirmed)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(11)
        .mount(&clinic.server)
        .await;

    let (status, body) = clinic
        .send(
            Method::GET,
            &format!("/doctors/{}/available-slots?date=2030-01-07&duration=30", clinic.doctor_id),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let slots: Vec<&str> = body["slots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|slot| slot.as_str().unwrap())
        .collect();
    assert_eq!(slots.len(), 11);
    assert_eq!(slots.first(), Some(&"09:00"));
    assert_eq!(slots.last(), Some(&"11:30"));
    assert_eq!(body["duration_minutes"], 30);
}

#[tokio::test]
async fn test_available_slots_rejects_bad_date() {
    let clinic = TestClinic::new(TestUser::patient("budi@example.com")).await;

    let (status, _) = clinic
        .send(
            Method::GET,
            &format!("/doctors/{}/available-slots?date=07-01-2030", clinic.doctor_id),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_booking_into_taken_slot_is_conflict() {
    let clinic = TestClinic::new(TestUser::patient("budi@example.com")).await;
    clinic.mount_patient(clinic.user.id).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("appointment_time", "lt.2030-01-07T10:45:00Z"))
        .and(query_param("end_time", "gt.2030-01-07T10:15:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                Uuid::new_v4(),
                Uuid::new_v4(),
                clinic.doctor_id,
                monday_at("10:00"),
                30,
                "confirmed",
            )
        ])))
        .expect(1)
        .mount(&clinic.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&clinic.server)
        .await;

    let (status, body) = clinic
        .send(
            Method::POST,
            "/",
            Some(json!({
                "doctor_id": clinic.doctor_id,
                "appointment_time": "2030-01-07T10:15:00Z",
                "duration_minutes": 30
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("overlaps another booking"));
}

#[tokio::test]
async fn test_booking_that_loses_the_race_is_conflict() {
    let clinic = TestClinic::new(TestUser::patient("budi@example.com")).await;
    clinic.mount_patient(clinic.user.id).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&clinic.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23P01",
            "message": "conflicting key value violates exclusion constraint \"appointments_no_overlap\""
        })))
        .expect(1)
        .mount(&clinic.server)
        .await;

    let (status, _) = clinic
        .send(
            Method::POST,
            "/",
            Some(json!({
                "doctor_id": clinic.doctor_id,
                "appointment_time": "2030-01-07T10:00:00Z"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_booking_returns_created_appointment() {
    let clinic = TestClinic::new(TestUser::patient("budi@example.com")).await;
    clinic.mount_patient(clinic.user.id).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&clinic.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                Uuid::new_v4(),
                clinic.user.id,
                clinic.doctor_id,
                monday_at("10:00"),
                30,
                "requested",
            )
        ])))
        .expect(1)
        .mount(&clinic.server)
        .await;

    let (status, body) = clinic
        .send(
            Method::POST,
            "/",
            Some(json!({
                "doctor_id": clinic.doctor_id,
                "appointment_time": "2030-01-07T10:00:00Z",
                "reason": "Check-up"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["appointment"]["status"], "requested");
}

#[tokio::test]
async fn test_availability_probe_reports_outside_hours() {
    let clinic = TestClinic::new(TestUser::staff("desk@clinic.test")).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&clinic.server)
        .await;

    let (status, body) = clinic
        .send(
            Method::GET,
            &format!(
                "/availability/check?doctor_id={}&appointment_time=2030-01-07T08:00:00Z&duration_minutes=30",
                clinic.doctor_id
            ),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], false);
    assert_eq!(body["availability"], "outside_working_hours");
}

#[tokio::test]
async fn test_reschedule_excludes_itself_from_conflicts() {
    let clinic = TestClinic::new(TestUser::patient("budi@example.com")).await;
    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                appointment_id,
                clinic.user.id,
                clinic.doctor_id,
                monday_at("09:00"),
                30,
                "requested",
            )
        ])))
        .mount(&clinic.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("neq.{}", appointment_id)))
        .and(query_param("status", "in.(requested,confirmed)"))
        .and(query_param("appointment_time", "lt.2030-01-07T11:00:00Z"))
        .and(query_param("end_time", "gt.2030-01-07T10:30:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&clinic.server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                appointment_id,
                clinic.user.id,
                clinic.doctor_id,
                monday_at("10:30"),
                30,
                "requested",
            )
        ])))
        .expect(1)
        .mount(&clinic.server)
        .await;

    let (status, body) = clinic
        .send(
            Method::PUT,
            &format!("/{}", appointment_id),
            Some(json!({ "appointment_time": "2030-01-07T10:30:00Z" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["id"], appointment_id.to_string());
}

#[tokio::test]
async fn test_cancel_without_reason_is_bad_request() {
    let clinic = TestClinic::new(TestUser::patient("budi@example.com")).await;
    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                appointment_id,
                clinic.user.id,
                clinic.doctor_id,
                monday_at("09:00"),
                30,
                "confirmed",
            )
        ])))
        .mount(&clinic.server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&clinic.server)
        .await;

    let (status, _) = clinic
        .send(
            Method::POST,
            &format!("/{}/cancel", appointment_id),
            Some(json!({ "reason": "" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_request_without_token_is_unauthorized() {
    let clinic = TestClinic::new(TestUser::patient("budi@example.com")).await;

    let response = clinic
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/doctors/{}/available-slots?date=2030-01-07", clinic.doctor_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_conflict_filter_keeps_sub_second_precision() {
    let clinic = TestClinic::new(TestUser::patient("budi@example.com")).await;
    clinic.mount_patient(clinic.user.id).await;

    // An appointment starting at 10:30:00.2 overlaps [10:00:00.5, 10:30:00.5).
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("appointment_time", "lt.2030-01-07T10:30:00.500Z"))
        .and(query_param("end_time", "gt.2030-01-07T10:00:00.500Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                Uuid::new_v4(),
                Uuid::new_v4(),
                clinic.doctor_id,
                monday_at("10:30") + chrono::Duration::milliseconds(200),
                30,
                "requested",
            )
        ])))
        .expect(1)
        .mount(&clinic.server)
        .await;

    let (status, _) = clinic
        .send(
            Method::POST,
            "/",
            Some(json!({
                "doctor_id": clinic.doctor_id,
                "appointment_time": "2030-01-07T10:00:00.5Z",
                "duration_minutes": 30
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_failed_conflict_query_is_not_treated_as_free() {
    let clinic = TestClinic::new(TestUser::patient("budi@example.com")).await;
    clinic.mount_patient(clinic.user.id).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&clinic.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&clinic.server)
        .await;

    let (booking, _) = clinic
        .send(
            Method::POST,
            "/",
            Some(json!({
                "doctor_id": clinic.doctor_id,
                "appointment_time": "2030-01-07T10:00:00Z"
            })),
        )
        .await;
    assert_eq!(booking, StatusCode::INTERNAL_SERVER_ERROR);

    let (slots, body) = clinic
        .send(
            Method::GET,
            &format!("/doctors/{}/available-slots?date=2030-01-07", clinic.doctor_id),
            None,
        )
        .await;
    assert_eq!(slots, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("slots").is_none());

    let (probe, body) = clinic
        .send(
            Method::GET,
            &format!(
                "/availability/check?doctor_id={}&appointment_time=2030-01-07T10:00:00Z",
                clinic.doctor_id
            ),
            None,
        )
        .await;
    assert_eq!(probe, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("available").is_none());
}

#[tokio::test]
async fn test_failed_doctor_lookup_is_infrastructure_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    let service = AppointmentBookingService::for_request(&config, "token");

    let err = service
        .check_availability(AvailabilityCheckQuery {
            doctor_id: Uuid::new_v4(),
            appointment_time: "2030-01-07T10:00:00Z".to_string(),
            duration_minutes: Some(30),
            exclude_appointment_id: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Infrastructure);

    let err = service
        .list_available_slots(Uuid::new_v4(), "2030-01-07", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Infrastructure);
}

#[tokio::test]
async fn test_unreachable_store_is_infrastructure_error() {
    let config = TestConfig::with_supabase_url("http://127.0.0.1:1").to_app_config();
    let service = AppointmentBookingService::for_request(&config, "token");

    let err = service
        .check_availability(AvailabilityCheckQuery {
            doctor_id: Uuid::new_v4(),
            appointment_time: "2030-01-07T10:00:00Z".to_string(),
            duration_minutes: None,
            exclude_appointment_id: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Infrastructure);
}
