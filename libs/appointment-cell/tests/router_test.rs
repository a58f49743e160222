use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use appointment_cell::appointment_routes;
use shared_database::{Collection, InMemoryStore};
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

struct TestApp {
    router: Router,
    store: Arc<InMemoryStore>,
    config: TestConfig,
}

impl TestApp {
    async fn new(users: &[&TestUser]) -> Self {
        let store = Arc::new(InMemoryStore::new());
        store
            .seed(Collection::Users, users.iter().map(|user| user.to_record()).collect())
            .await;
        let config = TestConfig::default();
        let router = appointment_routes(config.to_state(store.clone()));
        Self { router, store, config }
    }

    async fn send(&self, method: Method, uri: &str, user: &TestUser, body: Option<Value>) -> (StatusCode, Value) {
        let token = JwtTestUtils::create_test_token(user, &self.config.jwt_secret, None);
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {}", token));
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

fn people() -> (TestUser, TestUser, TestUser) {
    (
        TestUser::client("jane@example.com").named("Jane", "Doe"),
        TestUser::therapist("john@example.com").named("John", "Smith"),
        TestUser::rehabilitator("mary@example.com").named("Mary", "Berg"),
    )
}

fn booking(start: &str, end: &str) -> Value {
    json!({
        "professional": "John Smith",
        "information": "Knee injury",
        "StartTime": start,
        "EndTime": end
    })
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let app = TestApp::new(&[]).await;
    let request = Request::builder()
        .uri("/getappointments")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_booking_then_repeat_is_already_taken() {
    let (client, therapist, _) = people();
    let other = TestUser::client("ann@example.com").named("Ann", "Lee");
    let app = TestApp::new(&[&client, &therapist, &other]).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/createappointmenttherapist",
            &client,
            Some(booking("2099-01-10T10:00:00Z", "2099-01-10T11:00:00Z")),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["client"], "Jane Doe");
    assert_eq!(body["professional"], "John Smith");
    assert_eq!(body["status"], "Pending");
    assert_eq!(body["complete"], false);

    let (status, body) = app
        .send(
            Method::POST,
            "/createappointmenttherapist",
            &other,
            Some(booking("2099-01-10T10:00:00Z", "2099-01-10T11:00:00Z")),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].as_str().unwrap().contains("already taken"));
}

#[tokio::test]
async fn test_booking_validation_lists_every_problem() {
    let (client, therapist, _) = people();
    let app = TestApp::new(&[&client, &therapist]).await;

    let (status, body) = app
        .send(Method::POST, "/createappointmenttherapist", &client, Some(json!({"professional": ""})))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Invalid input");
    assert_eq!(body["data"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn test_get_and_cancel_appointment() {
    let (client, therapist, _) = people();
    let app = TestApp::new(&[&client, &therapist]).await;

    let (_, created) = app
        .send(
            Method::POST,
            "/createappointmenttherapist",
            &client,
            Some(booking("2099-02-01T10:00:00Z", "2099-02-01T11:00:00Z")),
        )
        .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, fetched) = app
        .send(Method::GET, &format!("/getappointment?appointmentID={}", id), &therapist, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], created["id"]);

    let (status, _) = app
        .send(Method::DELETE, &format!("/cancelappointment?appointmentID={}", id), &therapist, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.store.count(Collection::TherapistAppointments).await, 1);

    let (status, _) = app
        .send(Method::DELETE, &format!("/cancelappointment?appointmentID={}", id), &client, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.store.count(Collection::TherapistAppointments).await, 0);

    let (status, _) = app
        .send(Method::GET, &format!("/getappointment?appointmentID={}", id), &client, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_appointment_id_is_checked() {
    let (client, _, _) = people();
    let app = TestApp::new(&[&client]).await;

    let (status, body) = app.send(Method::GET, "/getappointment", &client, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["data"], json!(["No appointment ID provided."]));

    let (status, body) = app
        .send(Method::GET, "/getappointment?appointmentID=not-a-uuid", &client, None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Invalid appointment ID.");
}

#[tokio::test]
async fn test_accept_and_list_for_therapist() {
    let (client, therapist, _) = people();
    let app = TestApp::new(&[&client, &therapist]).await;

    let (_, created) = app
        .send(
            Method::POST,
            "/createappointmenttherapist",
            &client,
            Some(booking("2099-03-01T10:00:00Z", "2099-03-01T11:00:00Z")),
        )
        .await;

    let (status, refreshed) = app
        .send(
            Method::POST,
            "/acceptappointmenttherapist",
            &therapist,
            Some(json!({"appointmentID": created["id"]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed[0]["status"], "Set");

    let (status, listed) = app.send(Method::GET, "/getappointments", &therapist, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let (status, _) = app.send(Method::GET, "/getappointments", &client, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::POST,
            "/declineappointmenttherapist",
            &therapist,
            Some(json!({"appointmentID": Uuid::new_v4()})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rehabilitator_batch_outcomes() {
    let (client, therapist, rehabilitator) = people();
    let app = TestApp::new(&[&client, &therapist, &rehabilitator]).await;
    let case_id = Uuid::new_v4();
    app.store
        .seed(
            Collection::Healthcares,
            vec![json!({
                "id": case_id,
                "rehabilitator": "",
                "appointments_rehab_required": 2,
                "appointments_rehabilitator": []
            })],
        )
        .await;

    let item = |start: &str, id: Value| {
        json!({"StartTime": start, "EndTime": start, "IsBlock": true, "Id": id})
    };

    let (status, body) = app
        .send(
            Method::POST,
            "/createappointmentsrehabilitator",
            &therapist,
            Some(json!({
                "professional": "Mary Berg",
                "healthcareID": case_id,
                "items": [item("2099-04-01T09:00:00Z", json!(1))]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(app.store.count(Collection::RehabilitatorAppointments).await, 0);

    let batch = json!({
        "professional": "Mary Berg",
        "healthcareID": case_id,
        "items": [item("2099-04-01T09:00:00Z", json!(1)), item("2099-04-02T09:00:00Z", json!("b"))]
    });

    let (status, body) = app
        .send(Method::POST, "/createappointmentsrehabilitator", &therapist, Some(batch.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][1]["external_id"], "b");

    let (status, _) = app
        .send(Method::POST, "/createappointmentsrehabilitator", &therapist, Some(batch))
        .await;
    assert_eq!(status, StatusCode::FAILED_DEPENDENCY);
    assert_eq!(app.store.count(Collection::RehabilitatorAppointments).await, 2);
}
