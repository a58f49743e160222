use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use schedule_cell::{schedule_routes, ScheduleError, ScheduleService};
use shared_database::{Collection, InMemoryStore};
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn therapist_appointment(start: &str, status: &str) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "client": "Jane Doe",
        "client_id": "c1",
        "professional": "John Smith",
        "professional_id": "t1",
        "information": "Follow-up",
        "start_time": start,
        "end_time": start,
        "status": status,
        "complete": false,
        "created_at": "2025-01-01T00:00:00Z"
    })
}

fn rehab_slot(start: &str) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "professional": "Mary Berg",
        "professional_id": "r1",
        "start_time": start,
        "end_time": start,
        "is_block": true,
        "external_id": 7
    })
}

async fn seeded() -> (Arc<InMemoryStore>, TestUser, TestUser, TestUser) {
    let store = Arc::new(InMemoryStore::new());
    let client = TestUser::client("jane@example.com").named("Jane", "Doe");
    let therapist = TestUser::therapist("john@example.com").named("John", "Smith");
    let rehabilitator = TestUser::rehabilitator("mary@example.com").named("Mary", "Berg");

    store
        .seed(
            Collection::Users,
            vec![client.to_record(), therapist.to_record(), rehabilitator.to_record()],
        )
        .await;
    store
        .seed(
            Collection::TherapistAppointments,
            vec![
                therapist_appointment("2025-01-10T10:00:00Z", "Pending"),
                therapist_appointment("2025-01-11T10:00:00Z", "Set"),
                therapist_appointment("2025-01-12T10:00:00Z", "Declined"),
            ],
        )
        .await;
    store
        .seed(
            Collection::RehabilitatorAppointments,
            vec![rehab_slot("2025-01-20T09:00:00Z"), rehab_slot("2025-01-21T09:00:00Z")],
        )
        .await;

    (store, client, therapist, rehabilitator)
}

#[tokio::test]
async fn test_public_therapist_schedule_hides_details() {
    let (store, ..) = seeded().await;
    let service = ScheduleService::new(store);

    let entries = service.therapist_schedule(Some("John Smith")).await.unwrap();

    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|entry| entry.is_block && entry.subject.is_empty()));

    assert!(service.therapist_schedule(Some("Nobody Else")).await.unwrap().is_empty());
    assert_matches!(
        service.therapist_schedule(Some(" ")).await,
        Err(ScheduleError::Validation(errors)) => assert_eq!(errors, vec!["No therapist ID provided"])
    );
}

#[tokio::test]
async fn test_public_rehabilitator_schedule() {
    let (store, ..) = seeded().await;
    let service = ScheduleService::new(store);

    let entries = service.rehabilitator_schedule(Some("Mary Berg")).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|entry| entry.is_block));

    assert_matches!(service.rehabilitator_schedule(None).await, Err(ScheduleError::Validation(_)));
}

#[tokio::test]
async fn test_personal_schedules_check_role() {
    let (store, client, therapist, rehabilitator) = seeded().await;
    let service = ScheduleService::new(store);

    let own = service.personal_therapist_schedule(&therapist.id).await.unwrap();
    assert_eq!(own.len(), 2);
    assert!(own.iter().all(|entry| entry.subject == "John Smith" && !entry.is_block));

    let own = service.personal_rehabilitator_schedule(&rehabilitator.id).await.unwrap();
    assert_eq!(own.len(), 2);
    assert!(own.iter().all(|entry| entry.subject == "Mary Berg"));

    assert_matches!(
        service.personal_therapist_schedule(&client.id).await,
        Err(ScheduleError::Forbidden)
    );
    assert_matches!(
        service.personal_rehabilitator_schedule(&therapist.id).await,
        Err(ScheduleError::Forbidden)
    );
}

#[tokio::test]
async fn test_schedule_route_wire_format() {
    let (store, client, ..) = seeded().await;
    let config = TestConfig::default();
    let router = schedule_routes(config.to_state(store));
    let token = JwtTestUtils::create_test_token(&client, &config.jwt_secret, None);

    let request = Request::builder()
        .uri("/gettherapistschedule?therapistID=John%20Smith")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let first = &body[0];
    assert_eq!(first["Subject"], "");
    assert_eq!(first["IsBlock"], true);
    assert!(first["StartTime"].is_string());
    assert!(first["Id"].is_string());

    let request = Request::builder()
        .uri("/getpersonalscheduletherapist")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
