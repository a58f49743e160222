use axum::{routing::get, Router};

use appointment_cell::appointment_routes;
use auth_cell::auth_routes;
use healthcare_cell::healthcare_routes;
use schedule_cell::schedule_routes;
use shared_utils::AppState;

/// Every cell keeps its routes at the root so existing clients see the same
/// paths they always have.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic booking API is running!" }))
        .merge(auth_routes(state.clone()))
        .merge(appointment_routes(state.clone()))
        .merge(healthcare_routes(state.clone()))
        .merge(schedule_routes(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use shared_database::InMemoryStore;
    use shared_utils::test_utils::TestConfig;

    fn app() -> Router {
        create_router(TestConfig::default().to_state(Arc::new(InMemoryStore::new())))
    }

    #[tokio::test]
    async fn test_root_reports_running() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Clinic booking API is running!");
    }

    #[tokio::test]
    async fn test_every_cell_is_mounted_behind_auth() {
        for uri in ["/getuser", "/getappointments", "/listhealthcares", "/getpersonalscheduletherapist"] {
            let response = app()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }
}
