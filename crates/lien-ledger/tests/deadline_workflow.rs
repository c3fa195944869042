//! Integration specifications for the project to deadline workflow.
//!
//! Scenarios drive the merged project and deadline routers over one in-memory store so
//! auto-generation, read-time prioritization, completion, and project detachment are
//! checked through the public HTTP surface only.

mod common {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use axum::response::Response;
    use axum::Router;
    use chrono::NaiveDate;
    use serde_json::Value;

    use lien_ledger::clock::FixedClock;
    use lien_ledger::store::SqliteStore;
    use lien_ledger::workflows::deadlines::{deadline_router, DeadlineService};
    use lien_ledger::workflows::projects::{project_router, ProjectService};

    pub(super) fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 1).expect("valid date")
    }

    pub(super) fn app() -> Router {
        let store = Arc::new(SqliteStore::open_in_memory().expect("in-memory store"));
        let deadlines = DeadlineService::new(
            store.clone(),
            store.clone(),
            Arc::new(FixedClock(today())),
        )
        .expect("rules load");

        Router::new()
            .merge(deadline_router(Arc::new(deadlines)))
            .merge(project_router(Arc::new(ProjectService::new(store))))
    }

    pub(super) fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    pub(super) fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    pub(super) async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json body")
    }
}

use axum::http::StatusCode;
use common::*;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn project_window_generates_prioritized_deadlines() {
    let router = app();

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/projects",
            json!({
                "userId": "sub-7",
                "name": "Harbor View Medical Office",
                "projectType": "private",
                "workStartDate": "2025-09-25",
                "workEndDate": "2025-12-01"
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let project_id = json_body(response).await["id"]
        .as_i64()
        .expect("project id");

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/deadlines/auto-create",
            json!({ "userId": "sub-7", "projectId": project_id }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    let created = created["deadlines"].as_array().expect("deadlines array");
    assert_eq!(created.len(), 2);
    assert_eq!(created[0]["deadline_type"], "preliminary_notice");
    assert_eq!(created[0]["deadline_date"], "2025-10-05");
    assert_eq!(created[0]["project_id"], project_id);
    assert_eq!(created[1]["deadline_type"], "mechanics_lien");
    assert_eq!(created[1]["deadline_date"], "2026-03-31");

    let response = router
        .clone()
        .oneshot(empty_request("GET", "/api/v1/deadlines?userId=sub-7"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let listed = json_body(response).await;
    let listed = listed["deadlines"].as_array().expect("deadlines array");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["days_remaining"], 4);
    assert_eq!(listed[0]["priority"], "high");
    assert_eq!(listed[0]["calculated_priority"], "high");
    assert_eq!(listed[1]["days_remaining"], 181);
    assert_eq!(listed[1]["calculated_priority"], "critical");
}

#[tokio::test]
async fn completing_a_deadline_removes_it_from_upcoming() {
    let router = app();

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/deadlines/auto-create",
            json!({
                "userId": "sub-7",
                "workStartDate": "2025-09-25",
                "workEndDate": "2025-12-01",
                "projectType": "private"
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    let notice_id = created["deadlines"][0]["id"].as_i64().expect("deadline id");

    let response = router
        .clone()
        .oneshot(empty_request(
            "GET",
            "/api/v1/deadlines/upcoming?userId=sub-7&days=30",
        ))
        .await
        .expect("response");
    let upcoming = json_body(response).await;
    assert_eq!(upcoming["deadlines"].as_array().map(Vec::len), Some(1));

    let response = router
        .clone()
        .oneshot(empty_request(
            "POST",
            &format!("/api/v1/deadlines/{notice_id}/complete"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let completed = json_body(response).await;
    assert_eq!(completed["status"], "completed");
    assert_eq!(completed["completed_date"], "2025-10-01");

    let response = router
        .clone()
        .oneshot(empty_request(
            "GET",
            "/api/v1/deadlines/upcoming?userId=sub-7&days=30",
        ))
        .await
        .expect("response");
    let upcoming = json_body(response).await;
    assert_eq!(upcoming["deadlines"].as_array().map(Vec::len), Some(0));

    let response = router
        .oneshot(empty_request(
            "GET",
            "/api/v1/deadlines?userId=sub-7&status=completed",
        ))
        .await
        .expect("response");
    let completed = json_body(response).await;
    assert_eq!(completed["deadlines"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn deleting_a_project_detaches_its_deadlines() {
    let router = app();

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/projects",
            json!({
                "userId": "sub-7",
                "name": "County Library Annex",
                "projectType": "public",
                "workEndDate": "2025-08-01"
            }),
        ))
        .await
        .expect("response");
    let project_id = json_body(response).await["id"]
        .as_i64()
        .expect("project id");

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/deadlines/auto-create",
            json!({ "userId": "sub-7", "projectId": project_id }),
        ))
        .await
        .expect("response");
    let created = json_body(response).await;
    let bond_claim = &created["deadlines"][0];
    assert_eq!(bond_claim["deadline_type"], "payment_bond_claim");
    assert_eq!(bond_claim["deadline_date"], "2025-11-29");
    let deadline_id = bond_claim["id"].as_i64().expect("deadline id");

    let response = router
        .clone()
        .oneshot(empty_request(
            "DELETE",
            &format!("/api/v1/projects/{project_id}"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(empty_request(
            "GET",
            &format!("/api/v1/deadlines/{deadline_id}"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let detached = json_body(response).await;
    assert!(detached["project_id"].is_null());
}
