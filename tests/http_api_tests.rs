#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use project_lines::{
    Allocation, Deletion, LineGroup, LinePlanner, MemoryLineStore, PlannerStore, ProjectLine,
    http_api,
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use tower::util::ServiceExt;

fn new_router() -> axum::Router {
    let planner = LinePlanner::new(PlannerStore::Memory(MemoryLineStore::new()));
    http_api::router(http_api::AppState::new(planner))
}

fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn create_line(app: &axum::Router) -> ProjectLine {
    let (status, bytes) = send(
        app,
        "POST",
        "/lines",
        Some(json!({
            "project_id": 7,
            "article_id": 3,
            "quantity": "5",
            "amount": "500.00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = new_router();
    let (status, bytes) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn line_lifecycle_via_http_api() {
    let app = new_router();
    let remainder = create_line(&app).await;
    assert!(remainder.is_remainder());
    assert_eq!(remainder.amount, dec("500.00"));

    // Allocate two consecutive days
    let (status, bytes) = send(
        &app,
        "POST",
        &format!("/lines/{}/allocations", remainder.id),
        Some(json!({ "resource_id": "R1", "days": ["2025-03-04", "2025-03-03"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let allocation: Allocation = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(allocation.lines.len(), 1);
    assert_eq!(allocation.allocated_amount, dec("200.00"));

    // The group reflects the split
    let (status, bytes) = send(&app, "GET", &format!("/groups/{}", remainder.group_id), None).await;
    assert_eq!(status, StatusCode::OK);
    let group: LineGroup = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(group.lines.len(), 2);
    assert_eq!(group.remainder().unwrap().line_quantity, dec("3"));

    let (status, bytes) = send(&app, "GET", "/bookings?resource_id=R1", None).await;
    assert_eq!(status, StatusCode::OK);
    let bookings: Vec<Value> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(bookings.len(), 1);
    let (_, bytes) = send(&app, "GET", "/bookings?resource_id=R2", None).await;
    let bookings: Vec<Value> = serde_json::from_slice(&bytes).unwrap();
    assert!(bookings.is_empty());

    // Releasing the allocation restores the remainder
    let allocated = allocation.lines[0];
    let (status, bytes) = send(&app, "DELETE", &format!("/lines/{allocated}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let deletion: Deletion = serde_json::from_slice(&bytes).unwrap();
    assert!(matches!(deletion, Deletion::AllocationReleased { .. }));

    let (status, bytes) = send(&app, "GET", &format!("/lines/{}", remainder.id), None).await;
    assert_eq!(status, StatusCode::OK);
    let restored: ProjectLine = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(restored.line_quantity, dec("5"));
    assert_eq!(restored.amount, dec("500.00"));

    let (status, _) = send(&app, "GET", &format!("/lines/{allocated}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn booking_sync_via_http_api() {
    let app = new_router();
    let remainder = create_line(&app).await;
    let (_, bytes) = send(
        &app,
        "POST",
        &format!("/lines/{}/allocations", remainder.id),
        Some(json!({ "resource_id": "R1", "days": ["2025-03-03"] })),
    )
    .await;
    let allocation: Allocation = serde_json::from_slice(&bytes).unwrap();

    let (status, bytes) = send(
        &app,
        "POST",
        &format!("/lines/{}/booking", allocation.lines[0]),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let outcome: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(outcome["action"], "unchanged");
}

#[tokio::test]
async fn missing_line_is_not_found() {
    let app = new_router();
    let (status, bytes) = send(&app, "DELETE", "/lines/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn empty_selection_is_a_bad_request() {
    let app = new_router();
    let remainder = create_line(&app).await;
    let (status, bytes) = send(
        &app,
        "POST",
        &format!("/lines/{}/allocations", remainder.id),
        Some(json!({ "resource_id": "R1", "days": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn repairing_a_remainder_conflicts() {
    let app = new_router();
    let remainder = create_line(&app).await;
    let (status, bytes) = send(
        &app,
        "POST",
        &format!("/lines/{}/remainder", remainder.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "state_conflict");
}

#[cfg(feature = "sqlite")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_allocations_on_sqlite_store() {
    let store = project_lines::SqliteLineStore::in_memory().unwrap();
    let planner = LinePlanner::new(PlannerStore::Sqlite(store));
    let app = http_api::router(http_api::AppState::new(planner));
    let remainder = create_line(&app).await;

    let mut handles = Vec::new();
    for day in ["2025-03-03", "2025-03-05", "2025-03-07", "2025-03-11"] {
        let app = app.clone();
        let uri = format!("/lines/{}/allocations", remainder.id);
        handles.push(tokio::spawn(async move {
            send(
                &app,
                "POST",
                &uri,
                Some(json!({ "resource_id": "R1", "days": [day] })),
            )
            .await
            .0
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::CREATED);
    }

    let (_, bytes) = send(&app, "GET", &format!("/groups/{}", remainder.group_id), None).await;
    let group: LineGroup = serde_json::from_slice(&bytes).unwrap();
    group.check_invariants().unwrap();
    assert_eq!(group.lines.len(), 5);
    assert_eq!(group.total_amount(), dec("500.00"));
    assert_eq!(group.remainder().unwrap().line_quantity, dec("1"));
}
