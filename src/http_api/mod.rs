use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::{
    Allocation, BookingRecord, Deletion, LineGroup, LinePlanner, NewProjectLine, PlannerStore,
    PlanningError, PlanningResult, ProjectLine, RemainderSplit, SyncOutcome,
};
use crate::line::{GroupId, LineId};

/// Shared planner handle. Planner calls block on the store, so handlers run
/// them on the blocking pool through [`AppState::run`].
#[derive(Clone)]
pub struct AppState {
    planner: Arc<LinePlanner<PlannerStore>>,
}

impl AppState {
    pub fn new(planner: LinePlanner<PlannerStore>) -> Self {
        Self {
            planner: Arc::new(planner),
        }
    }

    pub fn with_shared(planner: Arc<LinePlanner<PlannerStore>>) -> Self {
        Self { planner }
    }

    async fn run<T, F>(&self, work: F) -> Result<T, ApiError>
    where
        F: FnOnce(&LinePlanner<PlannerStore>) -> PlanningResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let planner = Arc::clone(&self.planner);
        tokio::task::spawn_blocking(move || work(&planner))
            .await
            .map_err(ApiError::Task)?
            .map_err(ApiError::Planning)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    Planning(PlanningError),
    Task(tokio::task::JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::Planning(err) => err,
            ApiError::Task(err) => {
                error!(error = %err, "planner task failed");
                let body = Json(ErrorBody {
                    error: "internal_error",
                    message: err.to_string(),
                });
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }
        };
        let status = match &err {
            PlanningError::Validation(_) => StatusCode::BAD_REQUEST,
            PlanningError::StateConflict { .. } => StatusCode::CONFLICT,
            PlanningError::NotFound { .. } => StatusCode::NOT_FOUND,
            PlanningError::Consistency { .. } | PlanningError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %err, "request failed");
        }
        let body = Json(ErrorBody {
            error: err.kind(),
            message: err.to_string(),
        });
        (status, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct AllocatePayload {
    resource_id: String,
    days: Vec<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct BookingQuery {
    resource_id: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/lines", post(create_line))
        .route("/lines/:id", get(get_line).delete(delete_line))
        .route("/lines/:id/allocations", post(allocate))
        .route("/lines/:id/remainder", post(report_remainder))
        .route("/lines/:id/booking", post(sync_booking))
        .route("/groups/:id", get(get_group))
        .route("/bookings", get(list_bookings))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, planner: LinePlanner<PlannerStore>) -> std::io::Result<()> {
    let state = AppState::new(planner);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn create_line(
    State(state): State<AppState>,
    Json(line): Json<NewProjectLine>,
) -> Result<(StatusCode, Json<ProjectLine>), ApiError> {
    let created = state.run(move |planner| planner.create_line(line)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_line(
    State(state): State<AppState>,
    Path(line_id): Path<LineId>,
) -> Result<Json<ProjectLine>, ApiError> {
    Ok(Json(state.run(move |planner| planner.line(line_id)).await?))
}

async fn delete_line(
    State(state): State<AppState>,
    Path(line_id): Path<LineId>,
) -> Result<Json<Deletion>, ApiError> {
    Ok(Json(state.run(move |planner| planner.delete_line(line_id)).await?))
}

async fn allocate(
    State(state): State<AppState>,
    Path(line_id): Path<LineId>,
    Json(payload): Json<AllocatePayload>,
) -> Result<(StatusCode, Json<Allocation>), ApiError> {
    let allocation = state
        .run(move |planner| planner.allocate(line_id, &payload.resource_id, payload.days))
        .await?;
    Ok((StatusCode::CREATED, Json(allocation)))
}

async fn report_remainder(
    State(state): State<AppState>,
    Path(line_id): Path<LineId>,
) -> Result<(StatusCode, Json<RemainderSplit>), ApiError> {
    let split = state
        .run(move |planner| planner.report_remainder(line_id))
        .await?;
    Ok((StatusCode::CREATED, Json(split)))
}

async fn sync_booking(
    State(state): State<AppState>,
    Path(line_id): Path<LineId>,
) -> Result<Json<SyncOutcome>, ApiError> {
    Ok(Json(state.run(move |planner| planner.sync_booking(line_id)).await?))
}

async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
) -> Result<Json<LineGroup>, ApiError> {
    Ok(Json(state.run(move |planner| planner.group(group_id)).await?))
}

async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingQuery>,
) -> Result<Json<Vec<BookingRecord>>, ApiError> {
    let bookings = state
        .run(move |planner| match query.resource_id {
            Some(resource_id) => planner.resource_bookings(&resource_id),
            None => planner.bookings(),
        })
        .await?;
    Ok(Json(bookings))
}
