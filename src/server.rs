use crate::config::ServerConfig;
use crate::data::{ClassCapacity, Day, Entry, ScheduleSlot};
use crate::error::StoreError;
use crate::generate::{GenerateRequest, GenerateResponse, generate};
use crate::moves::MoveValidator;
use crate::persist::{
    self, InMemoryStore, LoadedTimetable, RestoredTimetable, SaveTimetableRequest,
    TimetableHeader, TimetableStore,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<InMemoryStore>>,
    default_time_budget: Duration,
}

impl AppState {
    pub fn new(default_time_budget: Duration) -> Self {
        Self {
            store: Arc::new(Mutex::new(InMemoryStore::new())),
            default_time_budget,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub entries: Vec<Entry>,
    pub moving_index: usize,
    pub new_slot_id: String,
    pub new_day: Day,
    /// When given, slot ids outside this list are rejected.
    #[serde(default)]
    pub slots: Option<Vec<ScheduleSlot>>,
    #[serde(default)]
    pub capacity: ClassCapacity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResponse {
    pub allowed: bool,
    pub noop: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedResponse {
    pub id: String,
}

fn store_error(e: StoreError) -> (StatusCode, String) {
    let status = match e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, e.to_string())
}

async fn solve_handler(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, Response> {
    if let Err(issues) = request.validate() {
        return Err((StatusCode::BAD_REQUEST, Json(issues)).into_response());
    }
    let budget = state.default_time_budget;
    // the solve is CPU-bound and synchronous
    tokio::task::spawn_blocking(move || generate(&request, budget))
        .await
        .map(Json)
        .map_err(|e| {
            error!("Solve task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        })
}

async fn validate_move_handler(
    Json(request): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, (StatusCode, String)> {
    let validator = match &request.slots {
        Some(slots) => MoveValidator::new(slots, &request.capacity),
        None => MoveValidator::without_slot_check(&request.capacity),
    };
    let allowed = validator
        .can_move(
            &request.entries,
            request.moving_index,
            &request.new_slot_id,
            request.new_day,
        )
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let noop = MoveValidator::is_noop(
        &request.entries[request.moving_index],
        &request.new_slot_id,
        request.new_day,
    );
    Ok(Json(MoveResponse { allowed, noop }))
}

async fn save_handler(
    State(state): State<AppState>,
    Json(request): Json<SaveTimetableRequest>,
) -> Result<(StatusCode, Json<SavedResponse>), (StatusCode, String)> {
    let id = state.store.lock().await.save(request).map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(SavedResponse { id })))
}

async fn list_handler(State(state): State<AppState>) -> Json<Vec<TimetableHeader>> {
    Json(state.store.lock().await.list())
}

async fn load_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LoadedTimetable>, (StatusCode, String)> {
    let loaded = state.store.lock().await.load(&id).map_err(store_error)?;
    Ok(Json(loaded))
}

async fn restore_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RestoredTimetable>, (StatusCode, String)> {
    let loaded = state.store.lock().await.load(&id).map_err(store_error)?;
    Ok(Json(persist::load(&loaded)))
}

async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    state.store.lock().await.delete(&id).map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/timetable/solve", post(solve_handler))
        .route("/v1/timetable/moves/validate", post(validate_move_handler))
        .route("/v1/timetables", post(save_handler).get(list_handler))
        .route("/v1/timetables/:id", get(load_handler).delete(delete_handler))
        .route("/v1/timetables/:id/restore", get(restore_handler))
        .with_state(state)
}

pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let app = router(AppState::new(config.default_time_budget));
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}
