use std::{collections::BTreeMap, net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    CalculationRequest, CatalogEntry, CatalogError, CrewRounding, DeviationNotifier,
    ElementCatalog, EstimateBuilder, EstimateError, EstimateListing, EstimateStore, LogNotifier,
    PersistenceError, ProgressRecord, ProgressUpdate, ProjectEstimate, StoredEstimate,
    UnitEstimator, ValidationError, notify, persistence::validate_actual_days,
};

#[derive(Clone)]
pub struct AppState {
    catalog: Arc<RwLock<ElementCatalog>>,
    estimator: Arc<dyn UnitEstimator + Send + Sync>,
    store: Arc<dyn EstimateStore>,
    notifier: Arc<dyn DeviationNotifier + Send + Sync>,
    rounding: CrewRounding,
}

impl AppState {
    pub fn new(
        catalog: ElementCatalog,
        estimator: Arc<dyn UnitEstimator + Send + Sync>,
        store: Arc<dyn EstimateStore>,
    ) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
            estimator,
            store,
            notifier: Arc::new(LogNotifier),
            rounding: CrewRounding::default(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn DeviationNotifier + Send + Sync>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_rounding(mut self, rounding: CrewRounding) -> Self {
        self.rounding = rounding;
        self
    }

    fn calculate(&self, request: &CalculationRequest) -> Result<ProjectEstimate, ApiError> {
        let catalog = self.catalog.read();
        let requests = request.element_requests(&*catalog)?;
        let estimate = EstimateBuilder::new(&*catalog, self.estimator.as_ref())
            .with_rounding(self.rounding)
            .with_country(request.country.as_str())
            .build(&request.project_name, &requests, request.time_frame_days)?;
        Ok(estimate)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Invalid(String),
    Unprocessable(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn parts(&self) -> (StatusCode, &'static str, &str) {
        match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Unprocessable(message) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "estimation_failed", message)
            }
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        ApiError::Invalid(value.to_string())
    }
}

impl From<CatalogError> for ApiError {
    fn from(value: CatalogError) -> Self {
        ApiError::Invalid(value.to_string())
    }
}

impl From<EstimateError> for ApiError {
    fn from(value: EstimateError) -> Self {
        ApiError::Unprocessable(value.to_string())
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::NotFound(_) => ApiError::NotFound(value.to_string()),
            PersistenceError::InvalidData(message) => ApiError::Invalid(message),
            other => {
                tracing::error!(error = %other, "store failure");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = self.parts();
        let body = Json(ErrorBody {
            error,
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommittedEstimate {
    pub id: i64,
    pub estimate: ProjectEstimate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressReport {
    pub updates: Vec<ProgressUpdate>,
    /// Elements in the request that the estimate has no record for.
    pub unknown_elements: Vec<String>,
    pub notifications_sent: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/catalog", get(get_catalog).put(replace_catalog))
        .route("/calculate", post(calculate))
        .route("/estimates", get(list_estimates).post(commit_estimate))
        .route("/estimates/:id", get(get_estimate))
        .route(
            "/estimates/:id/progress",
            get(get_progress).post(update_progress),
        )
        .with_state(state)
}

/// Runs store work on the blocking pool so SQLite I/O never stalls a runtime worker.
async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|err| {
        tracing::error!(error = %err, "store task failed");
        ApiError::Internal(err.to_string())
    })?
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "estimate-tool HTTP API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_catalog(State(state): State<AppState>) -> Json<Vec<CatalogEntry>> {
    let entries = state.catalog.read().to_vec();
    Json(entries)
}

async fn replace_catalog(
    State(state): State<AppState>,
    Json(entries): Json<Vec<CatalogEntry>>,
) -> Result<Json<Vec<CatalogEntry>>, ApiError> {
    let catalog = ElementCatalog::new(entries)?;
    let current = catalog.to_vec();
    *state.catalog.write() = catalog;
    tracing::info!(entries = current.len(), "catalog replaced");
    Ok(Json(current))
}

async fn calculate(
    State(state): State<AppState>,
    Json(request): Json<CalculationRequest>,
) -> Result<Json<ProjectEstimate>, ApiError> {
    let estimate = state.calculate(&request)?;
    Ok(Json(estimate))
}

async fn commit_estimate(
    State(state): State<AppState>,
    Json(request): Json<CalculationRequest>,
) -> Result<(StatusCode, Json<CommittedEstimate>), ApiError> {
    let estimate = state.calculate(&request)?;
    if estimate.is_empty() {
        return Err(ApiError::Invalid(
            "nothing to commit: no element has a positive quantity".into(),
        ));
    }
    let store = Arc::clone(&state.store);
    let committed = run_blocking(move || {
        let id = store.save_estimate(&estimate)?;
        Ok(CommittedEstimate { id, estimate })
    })
    .await?;
    Ok((StatusCode::CREATED, Json(committed)))
}

async fn list_estimates(
    State(state): State<AppState>,
) -> Result<Json<Vec<EstimateListing>>, ApiError> {
    let store = Arc::clone(&state.store);
    let listings = run_blocking(move || Ok(store.list_estimates()?)).await?;
    Ok(Json(listings))
}

async fn get_estimate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StoredEstimate>, ApiError> {
    let store = Arc::clone(&state.store);
    match run_blocking(move || Ok(store.load_estimate(id)?)).await? {
        Some(stored) => Ok(Json(stored)),
        None => Err(ApiError::not_found(format!("estimate {id} not found"))),
    }
}

async fn get_progress(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ProgressRecord>>, ApiError> {
    let store = Arc::clone(&state.store);
    let records = run_blocking(move || Ok(store.progress_records(id)?)).await?;
    Ok(Json(records))
}

/// Outcome of applying a progress report. Updates made before a store failure are kept
/// so their events still reach the notifier.
struct AppliedProgress {
    updates: Vec<ProgressUpdate>,
    unknown_elements: Vec<String>,
    failure: Option<PersistenceError>,
}

fn apply_progress(
    store: &dyn EstimateStore,
    id: i64,
    reported: BTreeMap<String, f64>,
) -> AppliedProgress {
    let mut applied = AppliedProgress {
        updates: Vec::with_capacity(reported.len()),
        unknown_elements: Vec::new(),
        failure: None,
    };
    for (element_id, actual_days) in reported {
        match store.update_progress(id, &element_id, actual_days) {
            Ok(Some(update)) => applied.updates.push(update),
            Ok(None) => applied.unknown_elements.push(element_id),
            Err(err) => {
                applied.failure = Some(err);
                break;
            }
        }
    }
    applied
}

async fn update_progress(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(reported): Json<BTreeMap<String, f64>>,
) -> Result<Json<ProgressReport>, ApiError> {
    // reject the whole report before any record changes
    for (element_id, actual_days) in &reported {
        validate_actual_days(element_id, *actual_days)?;
    }

    let store = Arc::clone(&state.store);
    let applied = run_blocking(move || Ok(apply_progress(store.as_ref(), id, reported))).await?;

    let events: Vec<_> = applied
        .updates
        .iter()
        .filter_map(|u| u.event.clone())
        .collect();
    let notifications_sent = notify::dispatch(state.notifier.as_ref(), &events);
    if let Some(err) = applied.failure {
        return Err(err.into());
    }
    Ok(Json(ProgressReport {
        updates: applied.updates,
        unknown_elements: applied.unknown_elements,
        notifications_sent,
    }))
}
