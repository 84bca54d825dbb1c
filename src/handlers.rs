use crate::config::Config;
use crate::db_storage::ClientStore;
use crate::errors::AppError;
use crate::models::*;
use crate::services::{AnalyticsService, ClientService, PredictionService};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Client record storage.
    pub store: Arc<dyn ClientStore>,
    /// Application configuration.
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn ClientStore>, config: Config) -> Self {
        Self { store, config }
    }

    fn client_service(&self) -> ClientService {
        ClientService::new(self.store.clone(), self.config.client_region_label.clone())
    }
}

/// Health check endpoint.
///
/// Returns the service status and version.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /api/clients
///
/// Lists every stored client with its derived segment and score.
#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "clients",
    responses(
        (status = 200, description = "All clients", body = [ClientView]),
        (status = 500, description = "Store unavailable", body = crate::errors::ErrorBody)
    )
)]
pub async fn list_clients(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ClientView>>, AppError> {
    tracing::info!("GET /clients");

    let clients = state.client_service().list_all().await?;
    Ok(Json(clients))
}

/// GET /api/clients/search
///
/// Filters clients by name substring, region and segment.
#[utoipa::path(
    get,
    path = "/api/clients/search",
    tag = "clients",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching clients, possibly empty", body = [ClientView]),
        (status = 500, description = "Store unavailable", body = crate::errors::ErrorBody)
    )
)]
pub async fn search_clients(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ClientView>>, AppError> {
    tracing::info!("GET /clients/search - params: {:?}", params);

    let clients = state.client_service().search(&params).await?;
    Ok(Json(clients))
}

/// GET /api/clients/:id
///
/// Ids that are not integers are reported as missing clients.
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "clients",
    params(("id" = String, Path, description = "Client identifier")),
    responses(
        (status = 200, description = "The client", body = ClientView),
        (status = 404, description = "No such client", body = crate::errors::ErrorBody),
        (status = 500, description = "Store unavailable", body = crate::errors::ErrorBody)
    )
)]
pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ClientView>, AppError> {
    tracing::info!("GET /clients/{}", id);

    let id: i64 = id
        .trim()
        .parse()
        .map_err(|_| AppError::NotFound("Client not found".to_string()))?;

    let client = state.client_service().get_by_id(id).await?;
    Ok(Json(client))
}

/// POST /api/clients
///
/// Stores a new client. A caller-supplied `id` is kept as is.
#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "clients",
    request_body = NewClient,
    responses(
        (status = 201, description = "Client created", body = Client),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorBody),
        (status = 413, description = "Body too large", body = crate::errors::ErrorBody),
        (status = 500, description = "Store unavailable", body = crate::errors::ErrorBody)
    )
)]
pub async fn create_client(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewClient>, JsonRejection>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    let Json(new_client) = payload?;
    tracing::info!(
        "POST /clients - {} {}",
        new_client.first_name,
        new_client.last_name
    );

    let client = state.client_service().create(&new_client).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

/// POST /api/predict/income
///
/// Returns the placeholder income prediction.
#[utoipa::path(
    post,
    path = "/api/predict/income",
    tag = "prediction",
    request_body = PredictionRequest,
    responses(
        (status = 200, description = "Placeholder prediction", body = PredictionResult),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorBody),
        (status = 413, description = "Body too large", body = crate::errors::ErrorBody)
    )
)]
pub async fn predict_income(
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, AppError> {
    let Json(request) =
        payload.map_err(|e| AppError::from_json_rejection(e, "Invalid request"))?;
    tracing::info!("POST /predict/income - client_id: {}", request.client_id);

    Ok(Json(PredictionService::new().predict(&request)))
}

/// GET /api/analytics
///
/// Portfolio summary over all clients.
#[utoipa::path(
    get,
    path = "/api/analytics",
    tag = "analytics",
    responses(
        (status = 200, description = "Portfolio summary", body = AnalyticsSummary),
        (status = 500, description = "Store unavailable", body = crate::errors::ErrorBody)
    )
)]
pub async fn analytics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnalyticsSummary>, AppError> {
    tracing::info!("GET /analytics");

    let summary = AnalyticsService::new(state.store.clone())
        .portfolio_summary()
        .await?;

    tracing::debug!(
        "Analytics computed for {} clients",
        summary.total_clients
    );
    Ok(Json(summary))
}
