use std::collections::HashMap;
use std::sync::Arc;

use crate::classifier;
use crate::db_storage::ClientStore;
use crate::errors::{AppError, ResultExt};
use crate::models::*;

/// Sentinel accepted by the search filters to mean "no filter".
const ALL_SENTINEL: &str = "all";

/// Treats missing, blank and `all` values alike. Active values are
/// returned untouched: padding is part of what gets matched.
fn active_filter(value: Option<&str>) -> Option<&str> {
    value.filter(|v| {
        let trimmed = v.trim();
        !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case(ALL_SENTINEL)
    })
}

/// Client repository operations: lookup, listing, search and creation.
pub struct ClientService {
    store: Arc<dyn ClientStore>,
    region_label: String,
}

impl ClientService {
    pub fn new(store: Arc<dyn ClientStore>, region_label: impl Into<String>) -> Self {
        Self {
            store,
            region_label: region_label.into(),
        }
    }

    /// Fetches one client view. `NotFound` when no record has this id.
    pub async fn get_by_id(&self, id: i64) -> Result<ClientView, AppError> {
        let client = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Client not found".to_string()))?;

        Ok(classifier::to_view(&client, &self.region_label))
    }

    /// Lists every stored client.
    ///
    /// # Returns
    ///
    /// * `Result<Vec<ClientView>, AppError>` - Views ordered by id, or the store error.
    pub async fn list_all(&self) -> Result<Vec<ClientView>, AppError> {
        let clients = self.store.list_all().await?;
        Ok(self.views(&clients))
    }

    /// Filtered search.
    ///
    /// Name and region are matched by the store; the segment filter runs
    /// afterwards on the recomputed segment of each candidate. An unknown
    /// segment label matches nothing.
    pub async fn search(&self, params: &SearchParams) -> Result<Vec<ClientView>, AppError> {
        let query = active_filter(params.q.as_deref());
        tracing::info!("Search query: {}", query.unwrap_or(""));

        let filter = ClientFilter {
            name_contains: query.map(str::to_string),
            region: active_filter(params.region.as_deref()).map(str::to_string),
        };

        let segment = match active_filter(params.segment.as_deref()) {
            None => None,
            Some(label) => match label.trim().parse::<Segment>() {
                Ok(segment) => Some(segment),
                Err(e) => {
                    tracing::debug!("Segment filter matches nothing: {}", e);
                    return Ok(Vec::new());
                }
            },
        };

        let candidates = self.store.search(&filter).await?;
        let views: Vec<ClientView> = candidates
            .iter()
            .filter(|c| segment.map_or(true, |s| classifier::segment(c.income) == s))
            .map(|c| classifier::to_view(c, &self.region_label))
            .collect();

        tracing::info!("Found {} clients", views.len());
        Ok(views)
    }

    /// Validates and persists a new client.
    ///
    /// # Arguments
    ///
    /// * `new_client` - The payload. An `id` of 0 or none lets the store assign one.
    ///
    /// # Returns
    ///
    /// * `Result<Client, AppError>` - The stored record, `BadRequest` for invalid input
    ///   or a duplicate id.
    pub async fn create(&self, new_client: &NewClient) -> Result<Client, AppError> {
        new_client.validate()?;

        let client = self
            .store
            .insert(new_client)
            .await
            .with_context(|| {
                format!(
                    "creating client {} {}",
                    new_client.first_name, new_client.last_name
                )
            })?;

        tracing::info!("Created client {}", client.id);
        Ok(client)
    }

    fn views(&self, clients: &[Client]) -> Vec<ClientView> {
        clients
            .iter()
            .map(|c| classifier::to_view(c, &self.region_label))
            .collect()
    }
}

/// Static model-quality figures reported by analytics.
pub const MODEL_ACCURACY: f64 = 87.5;
pub const MODEL_PRECISION: f64 = 85.2;
pub const MODEL_RECALL: f64 = 89.1;

/// Portfolio-level statistics over the whole client set.
pub struct AnalyticsService {
    store: Arc<dyn ClientStore>,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self { store }
    }

    pub async fn portfolio_summary(&self) -> Result<AnalyticsSummary, AppError> {
        let clients = self
            .store
            .list_all()
            .await
            .context("loading clients for analytics")?;
        Ok(summarize(&clients))
    }
}

/// Computes the portfolio summary for a set of clients.
pub fn summarize(clients: &[Client]) -> AnalyticsSummary {
    let total = clients.len();
    let mean_income = if total == 0 {
        0.0
    } else {
        clients.iter().map(|c| c.income).sum::<f64>() / total as f64
    };

    let mut counts: HashMap<Segment, u64> = HashMap::new();
    for client in clients {
        *counts.entry(classifier::segment(client.income)).or_insert(0) += 1;
    }

    let segmentation = Segment::ALL
        .iter()
        .map(|segment| {
            let count = counts.get(segment).copied().unwrap_or(0);
            let percentage = if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            };
            SegmentShare {
                segment: *segment,
                count,
                percentage,
            }
        })
        .collect();

    AnalyticsSummary {
        total_clients: total as u64,
        model_performance: ModelPerformance {
            accuracy: MODEL_ACCURACY,
            precision: MODEL_PRECISION,
            recall: MODEL_RECALL,
        },
        segmentation,
        business_metrics: BusinessMetrics {
            conversion_rate: conversion_rate(total, mean_income),
            average_ticket: mean_income,
            roi: roi(total),
        },
    }
}

/// `min(60, 20 + mean/50000 * 40)`, zero for an empty portfolio.
fn conversion_rate(total: usize, mean_income: f64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (20.0 + (mean_income / 50_000.0) * 40.0).min(60.0)
}

/// `150 + 2 * count`, zero for an empty portfolio.
fn roi(total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    150.0 + 2.0 * total as f64
}

pub const PREDICTED_INCOME: f64 = 255_000.0;
pub const PREDICTION_CONFIDENCE: f64 = 0.85;
const INTERVAL_SPREAD: f64 = 0.1;

/// Placeholder income prediction. Not connected to any model: the request's
/// features never influence the result.
#[derive(Default)]
pub struct PredictionService;

impl PredictionService {
    pub fn new() -> Self {
        Self
    }

    /// Produces the fixed prediction.
    ///
    /// # Arguments
    ///
    /// * `request` - The prediction request. Only `client_id` is logged.
    ///
    /// # Returns
    ///
    /// * `PredictionResult` - The same result for every request.
    pub fn predict(&self, request: &PredictionRequest) -> PredictionResult {
        tracing::debug!(
            "Placeholder prediction for client {} ({} features ignored)",
            request.client_id,
            request.features.len()
        );

        PredictionResult {
            predicted_income: PREDICTED_INCOME,
            confidence: PREDICTION_CONFIDENCE,
            confidence_interval: ConfidenceInterval {
                min: PREDICTED_INCOME * (1.0 - INTERVAL_SPREAD),
                max: PREDICTED_INCOME * (1.0 + INTERVAL_SPREAD),
            },
            factors: vec!["возраст".to_string(), "кредитная история".to_string()],
            recommendations: vec![Recommendation {
                product: "Кредитная карта".to_string(),
                reason: "Доход позволяет".to_string(),
            }],
        }
    }
}
