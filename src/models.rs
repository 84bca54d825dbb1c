use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

use crate::errors::AppError;

// ============ Database Models ============

/// A stored client record.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Client {
    /// Unique identifier, immutable once assigned.
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    /// Income, zero or positive.
    pub income: f64,
    /// Free-text region label.
    pub region: String,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
}

/// Payload accepted by `POST /api/clients`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct NewClient {
    /// Caller-supplied identifier. The store assigns one when absent or 0.
    #[serde(default)]
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub income: f64,
    #[serde(default)]
    pub region: String,
}

impl NewClient {
    /// The id the caller asked for, if any. 0 means "assign one".
    pub fn requested_id(&self) -> Option<i64> {
        self.id.filter(|id| *id != 0)
    }

    /// Checks the invariants a stored client must satisfy.
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(id) = self.id {
            if id < 0 {
                return Err(AppError::BadRequest("id must not be negative".into()));
            }
        }
        if self.first_name.trim().is_empty() {
            return Err(AppError::BadRequest("first_name must not be empty".into()));
        }
        if self.last_name.trim().is_empty() {
            return Err(AppError::BadRequest("last_name must not be empty".into()));
        }
        if !(0..=150).contains(&self.age) {
            return Err(AppError::BadRequest("age must be between 0 and 150".into()));
        }
        if !self.income.is_finite() || self.income < 0.0 {
            return Err(AppError::BadRequest(
                "income must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

// ============ Derived Models ============

/// Income-based customer tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Segment {
    #[serde(rename = "VIP")]
    Vip,
    Premium,
    Standard,
    Basic,
}

impl Segment {
    /// All tiers, highest first. Analytics output follows this order.
    pub const ALL: [Segment; 4] = [
        Segment::Vip,
        Segment::Premium,
        Segment::Standard,
        Segment::Basic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Vip => "VIP",
            Segment::Premium => "Premium",
            Segment::Standard => "Standard",
            Segment::Basic => "Basic",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Segment {
    type Err = String;

    /// Accepts the English labels in any case and the legacy Russian labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vip" => Ok(Segment::Vip),
            "premium" | "премиум" => Ok(Segment::Premium),
            "standard" | "стандарт" => Ok(Segment::Standard),
            "basic" | "базовый" => Ok(Segment::Basic),
            other => Err(format!("unknown segment '{}'", other)),
        }
    }
}

/// Read-side projection of a client, derived on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClientView {
    /// Client identifier rendered as a string.
    pub id: String,
    /// First and last name joined by a space.
    pub name: String,
    pub income: f64,
    pub segment: Segment,
    /// Affinity score in [0, 10], one decimal.
    pub score: f64,
    pub region: String,
}

/// Query string of `GET /api/clients/search`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive substring of the first or last name.
    pub q: Option<String>,
    /// Segment label, or `all`.
    pub segment: Option<String>,
    /// Exact region, or `all`.
    pub region: Option<String>,
}

/// Store-level search criteria. `None` means the criterion is not applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientFilter {
    pub name_contains: Option<String>,
    pub region: Option<String>,
}

// ============ Prediction Models ============

/// Body of `POST /api/predict/income`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct PredictionRequest {
    /// Opaque client reference.
    pub client_id: String,
    /// Open-ended named feature values.
    #[serde(default, alias = "featuers")]
    #[schema(value_type = Object)]
    pub features: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConfidenceInterval {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Recommendation {
    pub product: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PredictionResult {
    pub predicted_income: f64,
    /// Confidence in [0, 1].
    pub confidence: f64,
    pub confidence_interval: ConfidenceInterval,
    pub factors: Vec<String>,
    // Wire name kept as the frontend reads it.
    #[serde(rename = "recomendations")]
    pub recommendations: Vec<Recommendation>,
}

// ============ Analytics Models ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModelPerformance {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SegmentShare {
    pub segment: Segment,
    pub count: u64,
    /// Share of all clients, 0..=100.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BusinessMetrics {
    pub conversion_rate: f64,
    /// Mean client income.
    pub average_ticket: f64,
    pub roi: f64,
}

/// Response of `GET /api/analytics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsSummary {
    pub total_clients: u64,
    pub model_performance: ModelPerformance,
    pub segmentation: Vec<SegmentShare>,
    pub business_metrics: BusinessMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_client() -> NewClient {
        NewClient {
            id: None,
            first_name: "Ivan".into(),
            last_name: "Petrov".into(),
            age: 35,
            income: 120_000.0,
            region: "Москва".into(),
        }
    }

    #[test]
    fn test_segment_labels_round_trip_through_json() {
        assert_eq!(serde_json::to_value(Segment::Vip).unwrap(), "VIP");
        assert_eq!(serde_json::to_value(Segment::Premium).unwrap(), "Premium");
        assert_eq!(Segment::Basic.to_string(), "Basic");
    }

    #[test]
    fn test_segment_parsing_accepts_aliases() {
        assert_eq!("vip".parse::<Segment>(), Ok(Segment::Vip));
        assert_eq!(" PREMIUM ".parse::<Segment>(), Ok(Segment::Premium));
        assert_eq!("Премиум".parse::<Segment>(), Ok(Segment::Premium));
        assert_eq!("Стандарт".parse::<Segment>(), Ok(Segment::Standard));
        assert_eq!("Базовый".parse::<Segment>(), Ok(Segment::Basic));
        assert!("Gold".parse::<Segment>().is_err());
    }

    #[test]
    fn test_new_client_requires_core_fields() {
        let missing_income = serde_json::json!({
            "first_name": "Ivan",
            "last_name": "Petrov",
            "age": 35
        });
        assert!(serde_json::from_value::<NewClient>(missing_income).is_err());

        let no_region = serde_json::json!({
            "first_name": "Ivan",
            "last_name": "Petrov",
            "age": 35,
            "income": 1000.0
        });
        let parsed: NewClient = serde_json::from_value(no_region).unwrap();
        assert_eq!(parsed.region, "");
        assert_eq!(parsed.id, None);
    }

    #[test]
    fn test_new_client_validation() {
        assert!(new_client().validate().is_ok());

        let zero_income = NewClient { income: 0.0, ..new_client() };
        assert!(zero_income.validate().is_ok());

        let negative_income = NewClient { income: -1.0, ..new_client() };
        assert!(negative_income.validate().is_err());

        let nan_income = NewClient { income: f64::NAN, ..new_client() };
        assert!(nan_income.validate().is_err());

        let blank_name = NewClient { first_name: "  ".into(), ..new_client() };
        assert!(blank_name.validate().is_err());

        let bad_age = NewClient { age: -3, ..new_client() };
        assert!(bad_age.validate().is_err());

        let bad_id = NewClient { id: Some(-1), ..new_client() };
        assert!(bad_id.validate().is_err());
    }

    #[test]
    fn test_zero_id_means_store_assigned() {
        let zero = NewClient { id: Some(0), ..new_client() };
        assert!(zero.validate().is_ok());
        assert_eq!(zero.requested_id(), None);

        let explicit = NewClient { id: Some(7), ..new_client() };
        assert_eq!(explicit.requested_id(), Some(7));
    }

    #[test]
    fn test_prediction_request_accepts_legacy_features_key() {
        let request: PredictionRequest = serde_json::from_value(serde_json::json!({
            "client_id": "42",
            "featuers": {"age": 30}
        }))
        .unwrap();
        assert_eq!(request.features.len(), 1);

        let request: PredictionRequest =
            serde_json::from_value(serde_json::json!({"client_id": "42"})).unwrap();
        assert!(request.features.is_empty());
    }

    #[test]
    fn test_prediction_result_uses_legacy_recommendations_key() {
        let result = PredictionResult {
            predicted_income: 1.0,
            confidence: 0.5,
            confidence_interval: ConfidenceInterval { min: 0.9, max: 1.1 },
            factors: vec![],
            recommendations: vec![],
        };
        let value = serde_json::to_value(result).unwrap();
        assert!(value.get("recomendations").is_some());
        assert!(value.get("recommendations").is_none());
    }
}
