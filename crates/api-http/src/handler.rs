//! Prediction and health handlers
//!
//! One GET route per capability; query parameters are forwarded untouched to the
//! prediction use case, which owns validation and argument ordering.

use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

use greenearth_core::domain::{Capability, Payload, QueryParams};

use crate::error::ApiError;
use crate::state::ApiState;

/// REST path serving a capability
pub fn route_path(capability: Capability) -> &'static str {
    match capability {
        Capability::AirQuality => "/api/aqi/predict",
        Capability::Forecast => "/api/aqi/capstone/predict",
        Capability::ActivityRecommendation => "/api/activity/recommend",
        Capability::ActivityRecommendationV2 => "/api/activity/v2/recommend",
        Capability::Regression => "/api/aqiRegress/regression",
        Capability::Newsfeed => "/api/newsfeed",
    }
}

/// Run one prediction and return the payload verbatim
pub async fn predict(
    capability: Capability,
    State(state): State<ApiState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Payload>, ApiError> {
    info!(capability = %capability, "Prediction request");

    state
        .predictions
        .predict(capability, &params)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_prediction(capability, e))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
}

pub async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: greenearth_core::VERSION,
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_capability_has_a_distinct_route() {
        let paths: HashSet<_> = Capability::ALL.iter().map(|c| route_path(*c)).collect();
        assert_eq!(paths.len(), Capability::ALL.len());
    }
}
