use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{error::ApiError, extract::ApiQuery, AppState};
use crate::transform::project;

pub const MAX_PROJECTION_YEARS: usize = 100;

#[derive(Debug, Deserialize)]
pub struct CostGraphParams {
    pub kwh: f64,
    /// Cents per kWh.
    pub rate: f64,
    /// Fraction, e.g. 0.04.
    pub escalator: f64,
    pub years: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CostGraphResponse {
    pub costs: Vec<f64>,
}

/// `GET /api/utility_cost/`: yearly cost projection for the graph.
pub async fn utility_cost_graph(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<CostGraphParams>,
) -> Result<Json<CostGraphResponse>, ApiError> {
    if !(params.kwh.is_finite() && params.kwh >= 0.0) {
        return Err(ApiError::BadRequest("kwh must be a non-negative number".to_string()));
    }
    if !(params.rate.is_finite() && params.escalator.is_finite()) {
        return Err(ApiError::BadRequest("rate and escalator must be finite numbers".to_string()));
    }

    let years = params.years.unwrap_or(state.tariff.projection_years);
    if !(1..=MAX_PROJECTION_YEARS).contains(&years) {
        return Err(ApiError::BadRequest(format!(
            "years must be between 1 and {MAX_PROJECTION_YEARS}"
        )));
    }

    Ok(Json(CostGraphResponse {
        costs: project(params.kwh, params.rate, params.escalator, years),
    }))
}
