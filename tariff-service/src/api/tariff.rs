use axum::{extract::State, Json};
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::{auth::AuthUser, error::ApiError, extract::ApiJson, AppState};
use crate::{
    config::TariffConfig,
    pipeline::{RecordedQuote, TariffRequest},
    transform::Tariff,
};

/// Numbers arrive as JSON numbers or as strings straight from form inputs.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Int(i64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
pub struct TariffForm {
    pub address: Option<String>,
    #[serde(rename = "kWh_consumption")]
    pub kwh_consumption: Option<Numeric>,
    /// Percent.
    pub escalator: Option<Numeric>,
    pub selected_tariff: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TariffResponse {
    pub address: String,
    pub kwh: i32,
    /// Percent, as submitted.
    pub escalator: f64,
    pub selected_tariff: Tariff,
    pub tariffs: Vec<Tariff>,
    pub cost_first_year: f64,
    pub project_id: i64,
}

impl From<RecordedQuote> for TariffResponse {
    fn from(recorded: RecordedQuote) -> Self {
        let quote = recorded.quote;
        Self {
            address: quote.address,
            kwh: quote.kwh,
            escalator: quote.escalator * 100.0,
            selected_tariff: quote.selected_tariff,
            tariffs: quote.tariffs,
            cost_first_year: quote.cost_first_year,
            project_id: recorded.project.id,
        }
    }
}

fn parse_kwh(value: Option<Numeric>, default: i64) -> Result<i32, ApiError> {
    let invalid = || ApiError::BadRequest("kWh_consumption must be a non-negative integer".to_string());

    let kwh = match value {
        None => default,
        Some(Numeric::Int(n)) => n,
        Some(Numeric::Float(f)) if f.is_finite() => f.trunc() as i64,
        Some(Numeric::Float(_)) => return Err(invalid()),
        Some(Numeric::Text(s)) => s.trim().parse::<i64>().map_err(|_| invalid())?,
    };

    if kwh < 0 {
        return Err(invalid());
    }
    i32::try_from(kwh).map_err(|_| invalid())
}

/// Percent in, fraction out.
fn parse_escalator(value: Option<Numeric>, default_pct: f64) -> Result<f64, ApiError> {
    let invalid = || ApiError::BadRequest("escalator must be a number".to_string());

    let pct = match value {
        None => default_pct,
        Some(Numeric::Int(n)) => n as f64,
        Some(Numeric::Float(f)) => f,
        Some(Numeric::Text(s)) => s.trim().parse::<f64>().map_err(|_| invalid())?,
    };

    if !pct.is_finite() {
        return Err(invalid());
    }
    Ok(pct / 100.0)
}

fn pick_address(address: Option<String>, cfg: &TariffConfig) -> Result<String, ApiError> {
    match address {
        Some(address) if !address.trim().is_empty() => Ok(address.trim().to_string()),
        _ => cfg
            .fallback_addresses
            .choose(&mut rand::rng())
            .cloned()
            .ok_or_else(|| ApiError::BadRequest("address is required".to_string())),
    }
}

impl TariffForm {
    pub fn into_request(self, cfg: &TariffConfig) -> Result<TariffRequest, ApiError> {
        Ok(TariffRequest {
            address: pick_address(self.address, cfg)?,
            kwh: parse_kwh(self.kwh_consumption, cfg.default_kwh)?,
            escalator: parse_escalator(self.escalator, cfg.default_escalator_pct)?,
            selected_tariff: self.selected_tariff,
        })
    }
}

/// `POST /api/tariff/`
///
/// Looks up tariffs for the address, records the selection as a project of the
/// caller and returns it. An unknown `selected_tariff` silently falls back to the
/// utility's default tariff, or the first candidate.
pub async fn submit_tariff(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(form): ApiJson<TariffForm>,
) -> Result<Json<TariffResponse>, ApiError> {
    let request = form.into_request(&state.tariff)?;
    let recorded = state.pipeline.run(&user, request).await?;
    Ok(Json(recorded.into()))
}
