pub mod auth;
pub mod error;
pub mod extract;
pub mod projects;
pub mod tariff;
pub mod utility_cost;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::{config::TariffConfig, pipeline::TariffPipeline};
use auth::{AuthUser, TokenResolver};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: TariffPipeline,
    pub tokens: Arc<dyn TokenResolver>,
    pub tariff: Arc<TariffConfig>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/tariff/", post(tariff::submit_tariff))
        .route("/api/projects/", get(projects::list_projects))
        .route("/api/utility_cost/", get(utility_cost::utility_cost_graph))
        .route("/api/protected/", get(protected))
        .with_state(state)
}

/// `GET /api/protected/`: token check for clients.
async fn protected(AuthUser(user): AuthUser) -> Json<Value> {
    Json(json!({
        "message": format!("Hello, {}! This is a protected view.", user.username)
    }))
}

pub async fn serve(bind_addr: &str, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid http.bind_addr: {e}"))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "tariff API listening");
    axum::serve(listener, router(state).into_make_service()).await?;
    Ok(())
}
