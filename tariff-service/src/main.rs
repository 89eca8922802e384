use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tariff_service::{
    api::{self, auth::PgTokenResolver, AppState},
    config::AppConfig,
    metrics_server,
    observability,
    pipeline::TariffPipeline,
    sinks::PgProjectStore,
    sources::OpenEiRateSource,
    webhook::WebhookNotifier,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    // Schema is expected to be applied out-of-band via `sql/schema/*.sql`.
    let pool = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.uri)
        .await?;

    let notifier = cfg.webhook.as_ref().map(WebhookNotifier::new).transpose()?;
    if notifier.is_none() {
        tracing::info!("no webhook configured, project notifications disabled");
    }

    let state = AppState {
        pipeline: TariffPipeline {
            source: Arc::new(OpenEiRateSource::new(&cfg.openei)?),
            store: Arc::new(PgProjectStore::new(pool.clone())),
            notifier,
        },
        tokens: Arc::new(PgTokenResolver::new(pool)),
        tariff: Arc::new(cfg.tariff.clone()),
    };

    api::serve(&cfg.http.bind_addr, state).await
}
