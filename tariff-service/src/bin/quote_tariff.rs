use std::{env, fs, io, sync::Arc};

use anyhow::{bail, Context, Result};
use tariff_service::{
    config::AppConfig,
    observability,
    pipeline::{RateSource, TariffPipeline, TariffRequest},
    sinks::MemoryProjectStore,
    sources::{OpenEiRateSource, StaticRateSource},
    transform::project,
};

/// One-shot tariff lookup. Prints the yearly projection as CSV on stdout and
/// persists nothing.
///
/// Set `TARIFF_RATES_FILE` to replay a saved rate lookup response instead of
/// calling the rate service.
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: quote_tariff <address> [kwh] [escalator_pct]");
    }

    let cfg = AppConfig::load()?;

    let address = args[1].clone();
    let kwh: i32 = match args.get(2) {
        Some(s) => s.parse().with_context(|| format!("invalid kwh '{s}'"))?,
        None => i32::try_from(cfg.tariff.default_kwh)?,
    };
    if kwh < 0 {
        bail!("kwh must be non-negative");
    }
    let escalator_pct: f64 = match args.get(3) {
        Some(s) => s.parse().with_context(|| format!("invalid escalator_pct '{s}'"))?,
        None => cfg.tariff.default_escalator_pct,
    };

    let source: Arc<dyn RateSource> = match env::var("TARIFF_RATES_FILE") {
        Ok(path) => {
            let body = fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?;
            Arc::new(StaticRateSource::from_response_json(&body)?)
        }
        Err(_) => Arc::new(OpenEiRateSource::new(&cfg.openei)?),
    };

    let pipeline = TariffPipeline {
        source,
        store: Arc::new(MemoryProjectStore::default()),
        notifier: None,
    };
    let request = TariffRequest {
        address,
        kwh,
        escalator: escalator_pct / 100.0,
        selected_tariff: env::var("TARIFF_SELECTED").ok(),
    };

    let quote = pipeline.quote(&request).await?;
    let tariff = &quote.selected_tariff;
    tracing::info!(
        tariff = %tariff.name,
        utility = %tariff.utility,
        rate_cents = tariff.rate,
        candidates = quote.tariffs.len(),
        cost_first_year = quote.cost_first_year,
        "tariff selected"
    );

    let mut wtr = csv::Writer::from_writer(io::stdout());
    wtr.write_record(["year", "cost"])?;
    let costs = project(f64::from(quote.kwh), tariff.rate, quote.escalator, cfg.tariff.projection_years);
    for (year, cost) in costs.iter().enumerate() {
        wtr.write_record([(year + 1).to_string(), format!("{cost:.2}")])?;
    }
    wtr.flush()?;

    Ok(())
}
