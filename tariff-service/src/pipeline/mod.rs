use std::sync::Arc;

use serde_json::Value;
use tariff_client::domain::{currency_from_f64, NewProject, NewRateProposal, Project, RateProposal, User};

use crate::{
    transform::{first_year_cost, select, Tariff},
    webhook::{ProjectCreated, WebhookNotifier},
};

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("rate lookup request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("rate lookup returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("rate lookup unavailable: {0}")]
    Unavailable(String),
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("no utility rates found for the given address")]
    NoRatesFound,
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("first-year cost {0} is not a valid amount")]
    InvalidCost(f64),
}

/// Looks up raw utility rate items for an address.
///
/// Implementations return the source's items verbatim; a response without items
/// is an empty list, not an error.
#[async_trait::async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self, address: &str) -> Result<Vec<Value>, FetchError>;
}

/// Persistence for projects and their rate proposals.
#[async_trait::async_trait]
pub trait ProjectStore: Send + Sync {
    /// Store both records atomically.
    async fn record(
        &self,
        project: NewProject,
        proposal: NewRateProposal,
    ) -> Result<(Project, RateProposal), StoreError>;

    /// Projects owned by `user_id`, newest first.
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Project>, StoreError>;
}

/// A validated tariff request.
#[derive(Debug, Clone)]
pub struct TariffRequest {
    pub address: String,
    pub kwh: i32,
    /// Fraction, e.g. 0.04.
    pub escalator: f64,
    pub selected_tariff: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TariffQuote {
    pub address: String,
    pub kwh: i32,
    pub escalator: f64,
    pub selected_tariff: Tariff,
    pub tariffs: Vec<Tariff>,
    pub cost_first_year: f64,
}

#[derive(Debug, Clone)]
pub struct RecordedQuote {
    pub quote: TariffQuote,
    pub project: Project,
}

/// Rate lookup → tariff selection → first-year cost → persistence → webhook.
#[derive(Clone)]
pub struct TariffPipeline {
    pub source: Arc<dyn RateSource>,
    pub store: Arc<dyn ProjectStore>,
    pub notifier: Option<WebhookNotifier>,
}

impl TariffPipeline {
    /// Look up and select a tariff without persisting anything.
    pub async fn quote(&self, request: &TariffRequest) -> Result<TariffQuote, PipelineError> {
        let items = match self.source.fetch(&request.address).await {
            Ok(items) => items,
            Err(e) => {
                metrics::counter!("rate_lookups_failed_total").increment(1);
                return Err(e.into());
            }
        };

        let selection = select(&items, request.selected_tariff.as_deref());
        let Some(chosen) = selection.chosen().cloned() else {
            metrics::counter!("tariff_no_rates_total").increment(1);
            tracing::info!(
                address = %request.address,
                n_items = items.len(),
                "no candidate tariffs for address"
            );
            return Err(PipelineError::NoRatesFound);
        };

        if let Some(requested) = request.selected_tariff.as_deref() {
            if !requested.is_empty() && requested != chosen.name {
                tracing::info!(requested, chosen = %chosen.name, "requested tariff not found, using fallback");
            }
        }

        let cost_first_year = first_year_cost(f64::from(request.kwh), chosen.rate);

        Ok(TariffQuote {
            address: request.address.clone(),
            kwh: request.kwh,
            escalator: request.escalator,
            selected_tariff: chosen,
            tariffs: selection.candidates,
            cost_first_year,
        })
    }

    /// Quote a tariff for `user` and record the outcome as a project.
    pub async fn run(&self, user: &User, request: TariffRequest) -> Result<RecordedQuote, PipelineError> {
        metrics::counter!("tariff_requests_total").increment(1);

        let quote = self.quote(&request).await?;
        let cost_first_year =
            currency_from_f64(quote.cost_first_year).ok_or(PipelineError::InvalidCost(quote.cost_first_year))?;

        let tariff = &quote.selected_tariff;
        let project = NewProject {
            user_id: user.id,
            address: quote.address.clone(),
            kwh: quote.kwh,
            escalator: quote.escalator,
            selected_tariff: tariff.name.clone(),
            cost_first_year,
        };
        let proposal = NewRateProposal {
            external_id: tariff.external_id.clone().unwrap_or_default(),
            tariff_name: tariff.name.clone(),
            rate_structure: tariff.rate_structure.clone(),
            utility_name: tariff.utility.clone(),
        };

        let (project, proposal) = self.store.record(project, proposal).await?;
        metrics::counter!("projects_recorded_total").increment(1);
        tracing::info!(
            project_id = project.id,
            proposal_id = proposal.id,
            user = %user.username,
            tariff = %project.selected_tariff,
            "project recorded"
        );

        if let Some(notifier) = &self.notifier {
            notifier.notify(ProjectCreated::new(project.id, &user.username));
        }

        Ok(RecordedQuote { quote, project })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::WebhookConfig,
        sinks::MemoryProjectStore,
        sources::StaticRateSource,
        transform::{project, DEFAULT_PROJECTION_YEARS},
    };
    use mockito::Matcher;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::{str::FromStr, time::Duration};

    const TS_2023: i64 = 1_672_531_200;

    struct DownRateSource;

    #[async_trait::async_trait]
    impl RateSource for DownRateSource {
        async fn fetch(&self, _address: &str) -> Result<Vec<Value>, FetchError> {
            Err(FetchError::Unavailable("connection refused".to_string()))
        }
    }

    fn user() -> User {
        User {
            id: 7,
            username: "ada".to_string(),
        }
    }

    fn request(selected_tariff: Option<&str>) -> TariffRequest {
        TariffRequest {
            address: "1 Main St, Springfield".to_string(),
            kwh: 1000,
            escalator: 0.04,
            selected_tariff: selected_tariff.map(String::from),
        }
    }

    fn rate_items() -> Vec<Value> {
        vec![
            json!({
                "label": "abc123",
                "name": "Residential",
                "utility": "Springfield Electric",
                "startdate": TS_2023,
                "approved": true,
                "is_default": true,
                "energyratestructure": [[{ "rate": 12.0 }], [{ "rate": 14.0 }]]
            }),
            json!({
                "label": "def456",
                "name": "Residential TOU",
                "utility": "Springfield Electric",
                "startdate": TS_2023,
                "approved": true,
                "is_default": false,
                "energyratestructure": [[{ "rate": 9.5 }]]
            }),
        ]
    }

    fn pipeline(source: Arc<dyn RateSource>, store: Arc<MemoryProjectStore>) -> TariffPipeline {
        TariffPipeline {
            source,
            store,
            notifier: None,
        }
    }

    #[tokio::test]
    async fn records_project_and_proposal() {
        let store = Arc::new(MemoryProjectStore::default());
        let source = Arc::new(StaticRateSource::new(rate_items()));
        let pipeline = pipeline(source.clone(), store.clone());

        let recorded = pipeline.run(&user(), request(None)).await.unwrap();

        assert_eq!(recorded.quote.selected_tariff.name, "Residential");
        assert_eq!(recorded.quote.tariffs.len(), 2);
        assert_eq!(recorded.quote.cost_first_year, 130.0);
        assert_eq!(recorded.project.user_id, 7);
        assert_eq!(recorded.project.selected_tariff, "Residential");
        assert_eq!(recorded.project.cost_first_year, Decimal::from_str("130.00").unwrap());
        assert_eq!(source.requested_addresses(), vec!["1 Main St, Springfield".to_string()]);

        let proposals = store.proposals();
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].project_id, recorded.project.id);
        assert_eq!(proposals[0].external_id, "abc123");
        assert_eq!(proposals[0].utility_name, "Springfield Electric");
        assert_eq!(proposals[0].rate_structure, json!([[{ "rate": 12.0 }], [{ "rate": 14.0 }]]));
    }

    #[tokio::test]
    async fn requested_tariff_is_recorded() {
        let store = Arc::new(MemoryProjectStore::default());
        let pipeline = pipeline(Arc::new(StaticRateSource::new(rate_items())), store.clone());

        let recorded = pipeline.run(&user(), request(Some("Residential TOU"))).await.unwrap();

        assert_eq!(recorded.project.selected_tariff, "Residential TOU");
        assert_eq!(store.proposals()[0].external_id, "def456");
    }

    #[tokio::test]
    async fn first_year_cost_agrees_with_projection() {
        let store = Arc::new(MemoryProjectStore::default());
        let pipeline = pipeline(Arc::new(StaticRateSource::new(rate_items())), store);

        let quote = pipeline.quote(&request(Some("Residential TOU"))).await.unwrap();
        let costs = project(f64::from(quote.kwh), quote.selected_tariff.rate, quote.escalator, DEFAULT_PROJECTION_YEARS);

        assert_eq!(quote.cost_first_year, costs[0]);
    }

    #[tokio::test]
    async fn no_items_records_nothing() {
        let store = Arc::new(MemoryProjectStore::default());
        let pipeline = pipeline(Arc::new(StaticRateSource::new(Vec::new())), store.clone());

        let res = pipeline.run(&user(), request(None)).await;

        assert!(matches!(res, Err(PipelineError::NoRatesFound)));
        assert!(store.proposals().is_empty());
        assert!(store.list_for_user(7).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_outdated_items_is_no_rates() {
        let store = Arc::new(MemoryProjectStore::default());
        let items = vec![json!({ "name": "Old", "startdate": 1_600_000_000, "approved": true, "is_default": true })];
        let pipeline = pipeline(Arc::new(StaticRateSource::new(items)), store.clone());

        let res = pipeline.run(&user(), request(None)).await;

        assert!(matches!(res, Err(PipelineError::NoRatesFound)));
        assert!(store.proposals().is_empty());
    }

    struct BrokenStore;

    #[async_trait::async_trait]
    impl ProjectStore for BrokenStore {
        async fn record(&self, _: NewProject, _: NewRateProposal) -> Result<(Project, RateProposal), StoreError> {
            Err(StoreError::Backend(anyhow::anyhow!("connection reset")))
        }

        async fn list_for_user(&self, _: i64) -> Result<Vec<Project>, StoreError> {
            Err(StoreError::Backend(anyhow::anyhow!("connection reset")))
        }
    }

    fn notifier(url: String) -> WebhookNotifier {
        WebhookNotifier::new(&WebhookConfig { url, timeout_secs: 2 }).unwrap()
    }

    async fn wait_until_matched(mock: &mockito::Mock) {
        for _ in 0..200 {
            if mock.matched_async().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn recorded_project_is_announced() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hooks")
            .match_body(Matcher::Json(json!({ "event": "project_created", "project_id": 1, "user": "ada" })))
            .with_status(204)
            .expect(1)
            .create_async()
            .await;
        let pipeline = TariffPipeline {
            source: Arc::new(StaticRateSource::new(rate_items())),
            store: Arc::new(MemoryProjectStore::default()),
            notifier: Some(notifier(format!("{}/hooks", server.url()))),
        };

        let recorded = pipeline.run(&user(), request(None)).await.unwrap();
        wait_until_matched(&mock).await;

        assert_eq!(recorded.project.id, 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn failed_requests_are_not_announced() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/hooks").expect(0).create_async().await;
        let hooks = Some(notifier(format!("{}/hooks", server.url())));

        let no_rates = TariffPipeline {
            source: Arc::new(StaticRateSource::new(Vec::new())),
            store: Arc::new(MemoryProjectStore::default()),
            notifier: hooks.clone(),
        };
        let store_down = TariffPipeline {
            source: Arc::new(StaticRateSource::new(rate_items())),
            store: Arc::new(BrokenStore),
            notifier: hooks,
        };

        assert!(matches!(no_rates.run(&user(), request(None)).await, Err(PipelineError::NoRatesFound)));
        assert!(matches!(store_down.run(&user(), request(None)).await, Err(PipelineError::Store(_))));
        tokio::time::sleep(Duration::from_millis(50)).await;

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unrepresentable_cost_is_rejected_before_storing() {
        let store = Arc::new(MemoryProjectStore::default());
        let items = vec![json!({ "name": "Runaway", "startdate": TS_2023, "energyratestructure": [[{ "rate": 1e300 }]] })];
        let pipeline = pipeline(Arc::new(StaticRateSource::new(items)), store.clone());

        let res = pipeline.run(&user(), request(None)).await;

        assert!(matches!(res, Err(PipelineError::InvalidCost(_))));
        assert!(store.proposals().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_propagates() {
        let store = Arc::new(MemoryProjectStore::default());
        let pipeline = pipeline(Arc::new(DownRateSource), store.clone());

        let res = pipeline.run(&user(), request(None)).await;

        assert!(matches!(res, Err(PipelineError::Fetch(FetchError::Unavailable(_)))));
        assert!(store.proposals().is_empty());
    }
}
