//! [OpenEI Utility Rate Database](https://openei.org/services/doc/rest/util_rates) client.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    config::OpenEiConfig,
    pipeline::{FetchError, RateSource},
};

pub struct OpenEiRateSource {
    client: Client,
    base_url: Url,
    api_key: String,
    version: String,
    detail: Option<String>,
}

impl OpenEiRateSource {
    pub fn new(cfg: &OpenEiConfig) -> anyhow::Result<Self> {
        if cfg.api_key.is_empty() {
            anyhow::bail!("openei.api_key is not set (config file or OPENEI_API_KEY)");
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        let base_url = Url::parse(&cfg.base_url)
            .map_err(|e| anyhow::anyhow!("invalid openei.base_url '{}': {e}", cfg.base_url))?;

        Ok(Self {
            client,
            base_url,
            api_key: cfg.api_key.clone(),
            version: cfg.version.clone(),
            detail: cfg.detail.clone(),
        })
    }
}

#[derive(Deserialize)]
struct UtilityRatesResponse {
    #[serde(default)]
    items: Option<Vec<Value>>,
    /// OpenEI reports some failures (bad key, bad address) in a 200 body.
    #[serde(default)]
    error: Option<Value>,
}

#[async_trait::async_trait]
impl RateSource for OpenEiRateSource {
    /// Approved rates for `address`. A single attempt; no retries.
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, address: &str) -> Result<Vec<Value>, FetchError> {
        let mut query = vec![
            ("version", self.version.as_str()),
            ("format", "json"),
            ("approved", "true"),
            ("address", address),
            ("api_key", self.api_key.as_str()),
        ];
        if let Some(detail) = self.detail.as_deref() {
            query.push(("detail", detail));
        }

        let response = self.client.get(self.base_url.clone()).query(&query).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "utility rate lookup rejected");
            return Err(FetchError::Status(status));
        }

        let body: UtilityRatesResponse = response.json().await?;
        if let Some(error) = body.error {
            tracing::warn!(%error, "utility rate lookup reported an error");
        }

        let items = body.items.unwrap_or_default();
        tracing::info!(n_items = items.len(), "fetched utility rates");
        Ok(items)
    }
}
