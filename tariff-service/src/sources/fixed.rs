use std::sync::Mutex;

use serde::Deserialize;
use serde_json::Value;

use crate::pipeline::{FetchError, RateSource};

/// Serves the same rate items for every address.
///
/// Used to replay a saved rate lookup response and as a deterministic source in tests.
#[derive(Debug, Default)]
pub struct StaticRateSource {
    items: Vec<Value>,
    requested: Mutex<Vec<String>>,
}

impl StaticRateSource {
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items,
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Build from a saved response body of the form `{"items": [...]}`.
    pub fn from_response_json(body: &str) -> anyhow::Result<Self> {
        #[derive(Deserialize)]
        struct Saved {
            #[serde(default)]
            items: Option<Vec<Value>>,
        }

        let saved: Saved = serde_json::from_str(body)?;
        Ok(Self::new(saved.items.unwrap_or_default()))
    }

    /// Addresses passed to [`RateSource::fetch`], in call order.
    pub fn requested_addresses(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl RateSource for StaticRateSource {
    async fn fetch(&self, address: &str) -> Result<Vec<Value>, FetchError> {
        self.requested
            .lock()
            .map_err(|_| FetchError::Unavailable("static source lock poisoned".to_string()))?
            .push(address.to_string());
        Ok(self.items.clone())
    }
}
