use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenEiConfig {
    #[serde(default = "default_openei_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openei_version")]
    pub version: String,
    /// Passed through as the `detail` query parameter when set (e.g. `full`).
    pub detail: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TariffConfig {
    /// Addresses picked at random when a request omits one.
    #[serde(default = "default_fallback_addresses")]
    pub fallback_addresses: Vec<String>,
    #[serde(default = "default_kwh")]
    pub default_kwh: i64,
    /// Percent, not fraction.
    #[serde(default = "default_escalator_pct")]
    pub default_escalator_pct: f64,
    #[serde(default = "default_projection_years")]
    pub projection_years: usize,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            fallback_addresses: default_fallback_addresses(),
            default_kwh: default_kwh(),
            default_escalator_pct: default_escalator_pct(),
            projection_years: default_projection_years(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub http: HttpConfig,
    pub openei: OpenEiConfig,
    #[serde(default)]
    pub tariff: TariffConfig,
    pub webhook: Option<WebhookConfig>,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("TARIFF_CONFIG").unwrap_or_else(|_| "tariff-config.toml".to_string());
        let contents = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {path}: {e}"))?;
        let mut cfg = Self::from_toml_str(&contents)?;

        if let Ok(key) = env::var("OPENEI_API_KEY") {
            cfg.openei.api_key = key;
        }

        Ok(cfg)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }
}

fn default_openei_base_url() -> String {
    "https://api.openei.org/utility_rates".to_string()
}

fn default_openei_version() -> String {
    "latest".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_fallback_addresses() -> Vec<String> {
    [
        "789 Pine Road, Denver, CO 80203",
        "321 Birch Lane, Seattle, WA 98101",
        "654 Cedar Boulevard, Miami, FL 33101",
        "987 Elm Street, Chicago, IL 60601",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_kwh() -> i64 {
    1000
}

fn default_escalator_pct() -> f64 {
    4.0
}

fn default_projection_years() -> usize {
    crate::transform::DEFAULT_PROJECTION_YEARS
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [database]
        uri = "postgres://tariff@localhost/tariff"
        max_connections = 4

        [http]
        bind_addr = "127.0.0.1:8000"

        [openei]
        api_key = "test-key"
    "#;

    #[test]
    fn minimal_config_fills_defaults() {
        let cfg = AppConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(cfg.openei.base_url, "https://api.openei.org/utility_rates");
        assert_eq!(cfg.openei.version, "latest");
        assert_eq!(cfg.openei.detail, None);
        assert_eq!(cfg.tariff.fallback_addresses.len(), 4);
        assert_eq!(cfg.tariff.default_kwh, 1000);
        assert_eq!(cfg.tariff.default_escalator_pct, 4.0);
        assert_eq!(cfg.tariff.projection_years, 20);
        assert!(cfg.webhook.is_none());
        assert!(cfg.metrics.is_none());
    }

    #[test]
    fn optional_sections_are_parsed() {
        let contents = format!(
            r#"{MINIMAL}
            [tariff]
            fallback_addresses = ["1 Main St, Springfield"]
            default_escalator_pct = 2.5

            [webhook]
            url = "http://hooks.local/projects"

            [metrics]
            bind_addr = "0.0.0.0:9000"
            "#
        );
        let cfg = AppConfig::from_toml_str(&contents).unwrap();

        assert_eq!(cfg.tariff.fallback_addresses, vec!["1 Main St, Springfield".to_string()]);
        assert_eq!(cfg.tariff.default_escalator_pct, 2.5);
        assert_eq!(cfg.tariff.default_kwh, 1000);
        assert_eq!(cfg.webhook.unwrap().timeout_secs, 30);
        assert_eq!(cfg.metrics.unwrap().bind_addr, "0.0.0.0:9000");
    }

    #[test]
    fn missing_database_section_is_rejected() {
        let res = AppConfig::from_toml_str("[http]\nbind_addr = \"127.0.0.1:8000\"\n");
        assert!(res.is_err());
    }
}
