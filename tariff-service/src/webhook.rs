use std::time::Duration;

use reqwest::{Client, Url};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::config::WebhookConfig;

pub const PROJECT_CREATED: &str = "project_created";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectCreated {
    pub event: &'static str,
    pub project_id: i64,
    pub user: String,
}

impl ProjectCreated {
    pub fn new(project_id: i64, user: &str) -> Self {
        Self {
            event: PROJECT_CREATED,
            project_id,
            user: user.to_string(),
        }
    }
}

/// Best-effort webhook delivery.
///
/// Each notification is a single POST on a detached task. Failures are logged
/// and counted, never retried, and never reach the request that triggered them.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: Url,
}

impl WebhookNotifier {
    pub fn new(cfg: &WebhookConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        let url = Url::parse(&cfg.url).map_err(|e| anyhow::anyhow!("invalid webhook.url '{}': {e}", cfg.url))?;
        Ok(Self { client, url })
    }

    pub fn notify(&self, event: ProjectCreated) -> JoinHandle<()> {
        let client = self.client.clone();
        let url = self.url.clone();

        tokio::spawn(async move {
            match deliver(&client, url, &event).await {
                Ok(()) => {
                    tracing::debug!(project_id = event.project_id, "webhook delivered");
                }
                Err(e) => {
                    metrics::counter!("webhook_failures_total").increment(1);
                    tracing::warn!(error = %e, project_id = event.project_id, "webhook delivery failed");
                }
            }
        })
    }
}

async fn deliver(client: &Client, url: Url, event: &ProjectCreated) -> Result<(), reqwest::Error> {
    client.post(url).json(event).send().await?.error_for_status()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn notifier(url: String) -> WebhookNotifier {
        WebhookNotifier::new(&WebhookConfig { url, timeout_secs: 2 }).unwrap()
    }

    #[tokio::test]
    async fn posts_project_created_event() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hooks/projects")
            .match_body(Matcher::Json(json!({
                "event": "project_created",
                "project_id": 42,
                "user": "ada"
            })))
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let handle = notifier(format!("{}/hooks/projects", server.url())).notify(ProjectCreated::new(42, "ada"));
        handle.await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn failed_delivery_is_swallowed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/hooks/projects")
            .with_status(500)
            .create_async()
            .await;

        let handle = notifier(format!("{}/hooks/projects", server.url())).notify(ProjectCreated::new(1, "bob"));

        assert!(handle.await.is_ok());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_swallowed() {
        let handle = notifier("http://127.0.0.1:9/hooks".to_string()).notify(ProjectCreated::new(1, "bob"));

        assert!(handle.await.is_ok());
    }
}
