//! HTTP-backed data sources
//!
//! Lighting and fiber payloads are served by the editor backend as JSON:
//! `GET {base}/lighting/{label}` and `GET {base}/fiber/{label}`.

use async_trait::async_trait;
use serde_json::Value;
use stagelink_hub::DataSource;

pub struct HttpDataSource {
    client: reqwest::Client,
    base: String,
}

impl HttpDataSource {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.into(),
        }
    }

    async fn get(&self, kind: &str, label: &str) -> anyhow::Result<Value> {
        let url = format!("{}/{}/{}", self.base.trim_end_matches('/'), kind, label);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch_lighting(&self, label: &str) -> anyhow::Result<Value> {
        self.get("lighting", label).await
    }

    async fn fetch_fiber(&self, label: &str) -> anyhow::Result<Value> {
        self.get("fiber", label).await
    }
}
