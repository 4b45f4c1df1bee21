use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;

use crate::config::EditorConfig;
use crate::persistence::{WebsitePatch, WebsiteRecord, WebsiteStore};

/// [`WebsiteStore`] backed by the website service's REST API.
#[derive(Debug, Clone)]
pub struct HttpWebsiteStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpWebsiteStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<HttpWebsiteStore> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpWebsiteStore {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &EditorConfig) -> anyhow::Result<HttpWebsiteStore> {
        HttpWebsiteStore::new(config.service_url.clone(), config.request_timeout())
    }

    pub fn website_url(&self, website_id: &str) -> String {
        format!("{}/websites/{}", self.base_url, website_id)
    }
}

#[async_trait]
impl WebsiteStore for HttpWebsiteStore {
    async fn fetch_website(&self, website_id: &str) -> anyhow::Result<WebsiteRecord> {
        let url = self.website_url(website_id);
        tracing::debug!("GET {url}");
        self.client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("Website service rejected GET {url}"))?
            .json::<WebsiteRecord>()
            .await
            .with_context(|| format!("Invalid website record from {url}"))
    }

    async fn update_website(&self, website_id: &str, patch: WebsitePatch) -> anyhow::Result<()> {
        let url = self.website_url(website_id);
        tracing::debug!("PATCH {url}");
        self.client
            .patch(&url)
            .json(&patch)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("Website service rejected PATCH {url}"))?;
        Ok(())
    }
}
