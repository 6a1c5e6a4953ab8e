use super::{
    links::Links,
    types::{Captions, Health, MediaInfo, Subtitle},
    Backend,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Serialize)]
struct InfoRequest<'a> {
    url: &'a str,
}

pub struct BackendClient {
    http: reqwest::Client,
    links: Links,
}

impl BackendClient {
    /// Without a timeout a hung backend keeps the caller waiting.
    pub fn new(links: Links, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to create HTTP client")?;

        info!("Backend client initialized for {}", links.base());
        Ok(Self { http, links })
    }

    pub async fn health(&self) -> Result<Health> {
        let url = self.links.health();
        debug!("Checking backend health at {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .context("Failed to reach backend")?;

        decode(response).await
    }
}

#[async_trait]
impl Backend for BackendClient {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn info(&self, url: &str) -> Result<MediaInfo> {
        debug!("Requesting info for: {}", url);

        let response = self
            .http
            .post(self.links.info())
            .json(&InfoRequest { url })
            .send()
            .await
            .context("Failed to reach backend")?;

        let info: MediaInfo = decode(response).await?;
        info!(
            "Received info for {}: {} formats, {} subtitles",
            url,
            info.formats().len(),
            info.subtitles().len()
        );
        Ok(info)
    }

    async fn captions(&self, url: &str) -> Result<Vec<Subtitle>> {
        debug!("Requesting captions for: {}", url);

        let response = self
            .http
            .get(self.links.captions(url))
            .send()
            .await
            .context("Failed to reach backend")?;

        let captions: Captions = decode(response).await?;
        Ok(captions.subtitles.unwrap_or_default())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(&body);
        warn!("Backend returned HTTP {}: {}", status, detail);

        if status == StatusCode::TOO_MANY_REQUESTS {
            anyhow::bail!("Backend rate limited the request (HTTP {})", status);
        }
        anyhow::bail!("Backend returned HTTP {}: {}", status, detail);
    }

    response
        .json::<T>()
        .await
        .context("Failed to parse backend response")
}

/// Pulls `detail` or `error` out of a JSON error body, falling back to the raw text.
fn error_detail(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|json| json["detail"].as_str().or(json["error"].as_str()))
        .map(|s| s.to_string())
        .unwrap_or_else(|| body.trim().to_string())
}
