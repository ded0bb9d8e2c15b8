use anyhow::{Context, Result};
use std::future::Future;

use crate::models::{SearchRequest, TrialRecord};

/// Anything that can answer a free-text trial query.
pub trait SearchBackend {
    fn search(&self, query: &str) -> impl Future<Output = Result<Vec<TrialRecord>>> + Send;
}

impl<T: SearchBackend + Sync + ?Sized> SearchBackend for &T {
    async fn search(&self, query: &str) -> Result<Vec<TrialRecord>> {
        (**self).search(query).await
    }
}

/// `POST {base}/search` with a JSON body `{"query": ...}`.
#[derive(Clone)]
pub struct HttpSearchClient {
    client: reqwest::Client,
    url: String,
}

impl HttpSearchClient {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl SearchBackend for HttpSearchClient {
    async fn search(&self, query: &str) -> Result<Vec<TrialRecord>> {
        let req = SearchRequest {
            query: query.to_string(),
        };

        let resp = self
            .client
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .context("Failed to call search API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Search API returned {status}: {body}");
        }

        let trials: Vec<TrialRecord> = resp
            .json()
            .await
            .context("Failed to parse search response")?;

        tracing::debug!("Search for {query:?} returned {} trials", trials.len());
        Ok(trials)
    }
}
