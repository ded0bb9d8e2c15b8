//! HTTP collaborators: the trial search backend and the geocoder.

pub mod geocode;
pub mod search;

use std::time::Duration;

use crate::config::Config;

/// Build the shared HTTP client used for both collaborators.
pub fn build_http_client(config: &Config) -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
        .build()?)
}
