use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the backend that serves `POST /search`
    pub search_base_url: String,
    /// Where the recent-search list is persisted
    pub data_dir: PathBuf,
    /// Overall request timeout in seconds (capped at 120)
    pub request_timeout_secs: u64,
    /// Number of suggestion chips sampled on startup
    pub suggestion_count: usize,
    /// Base URL for outbound trial links; the trial id is appended
    pub registry_base_url: String,
    /// Geocoding service configuration
    pub geocoder: GeocoderConfig,
}

/// Configuration for the forward geocoding lookup (Nominatim-compatible).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Base URL of the geocoder; `/search` is appended.
    pub base_url: String,
    /// Nominatim's usage policy requires an identifying User-Agent.
    pub user_agent: String,
    /// When false, location centering is skipped and the map fits to markers.
    pub enabled: bool,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: format!("trial-search/{}", env!("CARGO_PKG_VERSION")),
            enabled: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_base_url: "http://127.0.0.1:5000".to_string(),
            data_dir: PathBuf::from("./data"),
            request_timeout_secs: 30,
            suggestion_count: 3,
            registry_base_url: "https://clinicaltrials.gov/study".to_string(),
            geocoder: GeocoderConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("TRIAL_SEARCH_BASE_URL") {
            config.search_base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(dir) = std::env::var("TRIAL_SEARCH_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(val) = std::env::var("TRIAL_SEARCH_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.request_timeout_secs = v.min(120);
            }
        }
        if let Ok(val) = std::env::var("TRIAL_SEARCH_SUGGESTIONS") {
            if let Ok(v) = val.parse() {
                config.suggestion_count = v;
            }
        }
        if let Ok(url) = std::env::var("TRIAL_REGISTRY_URL") {
            config.registry_base_url = url.trim_end_matches('/').to_string();
        }

        // Geocoder config
        if let Ok(url) = std::env::var("GEOCODER_BASE_URL") {
            config.geocoder.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(agent) = std::env::var("GEOCODER_USER_AGENT") {
            config.geocoder.user_agent = agent;
        }
        if let Ok(val) = std::env::var("GEOCODER_ENABLED") {
            if let Ok(v) = val.parse() {
                config.geocoder.enabled = v;
            }
        }

        config
    }

    pub fn recent_searches_path(&self) -> PathBuf {
        self.data_dir.join("recent_searches.json")
    }

    pub fn search_url(&self) -> String {
        format!("{}/search", self.search_base_url)
    }

    /// Deep link into the public trial registry for one trial.
    pub fn trial_link(&self, trial_id: &str) -> String {
        format!("{}/{}", self.registry_base_url, trial_id)
    }
}
