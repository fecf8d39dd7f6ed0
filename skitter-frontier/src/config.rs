use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Read-only crawl limits consumed by the frontier.
///
/// Deserializes from JSON with every field optional; anything missing falls
/// back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontierConfig {
    /// Longest admissible URL string, in bytes.
    pub max_url_length: usize,
    /// Most `/` separators allowed in a URL path.
    pub max_path_slashes: usize,
    /// Syntax pattern every admitted URL must match.
    pub url_pattern: String,
    /// Host patterns eligible for crawling. Empty means any host.
    pub allowed_domains: Vec<String>,
    /// Patterns that reject a URL outright. Empty rejects nothing.
    pub disallowed_urls: Vec<String>,
    /// Deepest link-distance from a seed that will still be admitted.
    pub max_depth: usize,
    /// Times a failed URL may be resubmitted before it is dropped for good.
    pub retry_limit: usize,
    /// Backoff window after a failed fetch, in seconds.
    pub retry_wait_secs: u64,
    /// User-agent sent when retrieving robots.txt documents.
    pub user_agent: String,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            max_url_length: 2048,
            max_path_slashes: 16,
            url_pattern: "^https?://".to_string(),
            allowed_domains: Vec::new(),
            disallowed_urls: Vec::new(),
            max_depth: 5,
            retry_limit: 3,
            retry_wait_secs: 30,
            user_agent: "skitter/0.1 (crawl frontier)".to_string(),
        }
    }
}

impl FrontierConfig {
    pub fn retry_wait(&self) -> Duration {
        Duration::from_secs(self.retry_wait_secs)
    }
}
