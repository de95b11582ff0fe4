use serde::Deserialize;

/// Main configuration structure for Property-Trawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub search: SearchConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent listing workers (fetch + extract)
    pub workers: u32,

    /// Maximum number of search-result pages walked at once
    #[serde(rename = "max-concurrent-search-pages", default = "default_search_pages")]
    pub max_concurrent_search_pages: u32,

    /// Capacity of the bounded channels between pipeline stages
    #[serde(rename = "channel-capacity", default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_search_pages() -> u32 {
    2
}

fn default_channel_capacity() -> usize {
    10
}

fn default_request_timeout() -> u64 {
    30
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON document holding every extracted listing
    #[serde(rename = "json-path")]
    pub json_path: String,
}

/// Search-result pages the crawl starts from
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Absolute search-result URLs, walked in order
    pub seeds: Vec<String>,
}
