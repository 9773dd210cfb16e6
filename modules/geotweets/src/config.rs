use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use social_search_client::{
    Credentials, ReqwestTransport, SearchConfig, SearchRadius, SocialSearchClient,
};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Used when the token endpoint declares no expiry.
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    // Social API
    pub twitter_api_key: String,
    pub twitter_api_secret: String,
    pub twitter_api_base_url: String,

    // Search
    pub search_query: String,
    pub search_radius: SearchRadius,

    // HTTP
    pub http_timeout: Duration,
    pub token_cache: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .with_context(|| format!("{key} environment variable is required"))
        };
        let defaults = SearchConfig::default();

        let search_radius: SearchRadius = match lookup("SEARCH_RADIUS") {
            Some(raw) => raw.parse().context("SEARCH_RADIUS must look like 30mi or 50km")?,
            None => defaults.radius,
        };
        let http_timeout = match lookup("HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.trim()
                    .parse()
                    .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let token_cache = match lookup("TOKEN_CACHE") {
            Some(raw) => raw
                .trim()
                .parse()
                .context("TOKEN_CACHE must be true or false")?,
            None => false,
        };

        Ok(Self {
            twitter_api_key: required("TWITTER_API_KEY")?,
            twitter_api_secret: required("TWITTER_API_SECRET")?,
            twitter_api_base_url: lookup("TWITTER_API_BASE_URL").unwrap_or(defaults.base_url),
            search_query: lookup("SEARCH_QUERY").unwrap_or(defaults.query),
            search_radius,
            http_timeout,
            token_cache,
        })
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.twitter_api_key, &self.twitter_api_secret)
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig::default()
            .with_base_url(&self.twitter_api_base_url)
            .with_query(&self.search_query)
            .with_radius(self.search_radius)
    }

    pub fn build_client(&self) -> Result<SocialSearchClient> {
        let transport = ReqwestTransport::with_timeout(self.http_timeout)
            .context("Failed to build HTTP client")?;
        let client = SocialSearchClient::with_config(Arc::new(transport), self.search_config());
        Ok(if self.token_cache {
            client.with_token_cache(DEFAULT_TOKEN_TTL)
        } else {
            client
        })
    }

    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let n = val.chars().take(5).map(char::len_utf8).sum();
            format!("{}...({} chars)", &val[..n], val.chars().count())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  TWITTER_API_KEY: {}", preview(&self.twitter_api_key));
        tracing::info!("  TWITTER_API_SECRET: {}", preview(&self.twitter_api_secret));
        tracing::info!("  TWITTER_API_BASE_URL: {}", self.twitter_api_base_url);
        tracing::info!("  SEARCH_QUERY: {}", self.search_query);
        tracing::info!("  SEARCH_RADIUS: {}", self.search_radius);
        tracing::info!("  HTTP_TIMEOUT_SECS: {}", self.http_timeout.as_secs());
        tracing::info!("  TOKEN_CACHE: {}", self.token_cache);
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("twitter_api_key", &self.twitter_api_key)
            .field("twitter_api_secret", &"<redacted>")
            .field("twitter_api_base_url", &self.twitter_api_base_url)
            .field("search_query", &self.search_query)
            .field("search_radius", &self.search_radius)
            .field("http_timeout", &self.http_timeout)
            .field("token_cache", &self.token_cache)
            .finish()
    }
}
