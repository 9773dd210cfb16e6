pub mod credentials;
pub mod error;
pub mod parser;
pub mod token;
pub mod transport;
pub mod types;

pub use credentials::encode_credentials;
pub use error::{
    AuthError, InvalidRadius, ParseError, RequestFailure, Result, SearchError, SearchErrorKind,
    TransportError,
};
pub use parser::parse_search_results;
pub use token::{TokenAcquirer, TokenCache};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};
pub use types::{
    BearerToken, Credentials, DistanceUnit, GeoPoint, Post, SearchConfig, SearchRadius,
    SearchResultPage,
};

use std::sync::Arc;
use std::time::Duration;

/// Fetches posts around a coordinate: acquire token, search, parse.
///
/// Holds no per-call state, so one client can serve concurrent searches.
/// Dropping a `fetch_nearby` future aborts whichever request is in flight
/// and no partial page is ever returned. Failed requests are not retried.
pub struct SocialSearchClient {
    transport: Arc<dyn HttpTransport>,
    tokens: TokenAcquirer,
    cache: Option<TokenCache>,
    config: SearchConfig,
}

impl SocialSearchClient {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_config(transport, SearchConfig::default())
    }

    pub fn with_config(transport: Arc<dyn HttpTransport>, config: SearchConfig) -> Self {
        Self {
            tokens: TokenAcquirer::new(transport.clone(), &config.base_url),
            transport,
            cache: None,
            config,
        }
    }

    /// Reuse bearer tokens across calls with the same credentials.
    /// `default_ttl` applies when the token endpoint declares no expiry.
    pub fn with_token_cache(mut self, default_ttl: Duration) -> Self {
        self.cache = Some(TokenCache::new(default_ttl));
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Fetch one page of posts matching the configured query near `center`.
    pub async fn fetch_nearby(
        &self,
        credentials: &Credentials,
        center: GeoPoint,
    ) -> Result<SearchResultPage> {
        self.fetch_nearby_with_query(credentials, center, &self.config.query).await
    }

    pub async fn fetch_nearby_with_query(
        &self,
        credentials: &Credentials,
        center: GeoPoint,
        query: &str,
    ) -> Result<SearchResultPage> {
        if !center.is_finite() {
            return Err(RequestFailure::InvalidCenter.into());
        }

        tracing::info!(
            lat = center.latitude,
            lon = center.longitude,
            query,
            radius = %self.config.radius,
            "Searching nearby posts"
        );

        let token = self.bearer_token(credentials).await?;

        let request = HttpRequest::get(self.config.search_url())
            .query("q", query)
            .query("geocode", self.config.geocode(center))
            .header("Authorization", format!("Bearer {}", token.as_str()));

        let resp = self
            .transport
            .execute(request)
            .await
            .map_err(RequestFailure::from)?;

        if !resp.is_success() {
            if resp.status == 401 {
                if let Some(cache) = &self.cache {
                    cache.evict(credentials).await;
                }
            }
            tracing::warn!(status = resp.status, "Search request rejected");
            return Err(RequestFailure::Status {
                status: resp.status,
                message: resp.body,
            }
            .into());
        }
        if resp.is_blank() {
            return Err(RequestFailure::EmptyBody.into());
        }

        let posts = parse_search_results(&resp.body)?;
        tracing::info!(count = posts.len(), "Fetched nearby posts");

        Ok(posts)
    }

    async fn bearer_token(
        &self,
        credentials: &Credentials,
    ) -> std::result::Result<BearerToken, AuthError> {
        let Some(cache) = &self.cache else {
            return self.tokens.acquire_token(credentials).await;
        };

        if let Some(token) = cache.get(credentials).await {
            tracing::debug!("Using cached bearer token");
            return Ok(token);
        }

        let token = self.tokens.acquire_token(credentials).await?;
        cache.insert(credentials, token.clone()).await;
        Ok(token)
    }
}
