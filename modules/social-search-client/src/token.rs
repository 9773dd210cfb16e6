use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::error::AuthError;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::types::{BearerToken, Credentials, TokenResponse};

const GRANT_BODY: &str = "grant_type=client_credentials";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// Exchanges application credentials for a bearer token (application-only OAuth2).
pub struct TokenAcquirer {
    transport: Arc<dyn HttpTransport>,
    token_url: String,
}

impl TokenAcquirer {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: &str) -> Self {
        Self {
            transport,
            token_url: format!("{}/oauth2/token", base_url.trim_end_matches('/')),
        }
    }

    pub async fn acquire_token(&self, credentials: &Credentials) -> Result<BearerToken, AuthError> {
        let request = HttpRequest::post(&self.token_url)
            .header("Authorization", format!("Basic {}", credentials.encoded()))
            .header("Content-Type", FORM_CONTENT_TYPE)
            .body(GRANT_BODY);

        tracing::debug!(url = %self.token_url, "Requesting bearer token");
        let resp = self.transport.execute(request).await?;
        let token = token_from_response(resp)?;
        tracing::debug!(expires_in = ?token.expires_in(), "Bearer token acquired");

        Ok(token)
    }
}

fn token_from_response(resp: HttpResponse) -> Result<BearerToken, AuthError> {
    if !resp.is_success() {
        return Err(AuthError::Rejected {
            status: resp.status,
            message: resp.body,
        });
    }
    if resp.is_blank() {
        return Err(AuthError::EmptyBody);
    }

    let parsed: TokenResponse =
        serde_json::from_str(&resp.body).map_err(|e| AuthError::Malformed(e.to_string()))?;

    if let Some(token_type) = parsed.token_type.as_deref() {
        if !token_type.eq_ignore_ascii_case("bearer") {
            return Err(AuthError::UnsupportedTokenType(token_type.to_string()));
        }
    }

    match parsed.access_token {
        Some(value) if !value.is_empty() => Ok(BearerToken::new(
            value,
            parsed.expires_in.map(Duration::from_secs),
        )),
        _ => Err(AuthError::MissingToken),
    }
}

struct CachedToken {
    token: BearerToken,
    expires_at: Instant,
}

/// Bearer tokens keyed by a digest of the encoded credentials.
///
/// Entries live for the server-declared `expires_in`, or `default_ttl` when
/// the server declares none.
pub struct TokenCache {
    entries: Mutex<HashMap<String, CachedToken>>,
    default_ttl: Duration,
}

impl TokenCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
        }
    }

    fn key(credentials: &Credentials) -> String {
        hex::encode(Sha256::digest(credentials.encoded().as_bytes()))
    }

    pub async fn get(&self, credentials: &Credentials) -> Option<BearerToken> {
        let key = Self::key(credentials);
        let mut entries = self.entries.lock().await;
        match entries.get(&key) {
            Some(cached) if Instant::now() < cached.expires_at => Some(cached.token.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, credentials: &Credentials, token: BearerToken) {
        let ttl = token.expires_in().unwrap_or(self.default_ttl);
        let cached = CachedToken {
            expires_at: Instant::now() + ttl,
            token,
        };
        self.entries
            .lock()
            .await
            .insert(Self::key(credentials), cached);
    }

    pub async fn evict(&self, credentials: &Credentials) {
        self.entries.lock().await.remove(&Self::key(credentials));
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
