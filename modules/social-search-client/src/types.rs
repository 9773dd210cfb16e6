use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::InvalidRadius;

pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com";
pub const DEFAULT_QUERY: &str = "Android";

// --- Caller inputs ---

/// Application key pair. Supplied per call and never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Search center. Both coordinates must be finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let point = Self {
            latitude,
            longitude,
        };
        point.is_finite().then_some(point)
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

// --- Outputs ---

/// Short-lived credential for the search endpoint. Opaque to callers.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken {
    value: String,
    expires_in: Option<Duration>,
}

impl BearerToken {
    pub fn new(value: impl Into<String>, expires_in: Option<Duration>) -> Self {
        Self {
            value: value.into(),
            expires_in,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Lifetime declared by the token endpoint, if any.
    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_in
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("value", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// A normalized post. `author`, `handle` and `content` are always present;
/// `icon_url` is empty when the author has no avatar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub author: String,
    pub handle: String,
    pub content: String,
    #[serde(default)]
    pub icon_url: String,
}

/// One page of results, in server order.
pub type SearchResultPage = Vec<Post>;

// --- Search configuration ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Miles,
    Kilometers,
}

impl DistanceUnit {
    fn suffix(self) -> &'static str {
        match self {
            DistanceUnit::Miles => "mi",
            DistanceUnit::Kilometers => "km",
        }
    }
}

/// Radius of the geocode circle, rendered as `<number><unit>` (e.g. `30mi`).
/// Always a positive finite distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRadius {
    value: f64,
    unit: DistanceUnit,
}

impl SearchRadius {
    pub fn new(value: f64, unit: DistanceUnit) -> Result<Self, InvalidRadius> {
        if !value.is_finite() || value <= 0.0 {
            return Err(InvalidRadius(format!("{value}{}", unit.suffix())));
        }
        Ok(Self { value, unit })
    }

    pub fn miles(value: f64) -> Result<Self, InvalidRadius> {
        Self::new(value, DistanceUnit::Miles)
    }

    pub fn kilometers(value: f64) -> Result<Self, InvalidRadius> {
        Self::new(value, DistanceUnit::Kilometers)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> DistanceUnit {
        self.unit
    }
}

impl Default for SearchRadius {
    fn default() -> Self {
        Self {
            value: 30.0,
            unit: DistanceUnit::Miles,
        }
    }
}

impl fmt::Display for SearchRadius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

impl FromStr for SearchRadius {
    type Err = InvalidRadius;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (number, unit) = if let Some(n) = trimmed.strip_suffix("mi") {
            (n, DistanceUnit::Miles)
        } else if let Some(n) = trimmed.strip_suffix("km") {
            (n, DistanceUnit::Kilometers)
        } else {
            return Err(InvalidRadius(s.to_string()));
        };

        let value: f64 = number
            .trim()
            .parse()
            .map_err(|_| InvalidRadius(s.to_string()))?;

        Self::new(value, unit).map_err(|_| InvalidRadius(s.to_string()))
    }
}

/// Where and what to search. Defaults to "Android" within 30 miles.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub base_url: String,
    pub query: String,
    pub radius: SearchRadius,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            query: DEFAULT_QUERY.to_string(),
            radius: SearchRadius::default(),
        }
    }
}

impl SearchConfig {
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_radius(mut self, radius: SearchRadius) -> Self {
        self.radius = radius;
        self
    }

    pub(crate) fn search_url(&self) -> String {
        format!("{}/1.1/search/tweets.json", self.base_url)
    }

    pub(crate) fn geocode(&self, center: GeoPoint) -> String {
        format!("{},{},{}", center.latitude, center.longitude, self.radius)
    }
}

// --- Wire types ---

/// Body of a successful `POST /oauth2/token`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    pub token_type: Option<String>,
    pub access_token: Option<String>,
    pub expires_in: Option<u64>,
}
