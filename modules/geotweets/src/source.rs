use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use social_search_client::{Credentials, Post, SocialSearchClient};

use crate::geo::Address;
use crate::store::{RealtimeStore, StoreEvent, Subscription};

const FEED_ROOT: &str = "tweets";

/// Where the posts for a location come from.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn posts(&self, address: &Address) -> Result<Vec<Post>>;
}

/// Posts from the social search API around the address's coordinate.
pub struct SocialPostSource {
    client: Arc<SocialSearchClient>,
    credentials: Credentials,
}

impl SocialPostSource {
    pub fn new(client: Arc<SocialSearchClient>, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
        }
    }
}

#[async_trait]
impl PostSource for SocialPostSource {
    async fn posts(&self, address: &Address) -> Result<Vec<Post>> {
        let posts = self
            .client
            .fetch_nearby(&self.credentials, address.point)
            .await?;
        Ok(posts)
    }
}

/// Posts written by users into the realtime store, one feed per region.
pub struct RegionalFeed<S: RealtimeStore> {
    store: Arc<S>,
}

impl<S: RealtimeStore> RegionalFeed<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn path_for(address: &Address) -> String {
        format!("{}/{}", FEED_ROOT, address.region().replace('/', "_"))
    }

    /// Publish a post as `author_email`. Empty content is ignored.
    pub async fn publish(
        &self,
        address: &Address,
        author_email: &str,
        content: &str,
    ) -> Result<Option<String>> {
        if content.is_empty() {
            return Ok(None);
        }

        let post = Post {
            author: author_email.to_string(),
            handle: author_email.to_string(),
            content: content.to_string(),
            icon_url: String::new(),
        };
        let path = Self::path_for(address);
        let key = self.store.push(&path, serde_json::to_value(&post)?).await?;
        tracing::info!(path = %path, key = %key, "Published post");

        Ok(Some(key))
    }

    pub async fn load(&self, address: &Address) -> Result<Vec<Post>> {
        let value = self.store.get(&Self::path_for(address)).await?;
        Ok(decode_children(value))
    }

    pub async fn watch(&self, address: &Address) -> Result<FeedWatch> {
        let subscription = self.store.subscribe(&Self::path_for(address)).await?;
        Ok(FeedWatch { subscription })
    }
}

#[async_trait]
impl<S: RealtimeStore> PostSource for RegionalFeed<S> {
    async fn posts(&self, address: &Address) -> Result<Vec<Post>> {
        self.load(address).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Posts(Vec<Post>),
    Cancelled(String),
}

/// Live view of a regional feed; yields the full page after every change.
pub struct FeedWatch {
    subscription: Subscription,
}

impl FeedWatch {
    pub async fn next(&mut self) -> Option<FeedEvent> {
        match self.subscription.recv().await? {
            StoreEvent::Changed(value) => Some(FeedEvent::Posts(decode_children(value))),
            StoreEvent::Cancelled(reason) => {
                tracing::warn!(reason = %reason, "Feed subscription cancelled");
                Some(FeedEvent::Cancelled(reason))
            }
        }
    }
}

/// Children in key order; entries that are not posts are skipped.
fn decode_children(value: Option<Value>) -> Vec<Post> {
    let Some(Value::Object(children)) = value else {
        return Vec::new();
    };

    let mut entries: Vec<(String, Value)> = children.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    entries
        .into_iter()
        .filter_map(|(key, child)| match serde_json::from_value::<Post>(child) {
            Ok(post) => Some(post),
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "Skipping undecodable feed entry");
                None
            }
        })
        .collect()
}
