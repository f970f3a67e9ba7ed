use std::time::Duration;

use anyhow::Result;
use serde_json::Value;
use tracing::warn;

use crate::config::GatewayConfig;
use crate::error::FetchError;
use crate::fallback;
use crate::source::{ContentSource, RestSource};
use crate::types::{Collection, ContentItem, SiteContent};

/// Reads collections from a [`ContentSource`] and never fails: timeouts,
/// transport errors, non-2xx answers and unparseable bodies all yield the
/// collection's fallback set instead.
pub struct Gateway<S = RestSource> {
    source: S,
    timeout: Duration,
    per_page: u32,
}

impl Gateway<RestSource> {
    pub fn from_config(cfg: &GatewayConfig) -> Result<Self> {
        Ok(Self::new(RestSource::from_config(cfg)?, cfg.timeout()).with_per_page(cfg.per_page))
    }
}

impl<S: ContentSource> Gateway<S> {
    pub fn new(source: S, timeout: Duration) -> Self {
        Self { source, timeout, per_page: 100 }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The whole collection in one round trip, passed through unmodified,
    /// or the fallback set.
    pub async fn fetch_collection(&self, collection: Collection) -> Value {
        let query = format!("_embed&per_page={}", self.per_page);
        match self.bounded(collection.as_str(), &query).await {
            Ok(value) => value,
            Err(e) => {
                warn!(collection = %collection, error = %e, "content fetch failed; serving fallback");
                fallback::fallback_set(collection)
            }
        }
    }

    /// Like [`Gateway::fetch_collection`], decoded into typed items. Live data
    /// that does not decode as a list of items is replaced by the fallback set.
    pub async fn fetch_items(&self, collection: Collection) -> Vec<ContentItem> {
        let value = self.fetch_collection(collection).await;
        match serde_json::from_value(value) {
            Ok(items) => items,
            Err(e) => {
                warn!(collection = %collection, error = %e, "unexpected content shape; serving fallback");
                fallback::fallback_items(collection)
            }
        }
    }

    /// One item by slug. An empty live answer means "no such item"; a failed
    /// call falls back to the matching fallback item, if any.
    pub async fn fetch_by_slug(&self, collection: Collection, slug: &str) -> Option<ContentItem> {
        let encoded: String = url::form_urlencoded::byte_serialize(slug.as_bytes()).collect();
        let query = format!("_embed&slug={encoded}");
        let result = self
            .bounded(collection.as_str(), &query)
            .await
            .and_then(|value| serde_json::from_value::<Vec<ContentItem>>(value).map_err(FetchError::from));
        match result {
            Ok(items) => items.into_iter().next(),
            Err(e) => {
                warn!(collection = %collection, slug, error = %e, "content fetch failed; serving fallback");
                fallback::find_by_slug(collection, slug)
            }
        }
    }

    /// The collections a landing page needs, fetched concurrently. Each one
    /// falls back on its own.
    pub async fn fetch_site_content(&self) -> SiteContent {
        let (services, cases, team, testimonials) = futures::join!(
            self.fetch_items(Collection::Services),
            self.fetch_items(Collection::Cases),
            self.fetch_items(Collection::Team),
            self.fetch_items(Collection::Testimonials),
        );
        SiteContent { services, cases, team, testimonials }
    }

    pub async fn services(&self) -> Vec<ContentItem> { self.fetch_items(Collection::Services).await }
    pub async fn cases(&self) -> Vec<ContentItem> { self.fetch_items(Collection::Cases).await }
    pub async fn team(&self) -> Vec<ContentItem> { self.fetch_items(Collection::Team).await }
    pub async fn testimonials(&self) -> Vec<ContentItem> { self.fetch_items(Collection::Testimonials).await }
    pub async fn posts(&self) -> Vec<ContentItem> { self.fetch_items(Collection::Posts).await }

    // The in-flight call is dropped when the timer fires.
    async fn bounded(&self, path: &str, query: &str) -> Result<Value, FetchError> {
        tokio::time::timeout(self.timeout, self.source.get(path, Some(query)))
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))?
    }
}
