//! Fetcher system for collection items
//!
//! Each fetcher handles one kind of item: it downloads the page through the
//! shared [`Session`] and extracts the article body for that kind.
//! [`FetcherRegistry`] dispatches to the first matching fetcher.

mod answer;
mod post;

pub use answer::AnswerFetcher;
pub use post::PostFetcher;

use crate::client::Session;
use crate::error::FetchError;
use crate::tree::ContentTree;
use crate::types::CollectionItem;
use async_trait::async_trait;

/// Trait for item fetchers
///
/// Each fetcher declares which items it can handle via `matches()` and
/// performs the download and extraction via `fetch()`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Unique identifier for this fetcher (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Returns true if this fetcher can handle the given item
    ///
    /// More specific fetchers should be registered before generic ones.
    fn matches(&self, item: &CollectionItem) -> bool;

    /// Fetch the item's page and extract its content tree
    ///
    /// Called only if `matches()` returned true.
    async fn fetch(&self, session: &Session, item: &CollectionItem)
        -> Result<ContentTree, FetchError>;
}

/// Registry of fetchers that dispatches to the appropriate handler
pub struct FetcherRegistry {
    fetchers: Vec<Box<dyn Fetcher>>,
}

impl Default for FetcherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FetcherRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            fetchers: Vec::new(),
        }
    }

    /// Create a registry with the built-in fetchers
    ///
    /// Includes (in order of priority):
    /// 1. PostFetcher - column posts, recognized by kind or column host
    /// 2. AnswerFetcher - answers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PostFetcher::new()));
        registry.register(Box::new(AnswerFetcher::new()));
        registry
    }

    /// Register a fetcher; fetchers are checked in registration order
    pub fn register(&mut self, fetcher: Box<dyn Fetcher>) {
        self.fetchers.push(fetcher);
    }

    /// Fetch an item using the first matching fetcher
    pub async fn fetch(
        &self,
        session: &Session,
        item: &CollectionItem,
    ) -> Result<ContentTree, FetchError> {
        for fetcher in &self.fetchers {
            if fetcher.matches(item) {
                tracing::debug!(fetcher = fetcher.name(), url = %item.url, "Using fetcher");
                return fetcher.fetch(session, item).await;
            }
        }

        Err(FetchError::FetcherError(format!(
            "No fetcher available for {} item",
            item.kind
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SessionOptions;
    use crate::types::ContentKind;

    #[test]
    fn test_registry_with_defaults() {
        let registry = FetcherRegistry::with_defaults();
        assert_eq!(registry.fetchers.len(), 2);
        assert_eq!(registry.fetchers[0].name(), "post");
        assert_eq!(registry.fetchers[1].name(), "answer");
    }

    #[tokio::test]
    async fn test_empty_registry_rejects_items() {
        let registry = FetcherRegistry::new();
        let session = Session::new(SessionOptions::default()).unwrap();
        let item = CollectionItem::new("https://example.com/a", "A", ContentKind::Answer);
        let result = registry.fetch(&session, &item).await;
        assert!(matches!(result, Err(FetchError::FetcherError(_))));
    }
}
