//! Answer fetcher

use crate::client::Session;
use crate::error::FetchError;
use crate::extract::extract_content;
use crate::fetchers::Fetcher;
use crate::tree::ContentTree;
use crate::types::{CollectionItem, ContentKind};
use async_trait::async_trait;

/// Fetches answer pages and extracts the answer card body
pub struct AnswerFetcher;

impl AnswerFetcher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AnswerFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for AnswerFetcher {
    fn name(&self) -> &'static str {
        "answer"
    }

    fn matches(&self, item: &CollectionItem) -> bool {
        item.kind == ContentKind::Answer
    }

    async fn fetch(
        &self,
        session: &Session,
        item: &CollectionItem,
    ) -> Result<ContentTree, FetchError> {
        let html = session.get_text(&item.url).await?;
        Ok(extract_content(&html, ContentKind::Answer))
    }
}
