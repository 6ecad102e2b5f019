//! Column post fetcher

use crate::client::Session;
use crate::error::FetchError;
use crate::extract::extract_content;
use crate::fetchers::Fetcher;
use crate::tree::ContentTree;
use crate::types::{CollectionItem, ContentKind};
use async_trait::async_trait;
use url::Url;

/// Host prefix of column (long-form post) pages
const COLUMN_HOST_PREFIX: &str = "zhuanlan.";

/// Fetches column posts and extracts the rich-text body
///
/// Matches items listed as posts, and any item served from a column host
/// regardless of the kind the API reported.
pub struct PostFetcher;

impl PostFetcher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PostFetcher {
    fn default() -> Self {
        Self::new()
    }
}

fn is_column_url(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.starts_with(COLUMN_HOST_PREFIX)))
        .unwrap_or(false)
}

#[async_trait]
impl Fetcher for PostFetcher {
    fn name(&self) -> &'static str {
        "post"
    }

    fn matches(&self, item: &CollectionItem) -> bool {
        item.kind == ContentKind::Post || is_column_url(&item.url)
    }

    async fn fetch(
        &self,
        session: &Session,
        item: &CollectionItem,
    ) -> Result<ContentTree, FetchError> {
        let html = session.get_text(&item.url).await?;
        Ok(extract_content(&html, ContentKind::Post))
    }
}
