//! Collection listing through the paged items API

use crate::client::Session;
use crate::error::{FetchError, ListError};
use crate::types::{CollectionItem, ContentKind};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

/// Page size requested from the items endpoint
pub const PAGE_LIMIT: u64 = 20;

#[derive(Debug, Deserialize)]
struct TotalsResponse {
    paging: Paging,
}

#[derive(Debug, Deserialize)]
struct Paging {
    totals: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ItemsPage {
    #[serde(default)]
    data: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    content: Option<RawContent>,
}

#[derive(Debug, Deserialize)]
struct RawContent {
    url: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    title: Option<String>,
    question: Option<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    title: Option<String>,
}

/// Discovered items, kept as parallel lists until validated
///
/// Every push appends to all lists at once; [`Collection::into_items`]
/// still checks the lengths before pairing them up.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Collection {
    urls: Vec<String>,
    titles: Vec<String>,
    kinds: Vec<ContentKind>,
}

impl Collection {
    pub fn push(&mut self, url: String, title: String, kind: ContentKind) {
        self.urls.push(url);
        self.titles.push(title);
        self.kinds.push(kind);
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Pair URLs with titles, failing if the lists drifted apart
    pub fn into_items(self) -> Result<Vec<CollectionItem>, ListError> {
        if self.urls.len() != self.titles.len() || self.urls.len() != self.kinds.len() {
            return Err(ListError::LengthMismatch {
                urls: self.urls.len(),
                titles: self.titles.len(),
            });
        }
        Ok(self
            .urls
            .into_iter()
            .zip(self.titles)
            .zip(self.kinds)
            .map(|((url, title), kind)| CollectionItem { url, title, kind })
            .collect())
    }
}

/// Collection id from a collection page URL
///
/// `https://www.zhihu.com/collection/12345?page=2` gives `12345`.
pub fn collection_id_from_url(url: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    without_query
        .split('/')
        .rev()
        .map(str::trim)
        .find(|segment| !segment.is_empty())
        .filter(|segment| !segment.contains(':'))
        .map(str::to_string)
}

/// Lists every item of a collection
pub struct CollectionLister<'a> {
    session: &'a Session,
}

impl<'a> CollectionLister<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    fn items_url(&self, collection_id: &str) -> String {
        format!(
            "{}/collections/{}/items",
            self.session.api_base(),
            collection_id.trim()
        )
    }

    /// Total number of items reported by the API
    pub async fn totals(&self, collection_id: &str) -> Result<u64, ListError> {
        let unavailable = |source: FetchError| ListError::TotalsUnavailable {
            collection_id: collection_id.to_string(),
            source,
        };
        let response: TotalsResponse = self
            .session
            .get_json(&self.items_url(collection_id))
            .await
            .map_err(unavailable)?;
        response
            .paging
            .totals
            .ok_or_else(|| unavailable(FetchError::Decode("paging.totals missing".to_string())))
    }

    /// Walk all pages and collect the exportable items in listing order
    pub async fn list_items(&self, collection_id: &str) -> Result<Vec<CollectionItem>, ListError> {
        let totals = self.totals(collection_id).await?;
        info!(collection_id, totals, "Listing collection");

        let mut collection = Collection::default();
        let mut offset = 0;
        while offset < totals {
            let page_url = self.page_url(collection_id, offset)?;
            debug!(offset, url = %page_url, "Fetching collection page");
            let page: ItemsPage = self
                .session
                .get_json(&page_url)
                .await
                .map_err(|source| ListError::Page { offset, source })?;
            collect_page(page, &mut collection);
            offset += PAGE_LIMIT;
        }

        collection.into_items()
    }

    fn page_url(&self, collection_id: &str, offset: u64) -> Result<String, ListError> {
        let offset_param = offset.to_string();
        let limit_param = PAGE_LIMIT.to_string();
        Url::parse_with_params(
            &self.items_url(collection_id),
            [("offset", offset_param.as_str()), ("limit", limit_param.as_str())],
        )
        .map(String::from)
        .map_err(|e| ListError::Page {
            offset,
            source: FetchError::RequestError(format!("invalid page URL: {e}")),
        })
    }
}

fn collect_page(page: ItemsPage, collection: &mut Collection) {
    for item in page.data {
        let Some(content) = item.content else {
            warn!("Collection item without content, skipping");
            continue;
        };
        let kind_name = content.kind.unwrap_or_default();
        let kind = ContentKind::from_api_type(&kind_name);
        let title = match kind {
            ContentKind::Answer => content.question.and_then(|q| q.title),
            ContentKind::Post => content.title,
        };
        match (content.url, title) {
            (Some(url), Some(title)) => collection.push(url, title, kind),
            (url, _) => {
                warn!(
                    kind = %kind_name,
                    url = url.as_deref().unwrap_or(""),
                    "Unsupported collection item (not an answer or post), skipping"
                );
            }
        }
    }
}
