//! Clipkit - collection exporter and LLM annotator for Markdown notes
//!
//! Two independent pipelines share this crate:
//!
//! - **Export**: [`CollectionExporter`] lists a bookmark collection through
//!   its paged API, fetches each answer or column post, extracts the article
//!   body and converts it to Markdown, one file per item.
//! - **Annotate**: [`DocumentPipeline`] reads a directory of Markdown files,
//!   asks a chat-completion model for an annotation block and writes the
//!   annotated copies. Failed calls get a local fallback annotation.
//!
//! ## Fetcher System
//!
//! Items are fetched through a pluggable [`FetcherRegistry`]; the first
//! registered [`Fetcher`] whose `matches()` accepts the item handles it.
//!
//! Built-in fetchers:
//! - [`PostFetcher`] - column posts
//! - [`AnswerFetcher`] - answers

pub mod annotate;
pub mod client;
pub mod collection;
pub mod config;
pub mod convert;
mod error;
pub mod export;
pub mod extract;
pub mod fetchers;
pub mod pipeline;
pub mod tree;
mod types;
pub mod writer;

pub use annotate::{annotate_or_fallback, fallback_annotation, Annotator, ChatAnnotator};
pub use client::{Session, SessionOptions};
pub use collection::{collection_id_from_url, CollectionLister};
pub use config::{AiConfig, AnnotatorConfig, ConfigLoader, RawConfig};
pub use convert::{render_article, to_markdown};
pub use error::{AnnotateError, ConfigError, ExportError, FetchError, ListError};
pub use export::{CollectionExporter, ExportEvent};
pub use extract::extract_content;
pub use fetchers::{AnswerFetcher, Fetcher, FetcherRegistry, PostFetcher};
pub use pipeline::DocumentPipeline;
pub use tree::{ContentTree, Element, Node};
pub use types::{
    AnnotateSummary, CollectionItem, ContentKind, DocumentOutcome, ExportSummary,
};
pub use writer::{sanitize_title, write_if_absent, Throttle, WriteOutcome};

/// Default User-Agent string (a desktop browser; the site serves stripped
/// pages to unknown agents)
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Env var holding the browser cookie string for the exporter
pub const COOKIE_ENV: &str = "ZHIHU_COOKIE";

/// Default directory for exported articles
pub const DEFAULT_DOWNLOAD_DIR: &str = "data/zhihu_downloads";
