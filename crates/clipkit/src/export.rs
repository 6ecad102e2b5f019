//! Collection export orchestration
//!
//! Lists a collection, then for each item: skip if already exported, fetch
//! and extract, convert to Markdown, write, throttle. Progress is reported
//! through an [`ExportEvent`] callback so the caller decides how to show it.

use crate::client::Session;
use crate::collection::CollectionLister;
use crate::convert::render_article;
use crate::error::{ExportError, ListError};
use crate::fetchers::FetcherRegistry;
use crate::types::{CollectionItem, ExportSummary};
use crate::writer::{article_path, write_if_absent, Throttle, WriteOutcome};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Progress notification from [`CollectionExporter::export`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportEvent {
    /// Listing finished with `total` exportable items
    Listed { total: usize },
    /// Output already existed; no request was made
    Skipped { title: String },
    Written { path: PathBuf },
    Failed { url: String, error: String },
}

/// Exports every item of a collection as a Markdown file
pub struct CollectionExporter {
    session: Session,
    registry: FetcherRegistry,
    output_dir: PathBuf,
    throttle: Throttle,
}

impl CollectionExporter {
    /// Exporter with the built-in fetchers and the default throttle
    pub fn new(session: Session, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            session,
            registry: FetcherRegistry::with_defaults(),
            output_dir: output_dir.into(),
            throttle: Throttle::default(),
        }
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_registry(mut self, registry: FetcherRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Export the collection, reporting progress to `on_event`
    ///
    /// Listing failures abort the run. Per-item failures are reported and
    /// counted, and the run continues with the next item.
    pub async fn export<F>(
        &self,
        collection_id: &str,
        mut on_event: F,
    ) -> Result<ExportSummary, ListError>
    where
        F: FnMut(ExportEvent),
    {
        let items = CollectionLister::new(&self.session)
            .list_items(collection_id)
            .await?;

        let mut summary = ExportSummary {
            listed: items.len(),
            ..Default::default()
        };
        info!(collection_id, count = items.len(), "Exportable items found");
        on_event(ExportEvent::Listed { total: items.len() });

        for item in &items {
            let path = article_path(&self.output_dir, &item.title);
            match tokio::fs::try_exists(&path).await {
                Ok(true) => {
                    summary.skipped += 1;
                    on_event(ExportEvent::Skipped {
                        title: item.title.clone(),
                    });
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    error!(
                        url = %item.url,
                        path = %path.display(),
                        error = %e,
                        "Cannot check output file"
                    );
                    summary.failed += 1;
                    on_event(ExportEvent::Failed {
                        url: item.url.clone(),
                        error: format!("cannot check {}: {e}", path.display()),
                    });
                    continue;
                }
            }

            match self.export_item(item, &path).await {
                Ok(WriteOutcome::Written) => {
                    summary.written += 1;
                    on_event(ExportEvent::Written { path });
                }
                Ok(WriteOutcome::Skipped) => {
                    summary.skipped += 1;
                    on_event(ExportEvent::Skipped {
                        title: item.title.clone(),
                    });
                }
                Err(e) => {
                    error!(url = %item.url, error = %e, "Failed to export item");
                    summary.failed += 1;
                    on_event(ExportEvent::Failed {
                        url: item.url.clone(),
                        error: e.to_string(),
                    });
                }
            }

            self.throttle.wait().await;
        }

        Ok(summary)
    }

    async fn export_item(
        &self,
        item: &CollectionItem,
        path: &Path,
    ) -> Result<WriteOutcome, ExportError> {
        let tree = self.registry.fetch(&self.session, item).await?;
        let markdown = render_article(&item.url, &tree);
        write_if_absent(path, &markdown)
            .await
            .map_err(|source| ExportError::Write {
                path: path.to_path_buf(),
                source,
            })
    }
}
