//! Batch annotation of a directory of Markdown documents

use crate::annotate::{annotate_or_fallback, Annotator};
use crate::types::{AnnotateSummary, DocumentOutcome};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// File extensions treated as Markdown input
const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Reads every Markdown file in a directory, annotates it, and writes the
/// annotated copy under the same name in the output directory
pub struct DocumentPipeline {
    annotator: Box<dyn Annotator>,
}

impl DocumentPipeline {
    pub fn new(annotator: Box<dyn Annotator>) -> Self {
        Self { annotator }
    }

    /// Process all documents, one at a time in file-name order
    ///
    /// Per-document failures are logged and tallied; only a failure to list
    /// the input or create the output directory aborts the run.
    pub async fn process(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> std::io::Result<AnnotateSummary> {
        tokio::fs::create_dir_all(output_dir).await?;

        let files = list_markdown_files(input_dir).await?;
        let mut summary = AnnotateSummary::default();
        if files.is_empty() {
            info!(input_dir = %input_dir.display(), "No Markdown files to annotate");
            return Ok(summary);
        }

        info!(count = files.len(), input_dir = %input_dir.display(), "Annotating documents");
        for path in files {
            let outcome = self.process_file(&path, output_dir).await;
            summary.record(&outcome);
        }
        Ok(summary)
    }

    async fn process_file(&self, path: &Path, output_dir: &Path) -> DocumentOutcome {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to read document");
                return DocumentOutcome::ReadFailed(path.to_path_buf());
            }
        };

        let (annotation, from_model) = annotate_or_fallback(self.annotator.as_ref(), &content).await;

        let Some(name) = path.file_name() else {
            return DocumentOutcome::WriteFailed(path.to_path_buf());
        };
        let out_path = output_dir.join(name);
        let document = format!("{annotation}\n\n{content}");
        if let Err(e) = tokio::fs::write(&out_path, document).await {
            error!(path = %out_path.display(), error = %e, "Failed to write document");
            return DocumentOutcome::WriteFailed(out_path);
        }

        if from_model {
            info!(path = %out_path.display(), "Annotated");
            DocumentOutcome::Annotated(out_path)
        } else {
            warn!(path = %out_path.display(), "Written with fallback annotation");
            DocumentOutcome::Fallback(out_path)
        }
    }
}

/// Markdown files directly inside `dir`, sorted by name
///
/// Symlinks are followed; entries whose metadata cannot be read are logged
/// and skipped.
pub async fn list_markdown_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => continue,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot stat input entry, skipping");
                continue;
            }
        }
        let is_markdown = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| MARKDOWN_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if is_markdown {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
