//! Core types for Clipkit

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Content kind of a collection item
///
/// Selects the fetcher and the extraction root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Answer to a question; titled after the question
    Answer,
    /// Long-form column post (and any other titled kind)
    Post,
}

impl ContentKind {
    /// Classify an API `type` discriminator
    pub fn from_api_type(kind: &str) -> Self {
        if kind == "answer" {
            ContentKind::Answer
        } else {
            ContentKind::Post
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Answer => write!(f, "answer"),
            ContentKind::Post => write!(f, "post"),
        }
    }
}

/// One bookmarked item discovered by the collection lister
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionItem {
    pub url: String,
    pub title: String,
    pub kind: ContentKind,
}

impl CollectionItem {
    pub fn new(url: impl Into<String>, title: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            kind,
        }
    }
}

/// Result of processing one input document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Written with a model-generated annotation
    Annotated(PathBuf),
    /// Written with the local fallback annotation
    Fallback(PathBuf),
    /// Input could not be read
    ReadFailed(PathBuf),
    /// Output could not be written
    WriteFailed(PathBuf),
}

/// Tally of an annotator run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotateSummary {
    pub annotated: usize,
    pub fallback: usize,
    pub failed: usize,
}

impl AnnotateSummary {
    pub fn record(&mut self, outcome: &DocumentOutcome) {
        match outcome {
            DocumentOutcome::Annotated(_) => self.annotated += 1,
            DocumentOutcome::Fallback(_) => self.fallback += 1,
            DocumentOutcome::ReadFailed(_) | DocumentOutcome::WriteFailed(_) => self.failed += 1,
        }
    }

    /// Number of output files produced
    pub fn written(&self) -> usize {
        self.annotated + self.fallback
    }
}

impl fmt::Display for AnnotateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} annotated, {} with fallback annotation, {} failed",
            self.annotated, self.fallback, self.failed
        )
    }
}

/// Tally of an exporter run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub listed: usize,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} listed, {} written, {} already exported, {} failed",
            self.listed, self.written, self.skipped, self.failed
        )
    }
}
