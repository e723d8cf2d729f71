//! CSV export of a parsed feed.
//!
//! - [`writer`] - output schema and the quoted-row CSV writer
//! - [`pipeline`] - per-item loop (date normalization, optional translation)
//!   and the end-to-end [`run_export`]

mod pipeline;
mod writer;

pub use pipeline::{export_feed, export_to_path, run_export, ExportSummary};
pub use writer::{ExportRow, RecordWriter, Schema};

use std::path::PathBuf;
use thiserror::Error;

use crate::feed::{FeedError, FetchError};
use crate::translate::TranslationError;

/// Everything that can abort an export run.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to fetch feed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to parse feed: {0}")]
    Feed(#[from] FeedError),

    /// Translating item `index` (zero-based) failed; no row was written for it.
    #[error("Translation failed for item {index}: {source}")]
    Translation {
        index: usize,
        #[source]
        source: TranslationError,
    },

    #[error("Translator setup failed: {0}")]
    TranslatorSetup(#[from] TranslationError),

    #[error("Failed to create output file '{}': {source}", .path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write CSV row: {0}")]
    Csv(#[from] csv::Error),
}
