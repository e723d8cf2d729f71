//! Optional translation of item titles and descriptions.
//!
//! [`Translator`] is the seam the export pipeline calls through; the
//! production implementation is [`AzureTranslator`], and tests substitute a
//! stub that never touches the network.

mod azure;

pub use azure::{
    Alignment, AzureTranslator, DetectedLanguage, SentenceLength, SourceText, TranslationEntry,
    TranslationResult, Transliteration, TRANSLATE_API_VERSION,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Failed to encode translation request: {0}")]
    EncodeRequest(#[source] serde_json::Error),
    #[error("Unexpected translation response: {0}")]
    MalformedResponse(#[source] serde_json::Error),
    #[error("Translation response contained no results")]
    EmptyResponse,
    #[error("Translation result contained no translations")]
    NoTranslations,
    #[error("Invalid translator URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Converts a single piece of text into the configured target language.
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text`, returning the first translation the service offers.
    async fn translate(&self, text: &str) -> Result<String, TranslationError>;
}
