//! Run configuration, built once at startup from CLI arguments and the
//! environment.
//!
//! Translation is enabled only when all three `TRANSLATOR_*` variables are
//! present; the decision is made here and carried as
//! `ExportConfig::translator: Option<TranslatorConfig>`.
use secrecy::SecretString;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// Environment variable naming the Azure resource region (e.g. `japaneast`).
pub const REGION_VAR: &str = "TRANSLATOR_SERVICE_REGION";
/// Environment variable holding the Translator resource key.
pub const KEY_VAR: &str = "TRANSLATOR_TEXT_RESOURCE_KEY";
/// Environment variable holding the Translator endpoint URL.
pub const ENDPOINT_VAR: &str = "TRANSLATOR_TEXT_ENDPOINT";

pub const DEFAULT_FEED_URL: &str = "https://azurecomcdn.azureedge.net/en-us/updates/feed/";
pub const DEFAULT_TARGET_LANGUAGE: &str = "ja";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {what} URL '{url}': {source}")]
    InvalidUrl {
        what: &'static str,
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported scheme in {what} URL: {scheme} (only http/https allowed)")]
    UnsupportedScheme { what: &'static str, scheme: String },

    #[error("Target language must not be empty")]
    EmptyTargetLanguage,
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Everything one export run needs.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Feed to read.
    pub feed_url: String,
    /// CSV destination, overwritten on every run.
    pub output_path: PathBuf,
    /// Prefix the CSV with a UTF-8 byte-order mark.
    pub write_bom: bool,
    /// `Some` when translation is enabled for this run.
    pub translator: Option<TranslatorConfig>,
}

impl ExportConfig {
    /// Validates the feed URL and assembles the run configuration.
    pub fn new(
        feed_url: &str,
        output_path: PathBuf,
        write_bom: bool,
        translator: Option<TranslatorConfig>,
    ) -> Result<Self, ConfigError> {
        validate_http_url("feed", feed_url)?;
        Ok(Self {
            feed_url: feed_url.trim().to_string(),
            output_path,
            write_bom,
            translator,
        })
    }

    pub fn translation_enabled(&self) -> bool {
        self.translator.is_some()
    }
}

/// Connection settings for the Azure Translator text API.
///
/// Custom Debug impl masks `key` so it never shows up in logs or error output.
#[derive(Clone)]
pub struct TranslatorConfig {
    pub region: String,
    pub key: SecretString,
    pub endpoint: String,
    pub target_language: String,
}

impl std::fmt::Debug for TranslatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslatorConfig")
            .field("region", &self.region)
            .field("key", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .field("target_language", &self.target_language)
            .finish()
    }
}

impl TranslatorConfig {
    /// Reads the three `TRANSLATOR_*` variables from the process environment.
    ///
    /// - All three present → `Ok(Some(config))`
    /// - Any missing or blank → `Ok(None)` (translation disabled for the run)
    /// - Endpoint present but not a valid http(s) URL → `Err`
    pub fn from_env(target_language: &str) -> Result<Option<Self>, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok(), target_language)
    }

    /// Same as [`from_env`](Self::from_env) but with an injectable lookup.
    pub fn from_lookup<F>(lookup: F, target_language: &str) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let (region, key, endpoint) = match (read(REGION_VAR), read(KEY_VAR), read(ENDPOINT_VAR)) {
            (Some(region), Some(key), Some(endpoint)) => (region, key, endpoint),
            (region, key, endpoint) => {
                tracing::info!(
                    region_set = region.is_some(),
                    key_set = key.is_some(),
                    endpoint_set = endpoint.is_some(),
                    "Translator not fully configured, translation disabled"
                );
                return Ok(None);
            }
        };

        let target_language = target_language.trim();
        if target_language.is_empty() {
            return Err(ConfigError::EmptyTargetLanguage);
        }
        validate_http_url("translator endpoint", &endpoint)?;

        Ok(Some(Self {
            region: region.trim().to_string(),
            key: SecretString::from(key.trim().to_string()),
            endpoint: endpoint.trim().to_string(),
            target_language: target_language.to_string(),
        }))
    }
}

fn validate_http_url(what: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|source| ConfigError::InvalidUrl {
        what,
        url: value.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::UnsupportedScheme {
            what,
            scheme: scheme.to_string(),
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================
