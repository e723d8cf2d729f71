use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{TranslationError, Translator};
use crate::config::TranslatorConfig;

pub const TRANSLATE_API_VERSION: &str = "3.0";

#[derive(Serialize)]
struct TranslateRequestItem<'a> {
    #[serde(rename = "Text")]
    text: &'a str,
}

// The service answers in camelCase; PascalCase keys are accepted as well.

/// One element of the service's response array.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    #[serde(alias = "DetectedLanguage", default)]
    pub detected_language: Option<DetectedLanguage>,
    #[serde(alias = "SourceText", default)]
    pub source_text: Option<SourceText>,
    #[serde(alias = "Translations")]
    pub translations: Vec<TranslationEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectedLanguage {
    #[serde(alias = "Language")]
    pub language: String,
    #[serde(alias = "Score")]
    pub score: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceText {
    #[serde(alias = "Text")]
    pub text: String,
    #[serde(alias = "Script", default)]
    pub script: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationEntry {
    #[serde(alias = "Text")]
    pub text: String,
    #[serde(alias = "To")]
    pub to: String,
    #[serde(alias = "Transliteration", default)]
    pub transliteration: Option<Transliteration>,
    #[serde(alias = "Alignment", default)]
    pub alignment: Option<Alignment>,
    #[serde(alias = "SentLen", default)]
    pub sent_len: Option<SentenceLength>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Transliteration {
    #[serde(alias = "Text")]
    pub text: String,
    #[serde(alias = "Script")]
    pub script: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Alignment {
    #[serde(alias = "Proj")]
    pub proj: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceLength {
    #[serde(alias = "SrcSentLen", default)]
    pub src_sent_len: Vec<u32>,
    #[serde(alias = "TransSentLen", default)]
    pub trans_sent_len: Vec<u32>,
}

/// Client for the Azure Translator text API (`/translate`, version 3.0).
///
/// Each call sends one text and waits for the answer. No timeout, no retry:
/// a failed call aborts the export.
pub struct AzureTranslator {
    client: reqwest::Client,
    url: Url,
    region: String,
    key: SecretString,
}

impl AzureTranslator {
    /// Builds the translator for `config`, reusing `client`'s connection pool.
    ///
    /// # Errors
    ///
    /// [`TranslationError::InvalidUrl`] if the endpoint cannot be turned into
    /// a request URL.
    pub fn new(client: reqwest::Client, config: &TranslatorConfig) -> Result<Self, TranslationError> {
        let url = translate_url(&config.endpoint, &config.target_language)?;
        tracing::debug!(url = %url, region = %config.region, "Translator configured");
        Ok(Self {
            client,
            url,
            region: config.region.clone(),
            key: config.key.clone(),
        })
    }

    /// The full request URL, including `api-version` and `to`.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// `{endpoint}/translate?api-version=3.0&to={target}`, tolerating a trailing
/// slash on the endpoint.
fn translate_url(endpoint: &str, target_language: &str) -> Result<Url, TranslationError> {
    let mut url = Url::parse(&format!("{}/translate", endpoint.trim_end_matches('/')))?;
    url.query_pairs_mut()
        .append_pair("api-version", TRANSLATE_API_VERSION)
        .append_pair("to", target_language);
    Ok(url)
}

#[async_trait::async_trait]
impl Translator for AzureTranslator {
    async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        let body = request_body(text)?;

        let response = self
            .client
            .post(self.url.clone())
            .header("Ocp-Apim-Subscription-Key", self.key.expose_secret())
            .header("Ocp-Apim-Subscription-Region", &self.region)
            .header("Content-Type", "application/json; charset=UTF-8")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "Translator request failed");
            return Err(TranslationError::HttpStatus(response.status().as_u16()));
        }

        let bytes = response.bytes().await?;
        let results: Vec<TranslationResult> =
            serde_json::from_slice(&bytes).map_err(TranslationError::MalformedResponse)?;
        first_translation(results)
    }
}

/// `[{"Text": text}]`, the single-element body the service expects.
fn request_body(text: &str) -> Result<Vec<u8>, TranslationError> {
    serde_json::to_vec(&[TranslateRequestItem { text }]).map_err(TranslationError::EncodeRequest)
}

/// Picks the first translation of the first result, reporting the detected
/// source language along the way.
fn first_translation(results: Vec<TranslationResult>) -> Result<String, TranslationError> {
    let result = results
        .into_iter()
        .next()
        .ok_or(TranslationError::EmptyResponse)?;

    if let Some(detected) = &result.detected_language {
        tracing::info!(
            language = %detected.language,
            score = detected.score,
            "Detected source language"
        );
    }

    result
        .translations
        .into_iter()
        .next()
        .map(|entry| entry.text)
        .ok_or(TranslationError::NoTranslations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(endpoint: &str) -> TranslatorConfig {
        TranslatorConfig {
            region: "japaneast".to_string(),
            key: SecretString::from("test-key".to_string()),
            endpoint: endpoint.to_string(),
            target_language: "ja".to_string(),
        }
    }

    const SERVICE_RESPONSE: &str = r#"[
        {
            "detectedLanguage": {"language": "en", "score": 1.0},
            "translations": [
                {"text": "こんにちは", "to": "ja"},
                {"text": "ignored", "to": "ja"}
            ]
        }
    ]"#;

    #[test]
    fn test_translate_url_with_and_without_trailing_slash() {
        let a = translate_url("https://api.cognitive.microsofttranslator.com/", "ja").unwrap();
        let b = translate_url("https://api.cognitive.microsofttranslator.com", "ja").unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.as_str(),
            "https://api.cognitive.microsofttranslator.com/translate?api-version=3.0&to=ja"
        );
    }

    #[test]
    fn test_parse_pascal_case_response() {
        let json = r#"[{
            "DetectedLanguage": {"Language": "en", "Score": 0.98},
            "SourceText": {"Text": "Hello", "Script": "Latn"},
            "Translations": [{
                "Text": "こんにちは",
                "Transliteration": {"Text": "konnichiwa", "Script": "Latn"},
                "To": "ja",
                "Alignment": {"Proj": "0:4-0:4"},
                "SentLen": {"SrcSentLen": [5], "TransSentLen": [5]}
            }]
        }]"#;
        let results: Vec<TranslationResult> = serde_json::from_str(json).unwrap();
        let detected = results[0].detected_language.as_ref().unwrap();
        assert_eq!(detected.language, "en");
        assert_eq!(results[0].translations[0].to, "ja");
        assert_eq!(
            results[0].translations[0].sent_len.as_ref().unwrap().src_sent_len,
            vec![5]
        );
        assert_eq!(first_translation(results).unwrap(), "こんにちは");
    }

    #[test]
    fn test_request_body_escapes_text() {
        let body = request_body("say \"hi\"\nnow").unwrap();
        assert_eq!(
            String::from_utf8(body).unwrap(),
            r#"[{"Text":"say \"hi\"\nnow"}]"#
        );
    }

    #[test]
    fn test_encode_and_decode_failures_are_distinct() {
        let source = || serde_json::from_str::<u8>("x").unwrap_err();
        let encode = TranslationError::EncodeRequest(source()).to_string();
        let decode = TranslationError::MalformedResponse(source()).to_string();
        assert!(encode.starts_with("Failed to encode translation request"));
        assert!(decode.starts_with("Unexpected translation response"));
    }

    #[test]
    fn test_empty_results_rejected() {
        assert!(matches!(
            first_translation(Vec::new()),
            Err(TranslationError::EmptyResponse)
        ));
    }

    #[test]
    fn test_result_without_translations_rejected() {
        let results: Vec<TranslationResult> =
            serde_json::from_str(r#"[{"translations": []}]"#).unwrap();
        assert!(matches!(
            first_translation(results),
            Err(TranslationError::NoTranslations)
        ));
    }

    #[tokio::test]
    async fn test_translate_sends_expected_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .and(query_param("api-version", "3.0"))
            .and(query_param("to", "ja"))
            .and(header("Ocp-Apim-Subscription-Key", "test-key"))
            .and(header("Ocp-Apim-Subscription-Region", "japaneast"))
            .and(body_json(serde_json::json!([{"Text": "Hello"}])))
            .respond_with(ResponseTemplate::new(200).set_body_string(SERVICE_RESPONSE))
            .expect(1)
            .mount(&mock_server)
            .await;

        let translator =
            AzureTranslator::new(reqwest::Client::new(), &config_for(&mock_server.uri())).unwrap();
        let translated = translator.translate("Hello").await.unwrap();
        assert_eq!(translated, "こんにちは");
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&mock_server)
            .await;

        let translator =
            AzureTranslator::new(reqwest::Client::new(), &config_for(&mock_server.uri())).unwrap();
        let result = translator.translate("Hello").await;
        assert!(matches!(result, Err(TranslationError::HttpStatus(401))));
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"error": "nope"}"#))
            .mount(&mock_server)
            .await;

        let translator =
            AzureTranslator::new(reqwest::Client::new(), &config_for(&mock_server.uri())).unwrap();
        let result = translator.translate("Hello").await;
        assert!(matches!(result, Err(TranslationError::MalformedResponse(_))));
    }

    #[test]
    fn test_invalid_endpoint() {
        let result = AzureTranslator::new(reqwest::Client::new(), &config_for("::not a url"));
        assert!(matches!(result, Err(TranslationError::InvalidUrl(_))));
    }
}
