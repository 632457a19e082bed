//! Client side of the generative-model boundary.
//!
//! Flows only see [`GenerativeModel`]: a prompt and an optional inline image
//! go in, a JSON value comes out. [`GeminiClient`] is the production
//! implementation; [`DisabledModel`] stands in when no API key is set.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, instrument};

use super::error::AiError;
use crate::config::AiConfig;

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Largest decoded image accepted for estimation.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Base64 image payload sent alongside a prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Result<Self, AiError> {
        if bytes.is_empty() {
            return Err(AiError::BadInput("image is empty".into()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AiError::BadInput("image is too large".into()));
        }
        if !mime_type.starts_with("image/") {
            return Err(AiError::BadInput(format!("unsupported content type `{mime_type}`")));
        }
        Ok(Self {
            mime_type: mime_type.to_owned(),
            data: STANDARD.encode(bytes),
        })
    }

    /// Parses `data:<mime>;base64,<payload>`.
    pub fn from_data_uri(uri: &str) -> Result<Self, AiError> {
        let bad = |why: &str| AiError::BadInput(format!("invalid photo data URI: {why}"));
        let rest = uri.strip_prefix("data:").ok_or_else(|| bad("missing `data:` prefix"))?;
        let (meta, payload) = rest.split_once(',').ok_or_else(|| bad("missing payload"))?;
        let mime_type = meta
            .strip_suffix(";base64")
            .ok_or_else(|| bad("payload must be base64"))?;
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|_| bad("payload is not valid base64"))?;
        Self::from_bytes(mime_type, &bytes)
    }
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Sends one prompt and returns the model's answer parsed as JSON.
    async fn generate_json(&self, prompt: &str, image: Option<InlineImage>) -> Result<Value, AiError>;
}

/// Used when no API key is configured.
pub struct DisabledModel;

#[async_trait]
impl GenerativeModel for DisabledModel {
    async fn generate_json(&self, _prompt: &str, _image: Option<InlineImage>) -> Result<Value, AiError> {
        Err(AiError::NotConfigured)
    }
}

// --- Gemini wire types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

pub struct GeminiClient {
    api_key: String,
    model: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }

    /// `None` when the config carries no API key.
    pub fn from_config(cfg: &AiConfig) -> anyhow::Result<Option<Self>> {
        cfg.api_key
            .as_deref()
            .map(|key| Self::new(key, cfg.model.clone(), Duration::from_secs(cfg.timeout_secs)))
            .transpose()
    }

    fn url(&self) -> String {
        format!(
            "{API_BASE_URL}/models/{}:generateContent?key={}",
            self.model, self.api_key
        )
    }

    fn build_request(prompt: &str, image: Option<InlineImage>) -> GeminiRequest {
        let mut parts = vec![ContentPart::Text { text: prompt.to_owned() }];
        if let Some(image) = image {
            parts.push(ContentPart::InlineData {
                inline_data: Blob {
                    mime_type: image.mime_type,
                    data: image.data,
                },
            });
        }
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".into()),
                parts,
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.2,
            },
        }
    }

    fn extract_text(response: &GeminiResponse) -> Result<&str, AiError> {
        response
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.content.as_ref())
            .and_then(|c| {
                c.parts.iter().find_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::InlineData { .. } => None,
                })
            })
            .ok_or_else(|| AiError::Malformed("no text in response".into()))
    }
}

/// 429 keeps the service's own message; anything else is "unavailable".
fn map_api_error(status: u16, body: &str) -> AiError {
    let message = serde_json::from_str::<GeminiResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .map_or_else(|| body.to_owned(), |e| e.message);
    match status {
        429 => AiError::RateLimited(quota_message(&message)),
        _ => AiError::Unavailable(format!("status {status}: {message}")),
    }
}

fn quota_message(message: &str) -> String {
    let seconds = message
        .split_once("Please retry in ")
        .and_then(|(_, rest)| rest.split_once('s'))
        .and_then(|(secs, _)| secs.parse::<f64>().ok());
    match seconds {
        Some(s) => format!("AI service quota exceeded. Please try again in {} seconds.", s.ceil()),
        None => "AI service quota exceeded. Please wait a moment and try again.".to_owned(),
    }
}

/// Models sometimes wrap JSON in a markdown fence even in JSON mode.
pub(crate) fn parse_json_text(text: &str) -> Result<Value, AiError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(body.trim()).map_err(|e| AiError::Malformed(format!("not JSON: {e}")))
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    #[instrument(skip(self, prompt, image), fields(model = %self.model, with_image = image.is_some()))]
    async fn generate_json(&self, prompt: &str, image: Option<InlineImage>) -> Result<Value, AiError> {
        let request = Self::build_request(prompt, image);
        debug!("sending request to Gemini");

        let response = self.client.post(self.url()).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(%status, "Gemini API error");
            return Err(map_api_error(status.as_u16(), &body));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "failed to parse Gemini response");
            AiError::Malformed(e.to_string())
        })?;
        if let Some(err) = parsed.error {
            return Err(AiError::Unavailable(err.message));
        }

        let value = parse_json_text(Self::extract_text(&parsed)?)?;
        debug!("received Gemini response");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_is_decoded() {
        let image = InlineImage::from_data_uri("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "iVBORw0KGgo=");
    }

    #[test]
    fn bad_data_uris_are_rejected() {
        for uri in [
            "image/png;base64,AAAA",
            "data:image/png,AAAA",
            "data:image/png;base64,@@@",
            "data:text/plain;base64,AAAA",
            "data:image/png;base64,",
        ] {
            assert!(
                matches!(InlineImage::from_data_uri(uri), Err(AiError::BadInput(_))),
                "{uri}"
            );
        }
    }

    #[test]
    fn request_carries_json_mode_and_image() {
        let image = InlineImage { mime_type: "image/jpeg".into(), data: "AAAA".into() };
        let body = serde_json::to_value(GeminiClient::build_request("hi", Some(image))).unwrap();
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/jpeg");
    }

    #[test]
    fn extracts_first_text_part() {
        let raw = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"[1,2]"}]}}]}"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(GeminiClient::extract_text(&parsed).unwrap(), "[1,2]");

        let empty: GeminiResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(matches!(GeminiClient::extract_text(&empty), Err(AiError::Malformed(_))));
    }

    #[test]
    fn rate_limit_message_mentions_wait() {
        let body = r#"{"error":{"message":"Quota exceeded. Please retry in 6.4s."}}"#;
        match map_api_error(429, body) {
            AiError::RateLimited(msg) => assert!(msg.contains("7 seconds"), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(map_api_error(500, "boom"), AiError::Unavailable(_)));
    }

    #[test]
    fn fenced_json_is_accepted() {
        assert_eq!(parse_json_text("```json\n[1]\n```").unwrap(), serde_json::json!([1]));
        assert_eq!(parse_json_text(" {\"a\":1} ").unwrap(), serde_json::json!({"a": 1}));
        assert!(parse_json_text("sorry, no").is_err());
    }

    #[tokio::test]
    async fn disabled_model_refuses() {
        let err = DisabledModel.generate_json("x", None).await.unwrap_err();
        assert_eq!(err, AiError::NotConfigured);
    }
}
