//! Gemini image generation client using the `generateContent` API.
//!
//! Sends the base image as an inline data part next to the prompt and asks
//! for an IMAGE response modality. The response is decoded into raw image
//! bytes here; untyped JSON never leaves this module.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::provider::{GeneratedImage, ImageGenerator};
use crate::config::GeminiConfig;
use crate::credential::ApiKey;
use crate::error::GenerationError;
use crate::request::GenerationRequest;

/// Follow-up instruction appended after the prompt.
const GENERATE_NOW: &str = "Generate the variation now.";

/// Longest slice of an error body kept in messages.
const MAX_BODY_IN_MESSAGE: usize = 300;

/// Gemini client. One instance is shared by all workers.
pub struct GeminiClient {
    name: String,
    url: String,
    api_key: ApiKey,
    timeout: Duration,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig, api_key: ApiKey, timeout: Duration) -> Self {
        Self {
            name: format!("gemini:{}", config.model),
            url: format!(
                "{}/models/{}:generateContent",
                config.endpoint.trim_end_matches('/'),
                config.model
            ),
            api_key,
            timeout,
            client: reqwest::Client::new(),
        }
    }

    /// The `generateContent` URL this client posts to.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn redact(&self, text: &str) -> String {
        text.replace(self.api_key.expose(), "[redacted]")
    }
}

// --- Request types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

// --- Response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

fn request_body(request: &GenerationRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts: vec![
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: request.image.media_type.clone(),
                        data: request.image.data.clone(),
                    },
                },
                Part::Text {
                    text: request.prompt.clone(),
                },
                Part::Text {
                    text: GENERATE_NOW.to_string(),
                },
            ],
        }],
        generation_config: GenerationConfig {
            response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
        },
    }
}

/// Map a non-success HTTP status onto the failure taxonomy.
pub fn classify_status(status: u16, body: &str) -> GenerationError {
    let message = format!("HTTP {status}: {}", truncate(body.trim(), MAX_BODY_IN_MESSAGE));
    match status {
        401 | 403 => GenerationError::Auth(message),
        429 => GenerationError::RateLimited(message),
        408 | 500..=599 => GenerationError::Transient(message),
        _ => GenerationError::InvalidResponse(message),
    }
}

/// Map a transport-level failure onto the failure taxonomy.
fn classify_transport(err: &reqwest::Error, message: String) -> GenerationError {
    if err.is_builder() {
        GenerationError::InvalidResponse(message)
    } else {
        // Timeouts, connection resets, DNS failures and body read errors
        GenerationError::Transient(message)
    }
}

/// Decode a 2xx response body into image bytes.
///
/// Accepts either a raw `image/*` body or a JSON body carrying a base64
/// `inlineData` image part.
pub fn decode_response(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<GeneratedImage, GenerationError> {
    if content_type.is_some_and(|ct| ct.starts_with("image/")) {
        return sniff_image(body.to_vec());
    }

    let parsed: GenerateContentResponse = serde_json::from_slice(body).map_err(|e| {
        GenerationError::InvalidResponse(format!("failed to parse Gemini response: {e}"))
    })?;

    let mut texts = Vec::new();
    let mut finish_reasons = Vec::new();
    for candidate in parsed.candidates {
        if let Some(reason) = candidate.finish_reason {
            finish_reasons.push(reason);
        }
        let Some(content) = candidate.content else {
            continue;
        };
        for part in content.parts {
            if let Some(inline) = part.inline_data {
                if !inline.mime_type.starts_with("image/") {
                    continue;
                }
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(inline.data.as_bytes())
                    .map_err(|e| {
                        GenerationError::InvalidResponse(format!("image data is not base64: {e}"))
                    })?;
                return sniff_image(bytes);
            }
            if let Some(text) = part.text {
                if !text.trim().is_empty() {
                    texts.push(text);
                }
            }
        }
    }

    if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GenerationError::InvalidResponse(format!(
            "prompt blocked: {reason}"
        )));
    }

    let mut message = "response contained no image".to_string();
    if !finish_reasons.is_empty() {
        message.push_str(&format!(" (finish reason: {})", finish_reasons.join(", ")));
    }
    if !texts.is_empty() {
        message.push_str(&format!(
            "; text: {}",
            truncate(&texts.join(" "), MAX_BODY_IN_MESSAGE)
        ));
    }
    Err(GenerationError::InvalidResponse(message))
}

fn sniff_image(bytes: Vec<u8>) -> Result<GeneratedImage, GenerationError> {
    if bytes.is_empty() {
        return Err(GenerationError::InvalidResponse(
            "image payload is empty".to_string(),
        ));
    }
    let format = image::guess_format(&bytes).map_err(|e| {
        GenerationError::InvalidResponse(format!("payload is not a recognized image: {e}"))
    })?;
    Ok(GeneratedImage {
        bytes,
        mime_type: format.to_mime_type().to_string(),
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedImage, GenerationError> {
        let start = Instant::now();
        let body = request_body(request);

        let resp = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", self.api_key.expose())
            .header("Content-Type", "application/json")
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| {
                let message = self.redact(&format!("Gemini request failed: {e}"));
                classify_transport(&e, message)
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), &self.redact(&text)));
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await.map_err(|e| {
            let message = self.redact(&format!("failed to read Gemini response body: {e}"));
            classify_transport(&e, message)
        })?;

        let image = decode_response(content_type.as_deref(), &bytes)?;
        tracing::debug!(
            category = %request.category,
            variant = request.variant_index,
            bytes = image.bytes.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Gemini returned image"
        );
        Ok(image)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
