//! Vision analysis client - Gemini adapter
//!
//! ## Responsibilities
//!
//! - Send one encoded frame plus the fixed instruction prompt to Gemini
//! - Parse the generated description out of the response
//! - Normalize every failure to a single opaque analysis error
//!
//! Each call is independent; no retries are performed here. Retry is the
//! caller re-invoking capture.

use crate::credential::Credential;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Instruction prompt sent with every frame
pub const ANALYSIS_PROMPT: &str = "Analyze this image in detail. Describe the objects, setting, \
and any text visible. Keep the response concise and structured.";

/// Substituted when the service returns no text
pub const EMPTY_RESPONSE_TEXT: &str = "No analysis text returned.";

/// Uniform user-facing message for any analysis failure
pub const ANALYSIS_FAILED: &str =
    "Failed to analyze image. Please check your API key and try again.";

/// Boundary contract for image analysis.
///
/// Takes the session credential and an encoded JPEG payload, either a
/// `data:` URI or raw base64, and returns descriptive text.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze(&self, credential: &Credential, payload: &str) -> Result<String>;
}

/// Gemini generateContent client
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiInlineData>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
}

impl GeminiClient {
    /// Create a new client against the given API base URL and model
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One generateContent round trip with granular errors, wrapped by
    /// [`ImageAnalyzer::analyze`] before they cross the boundary.
    async fn request_description(&self, credential: &Credential, payload: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}/generateContent",
            self.base_url, self.model
        );

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiPart {
                        text: None,
                        inline_data: Some(GeminiInlineData {
                            mime_type: "image/jpeg".to_string(),
                            data: strip_media_prefix(payload).to_string(),
                        }),
                    },
                    GeminiPart {
                        text: Some(ANALYSIS_PROMPT.to_string()),
                        inline_data: None,
                    },
                ],
            }],
        };

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", credential.expose())
            .json(&request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Internal(format!(
                "Gemini request failed: {} - {}",
                status, body
            )));
        }

        let result: GeminiResponse = resp.json().await?;
        Ok(extract_text(result))
    }
}

#[async_trait]
impl ImageAnalyzer for GeminiClient {
    async fn analyze(&self, credential: &Credential, payload: &str) -> Result<String> {
        match self.request_description(credential, payload).await {
            Ok(text) => Ok(text),
            Err(e) => {
                // Cause stays internal; callers only see the uniform message
                tracing::error!(model = %self.model, error = %e, "Gemini analysis failed");
                Err(Error::Analysis(ANALYSIS_FAILED.to_string()))
            }
        }
    }
}

/// Strip a `data:<type>;base64,` header if present, leaving raw base64
fn strip_media_prefix(payload: &str) -> &str {
    if let Some(rest) = payload.strip_prefix("data:") {
        if let Some(idx) = rest.find(";base64,") {
            return &rest[idx + ";base64,".len()..];
        }
    }
    payload
}

/// First non-empty text part across candidates, or the fixed placeholder
fn extract_text(response: GeminiResponse) -> String {
    response
        .candidates
        .into_iter()
        .flat_map(|c| c.content.parts)
        .filter_map(|p| p.text)
        .find(|t| !t.is_empty())
        .unwrap_or_else(|| EMPTY_RESPONSE_TEXT.to_string())
}
