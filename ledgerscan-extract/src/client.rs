use async_trait::async_trait;
use ledgerscan_core::ExtractionError;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::debug;

use crate::wire::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// One model call: request in, response text out.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<String, ExtractionError>;
}

/// Everything needed to talk to Gemini, resolved right before the call.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, ExtractionError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| ExtractionError::service("API key not valid: contains characters that cannot be sent"))?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ExtractionError::service(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<String, ExtractionError> {
        let url = self.endpoint();
        debug!(%url, model = %self.config.model, "POST generateContent");

        let resp = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ExtractionError::service(format!("gemini request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ExtractionError::service(format!("reading gemini response: {e}")))?;

        if !status.is_success() {
            return Err(ExtractionError::service(service_error_message(status, &body)));
        }

        let out: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| ExtractionError::service(format!("parse gemini response: {e}")))?;
        out.text().ok_or_else(|| {
            ExtractionError::service(format!("gemini returned no content ({})", out.empty_reason()))
        })
    }
}

/// Human message for a non-2xx reply; keeps the provider's wording so the
/// auth classifier can see it.
pub fn service_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(env) = serde_json::from_str::<ErrorEnvelope>(body) {
        return format!("{status}: {}", env.error.message);
    }
    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    }
}
