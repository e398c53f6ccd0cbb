//! Statement images in, transactions out.
//!
//! One extraction attempt is exactly one `generateContent` call: the fixed
//! prompt first, then every image inline in the order given, with the row
//! schema attached as the structured output constraint.

use async_trait::async_trait;
use ledgerscan_core::{ExtractionError, Extractor, StagedFile, Transaction};
use ledgerscan_ingest::{EncodedImage, encode_all};
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::{ContentGenerator, DEFAULT_BASE_URL, DEFAULT_MODEL, GeminiClient, GeminiConfig};
use crate::prompt::{EXTRACTION_PROMPT, transaction_schema};
use crate::wire::{Content, GenerateContentRequest, GenerationConfig, Part};

pub fn build_request(images: &[EncodedImage]) -> GenerateContentRequest {
    let mut parts = Vec::with_capacity(images.len() + 1);
    parts.push(Part::Text(EXTRACTION_PROMPT.to_string()));
    parts.extend(images.iter().map(Part::from));

    GenerateContentRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts,
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: transaction_schema(),
        },
    }
}

/// Parse the model's reply. Anything that is not a JSON array of rows is
/// reported as `Unparseable`; the raw text only goes to the debug log.
pub fn parse_transactions(text: &str) -> Result<Vec<Transaction>, ExtractionError> {
    serde_json::from_str(text.trim()).map_err(|e| {
        debug!(error = %e, raw = %text, "failed to parse extraction response");
        ExtractionError::Unparseable
    })
}

pub async fn extract_transactions(
    generator: &dyn ContentGenerator,
    files: &[StagedFile],
) -> Result<Vec<Transaction>, ExtractionError> {
    if files.is_empty() {
        return Err(ExtractionError::NoFiles);
    }

    let images = encode_all(files).await?;
    let request = build_request(&images);
    let text = generator.generate_content(&request).await?;
    let rows = parse_transactions(&text)?;

    info!(files = files.len(), rows = rows.len(), "statement extracted");
    Ok(rows)
}

/// Where the API key comes from at call time.
pub trait ApiKeySource: Send + Sync {
    fn api_key(&self) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiSettings {
    pub model: String,
    pub base_url: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Production extractor. Builds a fresh client for every attempt so a key
/// chosen a moment ago is the one that gets used.
pub struct GeminiExtractor {
    settings: GeminiSettings,
    keys: Arc<dyn ApiKeySource>,
}

impl GeminiExtractor {
    pub fn new(settings: GeminiSettings, keys: Arc<dyn ApiKeySource>) -> Self {
        Self { settings, keys }
    }

    fn client(&self) -> Result<GeminiClient, ExtractionError> {
        let api_key = self
            .keys
            .api_key()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ExtractionError::MissingCredential)?;

        GeminiClient::new(GeminiConfig {
            api_key,
            model: self.settings.model.clone(),
            base_url: self.settings.base_url.clone(),
        })
    }
}

#[async_trait]
impl Extractor for GeminiExtractor {
    async fn extract(&self, files: &[StagedFile]) -> Result<Vec<Transaction>, ExtractionError> {
        if files.is_empty() {
            return Err(ExtractionError::NoFiles);
        }
        let client = self.client()?;
        extract_transactions(&client, files).await
    }
}
