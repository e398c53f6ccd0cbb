//! Request and response bodies of the Gemini `generateContent` REST call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use ledgerscan_ingest::EncodedImage;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    InlineData(Blob),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

impl From<&EncodedImage> for Part {
    fn from(img: &EncodedImage) -> Self {
        Part::InlineData(Blob {
            mime_type: img.media_type.clone(),
            data: img.data.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: Schema,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    Array,
    Object,
    String,
    Number,
}

/// OpenAPI-subset schema understood by `responseSchema`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type")]
    pub kind: SchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Declaration order of `properties`; the map itself is sorted.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub property_ordering: Vec<String>,
}

impl Schema {
    pub fn new(kind: SchemaType) -> Self {
        Self {
            kind,
            description: None,
            nullable: None,
            items: None,
            properties: BTreeMap::new(),
            required: Vec::new(),
            property_ordering: Vec::new(),
        }
    }

    pub fn array_of(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::new(SchemaType::Array)
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = Some(true);
        self
    }

    pub fn property(mut self, name: &str, schema: Schema) -> Self {
        self.property_ordering.push(name.to_string());
        self.properties.insert(name.to_string(), schema);
        self
    }

    pub fn require<const N: usize>(mut self, names: [&str; N]) -> Self {
        self.required.extend(names.iter().map(|n| n.to_string()));
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Set when the prompt itself was blocked and no candidate was produced.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
    #[serde(default)]
    pub thought: bool,
}

impl GenerateContentResponse {
    /// Text of the first candidate, thought parts skipped. `None` when there
    /// is no candidate content at all (blocked prompt, safety stop).
    pub fn text(&self) -> Option<String> {
        self.candidates.first().and_then(|c| c.content.as_ref()).map(|c| {
            c.parts
                .iter()
                .filter(|p| !p.thought)
                .filter_map(|p| p.text.as_deref())
                .collect::<String>()
        })
    }

    /// Why no content came back, e.g. `blocked: SAFETY`.
    pub fn empty_reason(&self) -> String {
        let block = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref());
        let finish = self
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref());
        match (block, finish) {
            (Some(reason), _) => format!("blocked: {reason}"),
            (None, Some(reason)) => format!("finish reason: {reason}"),
            (None, None) => "no candidates".to_string(),
        }
    }
}

/// Google API error body: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}
