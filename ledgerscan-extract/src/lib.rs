//! ledgerscan-extract: Gemini-backed transaction extraction from statement images

pub mod client;
pub mod extractor;
pub mod prompt;
pub mod wire;

pub use client::{ContentGenerator, GeminiClient, GeminiConfig};
pub use extractor::{ApiKeySource, GeminiExtractor, GeminiSettings, extract_transactions, parse_transactions};
pub use prompt::{EXTRACTION_PROMPT, transaction_schema};
pub use wire::{GenerateContentRequest, GenerateContentResponse, Part, Schema, SchemaType};
