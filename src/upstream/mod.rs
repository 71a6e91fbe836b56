pub mod gemini;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::models::api::{ Content, Part };

/// Generation parameters are fixed, not configurable per request.
pub const MAX_OUTPUT_TOKENS: u32 = 1000;
pub const TEMPERATURE: f32 = 0.7;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_output_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
        }
    }
}

/// Steering prompt attached as a separate top-level field, per the upstream
/// REST schema.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

impl SystemInstruction {
    pub fn from_text(text: String) -> Self {
        Self { parts: vec![Part::Text { text }] }
    }
}

/// Fully assembled payload for one `generateContent` call.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
    pub generation_config: GenerationConfig,
}

impl GenerateRequest {
    pub fn new(contents: Vec<Content>, system_instruction: Option<String>) -> Self {
        Self {
            contents,
            system_instruction: system_instruction.map(SystemInstruction::from_text),
            generation_config: GenerationConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Error)]
pub enum UpstreamError {
    /// Non-2xx answer from the upstream API; the relay passes the code through.
    #[error("{message}")]
    Status { code: u16, message: String },
    /// The upstream call never produced an HTTP response.
    #[error("upstream request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        UpstreamError::Transport(err.to_string())
    }
}

/// Seam between the relay handler and the external generative-content API.
/// The credential is supplied per invocation and must never leave this layer
/// except inside the upstream request URL.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate(
        &self,
        api_key: &str,
        request: GenerateRequest
    ) -> Result<String, UpstreamError>;
}
