//! Cassia - Type Definitions
//!
//! Shared types for the chat runtime: the visible transcript, the wire-level
//! content exchanged with the model, tool declarations, and the model client
//! trait seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ModelError;

// ─── Transcript ──────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Model,
}

/// One visible transcript entry. Immutable once appended to the store.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grounding: Option<GroundingMetadata>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::User,
            text: text.into(),
            timestamp: Utc::now(),
            grounding: None,
        }
    }

    pub fn model(text: impl Into<String>, grounding: Option<GroundingMetadata>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::Model,
            text: text.into(),
            timestamp: Utc::now(),
            grounding,
        }
    }

    /// Citations extracted from grounding metadata, keeping only chunks
    /// that carry both a title and a URI.
    pub fn citations(&self) -> Vec<Citation> {
        self.grounding
            .as_ref()
            .map(|g| g.citations())
            .unwrap_or_default()
    }
}

/// Presentation status of the chat, mirrored by the session.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    Idle,
    Thinking,
    Error,
}

// ─── Wire content ────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentRole {
    User,
    Model,
}

/// One turn of wire-level content: a role plus an ordered list of parts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Content {
    pub role: ContentRole,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: ContentRole::User,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: ContentRole::Model,
            parts: vec![Part::Text(text.into())],
        }
    }
}

/// A single content part. Externally tagged so it serializes exactly as the
/// wire format expects: `{"text": ...}`, `{"functionCall": {...}}` or
/// `{"functionResponse": {...}}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
}

/// A model-issued request to execute a named local function.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub args: serde_json::Value,
}

/// The locally produced result for one function call, echoed back to the
/// model in a synthetic user turn.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub response: serde_json::Value,
}

// ─── Tools ───────────────────────────────────────────────────────

/// Static declaration of a callable tool, defined at process start.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// The tool-set offered to the model for one turn. The two variants are
/// mutually exclusive: a turn gets either local function declarations or the
/// hosted search capability, never both.
#[derive(Clone, Debug, PartialEq)]
pub enum ToolSet {
    Declarations(Vec<ToolDeclaration>),
    Search,
}

impl ToolSet {
    pub fn is_search(&self) -> bool {
        matches!(self, ToolSet::Search)
    }
}

// ─── Grounding metadata ──────────────────────────────────────────

/// Citation data attached to a model answer that used the search capability.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grounding_chunks: Vec<GroundingChunk>,
}

impl GroundingMetadata {
    pub fn citations(&self) -> Vec<Citation> {
        self.grounding_chunks
            .iter()
            .filter_map(|chunk| {
                let web = chunk.web.as_ref()?;
                Some(Citation {
                    title: web.title.clone()?,
                    uri: web.uri.clone()?,
                })
            })
            .collect()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebSource>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSource {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// A fully resolved citation: source title plus URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Citation {
    pub title: String,
    pub uri: String,
}

// ─── Model boundary ──────────────────────────────────────────────

/// One outbound request to the hosted model.
#[derive(Clone, Debug)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub tools: ToolSet,
    pub system_instruction: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub response_tokens: u64,
    pub total_tokens: u64,
}

/// Parsed model response: the raw content (re-sent verbatim on tool-result
/// follow-ups), the concatenated text, any requested function calls, and
/// optional grounding metadata.
#[derive(Clone, Debug, Default)]
pub struct ModelResponse {
    pub content: Option<Content>,
    pub text: String,
    pub function_calls: Vec<FunctionCall>,
    pub grounding: Option<GroundingMetadata>,
    pub usage: TokenUsage,
}

/// The hosted model endpoint, behind a trait so the agent loop can be
/// exercised against a scripted implementation in tests.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<ModelResponse, ModelError>;

    fn model_id(&self) -> &str;
}
