//! Gemini Model Client
//!
//! Wraps the `generateContent` REST endpoint. Builds the typed request body
//! (contents, tool-set, system instruction) and parses candidates, function
//! calls, grounding metadata, and usage out of the response.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ModelError;
use crate::types::{
    Content, ContentRole, FunctionCall, GenerateRequest, GroundingMetadata, ModelClient,
    ModelResponse, Part, TokenUsage, ToolSet,
};

pub struct GeminiClient {
    api_url: String,
    api_key: String,
    model: String,
    http: Client,
}

impl GeminiClient {
    /// * `api_url` - Base URL (e.g. `https://generativelanguage.googleapis.com`).
    /// * `api_key` - API credential, passed as the `key` query parameter.
    /// * `model` - Model identifier (e.g. `gemini-2.5-flash`).
    pub fn new(api_url: String, api_key: String, model: String) -> Self {
        Self {
            api_url,
            api_key,
            model,
            http: Client::new(),
        }
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<ModelResponse, ModelError> {
        let body = build_request_body(&request);
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.api_url, self.model, self.api_key
        );

        debug!(model = %self.model, contents = request.contents.len(), "calling model endpoint");

        let resp = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let raw = resp.text().await?;
        let data: Value = serde_json::from_str(&raw)?;

        parse_response(&data)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// Assemble the wire-level JSON body for one request.
fn build_request_body(request: &GenerateRequest) -> Value {
    let tools = match &request.tools {
        ToolSet::Declarations(decls) => json!([{ "functionDeclarations": decls }]),
        ToolSet::Search => json!([{ "googleSearch": {} }]),
    };

    json!({
        "contents": request.contents,
        "tools": tools,
        "systemInstruction": {
            "parts": [{ "text": request.system_instruction }]
        },
        "generationConfig": {
            "maxOutputTokens": 8192
        }
    })
}

/// Walk the response body: first candidate only, text and functionCall parts,
/// grounding and usage metadata. A body without candidate content is an
/// [`ModelError::EmptyResponse`].
fn parse_response(data: &Value) -> Result<ModelResponse, ModelError> {
    let candidate = data["candidates"]
        .as_array()
        .and_then(|c| c.first())
        .ok_or(ModelError::EmptyResponse)?;

    let mut text = String::new();
    let mut function_calls = Vec::new();
    let mut parts = Vec::new();

    if let Some(raw_parts) = candidate["content"]["parts"].as_array() {
        for part in raw_parts {
            if let Some(t) = part["text"].as_str() {
                text.push_str(t);
                parts.push(Part::Text(t.to_string()));
            }
            if part["functionCall"].is_object() {
                let call = FunctionCall {
                    name: part["functionCall"]["name"]
                        .as_str()
                        .unwrap_or_default()
                        .to_string(),
                    id: part["functionCall"]["id"].as_str().map(str::to_string),
                    args: part["functionCall"]["args"].clone(),
                };
                function_calls.push(call.clone());
                parts.push(Part::FunctionCall(call));
            }
        }
    }

    if parts.is_empty() {
        return Err(ModelError::EmptyResponse);
    }

    let grounding: Option<GroundingMetadata> = match candidate.get("groundingMetadata") {
        Some(meta) if meta.is_object() => Some(serde_json::from_value(meta.clone())?),
        _ => None,
    };

    let usage = TokenUsage {
        prompt_tokens: data["usageMetadata"]["promptTokenCount"].as_u64().unwrap_or(0),
        response_tokens: data["usageMetadata"]["candidatesTokenCount"]
            .as_u64()
            .unwrap_or(0),
        total_tokens: data["usageMetadata"]["totalTokenCount"].as_u64().unwrap_or(0),
    };

    Ok(ModelResponse {
        content: Some(Content {
            role: ContentRole::Model,
            parts,
        }),
        text,
        function_calls,
        grounding,
        usage,
    })
}
