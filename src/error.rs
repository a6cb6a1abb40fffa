//! Model-boundary error taxonomy.
//!
//! Every failure class the turn loop can hit at the API boundary. The caller
//! catches these once per turn and degrades to a visible fallback message;
//! nothing here terminates the process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// The request never completed (DNS, connect, TLS, timeout).
    #[error("model request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("model API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// A well-formed response carrying no candidate content.
    #[error("model returned no content")]
    EmptyResponse,

    /// The response body could not be decoded.
    #[error("failed to decode model response: {0}")]
    Decode(#[from] serde_json::Error),
}
