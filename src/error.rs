use thiserror::Error;

use crate::schema::SchemaError;
use crate::share::{DecodeError, ShareError};

/// Failures surfaced to the viewer. Every variant ends in the empty state
/// except `Stale`, which is dropped without touching the canvas.
#[derive(Debug, Error)]
pub enum ErdError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Structured `{error, message}` body returned by the parse endpoint.
    #[error("{error}: {message}")]
    Parse { error: String, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error(transparent)]
    Share(#[from] ShareError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("stale response #{seq}, latest request is #{latest}")]
    Stale { seq: u64, latest: u64 },
}

impl ErdError {
    pub fn kind(&self) -> &'static str {
        match self {
            ErdError::Schema(_) | ErdError::Parse { .. } => "parse_error",
            ErdError::Network(_) | ErdError::Share(_) => "network_error",
            ErdError::Decode(_) => "decode_error",
            ErdError::Stale { .. } => "stale_response",
        }
    }

    /// `{"error": kind, "message": display}`
    pub fn to_json(&self) -> String {
        serde_json::json!({ "error": self.kind(), "message": self.to_string() }).to_string()
    }
}
