use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::model::Message;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelGatewayRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: Option<String>,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelGatewayResponse {
    pub content: String,
    pub stop_reason: Option<String>,
}

impl ModelGatewayResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            stop_reason: Some("end_turn".to_string()),
        }
    }
}

/// Every way a single request can fail. The driver treats them all as
/// "request failed"; the variants exist so the message can say why.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("authentication failed: {message}. Check that ANTHROPIC_API_KEY is valid.")]
    Authentication { message: String },

    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("rate limited by the API: {message}{}", retry_hint(.retry_after_secs))]
    RateLimited {
        message: String,
        retry_after_secs: Option<u64>,
    },

    #[error("invalid model '{model}': {message}")]
    InvalidModel { model: String, message: String },

    #[error("request rejected: {message}")]
    BadRequest { message: String },

    #[error("the API is overloaded: {message}")]
    Overloaded { message: String },

    #[error(
        "model request timed out after {timeout_secs}s while calling '{url}'. \
         Increase MODEL_TIMEOUT_SECS or try again."
    )]
    Timeout { url: String, timeout_secs: u64 },

    #[error("{message}")]
    Connection { message: String },

    #[error("model request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to parse model response: {message}")]
    Decode { message: String },

    #[error("model response contained no text")]
    EmptyResponse,
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => "authentication",
            Self::PermissionDenied { .. } => "permission",
            Self::RateLimited { .. } => "rate_limit",
            Self::InvalidModel { .. } => "invalid_model",
            Self::BadRequest { .. } => "bad_request",
            Self::Overloaded { .. } => "overloaded",
            Self::Timeout { .. } => "timeout",
            Self::Connection { .. } => "connection",
            Self::Status { .. } => "status",
            Self::Decode { .. } => "decode",
            Self::EmptyResponse => "empty_response",
        }
    }
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    retry_after_secs
        .map(|secs| format!(" (retry after {secs}s)"))
        .unwrap_or_default()
}

pub type ModelGatewayFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ModelGatewayResponse, ApiError>> + 'a>>;

/// The one seam between the CLI and the network.
pub trait ModelGateway {
    fn submit<'a>(&'a self, request: ModelGatewayRequest) -> ModelGatewayFuture<'a>;
}
