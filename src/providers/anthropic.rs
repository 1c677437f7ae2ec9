use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::model::Message;
use crate::model_gateway::{
    ApiError, ModelGateway, ModelGatewayFuture, ModelGatewayRequest, ModelGatewayResponse,
};
use crate::providers::http_errors::{model_api_request_error, model_api_status_error};

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

fn messages_url(base_url: &str) -> String {
    format!("{}/v1/messages", base_url.trim_end_matches('/'))
}

fn collect_text(blocks: &[ContentBlock]) -> Option<String> {
    let texts: Vec<&str> = blocks
        .iter()
        .filter(|block| block.block_type == "text")
        .filter_map(|block| block.text.as_deref())
        .collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.concat())
    }
}

/// Talks to the Anthropic Messages API.
pub struct AnthropicGateway<'a> {
    client: Client,
    cfg: &'a Config,
}

impl<'a> AnthropicGateway<'a> {
    pub fn new(cfg: &'a Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.model_timeout_secs))
            .default_headers(default_headers(cfg)?)
            .build()?;
        Ok(Self { client, cfg })
    }

    async fn send(&self, request: ModelGatewayRequest) -> Result<ModelGatewayResponse, ApiError> {
        let api_url = messages_url(&self.cfg.api_base_url);
        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            system: request.system.as_deref(),
            messages: &request.messages,
        };
        debug!(
            api_url = %api_url,
            model = %request.model,
            max_tokens = request.max_tokens,
            message_count = request.messages.len(),
            "sending messages request"
        );

        let response = self
            .client
            .post(&api_url)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                warn!(
                    api_url = %api_url,
                    model = %request.model,
                    error = %err,
                    "messages request failed"
                );
                model_api_request_error(err, &api_url, self.cfg.model_timeout_secs)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok());
            let response_body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read response body>".to_string());
            warn!(
                api_url = %api_url,
                model = %request.model,
                status = %status,
                response_body_len = response_body.len(),
                "messages API returned non-success status"
            );
            return Err(model_api_status_error(
                status.as_u16(),
                retry_after_secs,
                &response_body,
                &request.model,
            ));
        }

        let parsed: MessagesResponse = response.json().await.map_err(|err| ApiError::Decode {
            message: err.to_string(),
        })?;
        let content = collect_text(&parsed.content).ok_or(ApiError::EmptyResponse)?;
        if parsed.stop_reason.as_deref() == Some("max_tokens") {
            warn!(
                model = %request.model,
                max_tokens = request.max_tokens,
                "response stopped at the max token limit"
            );
        }
        debug!(
            model = %request.model,
            response_len = content.len(),
            stop_reason = ?parsed.stop_reason,
            "received messages response"
        );

        Ok(ModelGatewayResponse {
            content,
            stop_reason: parsed.stop_reason,
        })
    }
}

impl ModelGateway for AnthropicGateway<'_> {
    fn submit<'b>(&'b self, request: ModelGatewayRequest) -> ModelGatewayFuture<'b> {
        Box::pin(self.send(request))
    }
}

fn default_headers(cfg: &Config) -> anyhow::Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        "x-api-key",
        HeaderValue::from_str(&cfg.api_key)
            .map_err(|_| anyhow::anyhow!("ANTHROPIC_API_KEY contains invalid header characters"))?,
    );
    headers.insert("anthropic-version", HeaderValue::from_str(&cfg.api_version)?);
    Ok(headers)
}
