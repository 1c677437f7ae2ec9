use serde::Deserialize;
use std::error::Error as StdError;
use std::io::ErrorKind;

use crate::model_gateway::ApiError;

fn error_chain_has_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == ErrorKind::ConnectionRefused
        {
            return true;
        }

        if source
            .to_string()
            .to_ascii_lowercase()
            .contains("connection refused")
        {
            return true;
        }

        current = source.source();
    }

    false
}

fn error_chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == ErrorKind::TimedOut
        {
            return true;
        }

        if source
            .to_string()
            .to_ascii_lowercase()
            .contains("timed out")
        {
            return true;
        }

        current = source.source();
    }

    false
}

/// Maps a transport-level failure (nothing came back) to an [`ApiError`].
pub(crate) fn model_api_request_error(
    err: reqwest::Error,
    api_url: &str,
    timeout_secs: u64,
) -> ApiError {
    if err.is_timeout() || error_chain_has_timeout(&err) {
        return ApiError::Timeout {
            url: api_url.to_string(),
            timeout_secs,
        };
    }

    if err.is_connect() {
        if error_chain_has_connection_refused(&err) {
            return ApiError::Connection {
                message: format!(
                    "Connection refused by model API at '{api_url}'. \
                     Check ANTHROPIC_BASE_URL and network connectivity."
                ),
            };
        }

        return ApiError::Connection {
            message: format!(
                "Failed to connect to model API at '{api_url}'. \
                 Check ANTHROPIC_BASE_URL and network connectivity."
            ),
        };
    }

    ApiError::Connection {
        message: format!("Failed to call model API at '{api_url}': {err}"),
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: Option<String>,
}

/// Maps a non-success HTTP response to an [`ApiError`], keeping the vendor's
/// own message when the body is the usual `{"error": {...}}` envelope.
pub(crate) fn model_api_status_error(
    status: u16,
    retry_after_secs: Option<u64>,
    body: &str,
    model: &str,
) -> ApiError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error);
    let error_type = detail
        .as_ref()
        .and_then(|detail| detail.error_type.clone())
        .unwrap_or_default();
    let message = detail
        .and_then(|detail| detail.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "<empty response body>".to_string()
            } else {
                trimmed.to_string()
            }
        });

    match status {
        401 => ApiError::Authentication { message },
        403 => ApiError::PermissionDenied { message },
        404 => ApiError::InvalidModel {
            model: model.to_string(),
            message,
        },
        400 if mentions_model(&message) => ApiError::InvalidModel {
            model: model.to_string(),
            message,
        },
        400 => ApiError::BadRequest { message },
        429 => ApiError::RateLimited {
            message,
            retry_after_secs,
        },
        503 | 529 => ApiError::Overloaded { message },
        _ if error_type == "overloaded_error" => ApiError::Overloaded { message },
        _ => ApiError::Status { status, message },
    }
}

fn mentions_model(message: &str) -> bool {
    message.to_ascii_lowercase().contains("model")
}

#[cfg(test)]
mod tests {
    use super::{error_chain_has_timeout, model_api_request_error, model_api_status_error};
    use crate::model_gateway::ApiError;
    use reqwest::Client;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    fn free_local_addr() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        drop(listener);
        addr
    }

    #[tokio::test]
    async fn maps_connection_refused_errors_to_connection_error() {
        let addr = free_local_addr();
        let api_url = format!("http://{}/v1/messages", addr);
        let client = Client::builder()
            .timeout(Duration::from_millis(300))
            .build()
            .expect("client should build");

        let req_err = client
            .post(&api_url)
            .send()
            .await
            .expect_err("request should fail with connection-refused");
        let mapped = model_api_request_error(req_err, &api_url, 1);
        let msg = mapped.to_string();

        assert_eq!(mapped.kind(), "connection", "unexpected error: {msg}");
        assert!(
            msg.contains("ANTHROPIC_BASE_URL"),
            "unexpected message: {msg}"
        );
    }

    #[tokio::test]
    async fn maps_timeout_errors_to_timeout_error() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        let server = thread::spawn(move || {
            let (_stream, _) = listener.accept().expect("accept should succeed");
            thread::sleep(Duration::from_secs(1));
        });

        let api_url = format!("http://{}/v1/messages", addr);
        let client = Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("client should build");

        let req_err = client
            .post(&api_url)
            .send()
            .await
            .expect_err("request should fail with timeout");
        let mapped = model_api_request_error(req_err, &api_url, 2);

        assert_eq!(
            mapped,
            ApiError::Timeout {
                url: api_url.clone(),
                timeout_secs: 2,
            }
        );
        assert!(mapped.to_string().contains("MODEL_TIMEOUT_SECS"));

        server.join().expect("server thread should join");
    }

    #[test]
    fn detects_timeout_from_error_kind() {
        let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        assert!(error_chain_has_timeout(&err));
    }

    #[test]
    fn unauthorized_status_maps_to_authentication_with_vendor_message() {
        let body = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        let err = model_api_status_error(401, None, body, "claude-test");
        assert_eq!(
            err,
            ApiError::Authentication {
                message: "invalid x-api-key".to_string()
            }
        );
    }

    #[test]
    fn not_found_and_model_bad_requests_map_to_invalid_model() {
        let body = r#"{"type":"error","error":{"type":"not_found_error","message":"model: nope"}}"#;
        assert_eq!(
            model_api_status_error(404, None, body, "nope").kind(),
            "invalid_model"
        );

        let body = r#"{"error":{"type":"invalid_request_error","message":"model 'x' is not supported"}}"#;
        assert_eq!(
            model_api_status_error(400, None, body, "x").kind(),
            "invalid_model"
        );

        let body = r#"{"error":{"type":"invalid_request_error","message":"max_tokens too large"}}"#;
        assert_eq!(
            model_api_status_error(400, None, body, "x").kind(),
            "bad_request"
        );
    }

    #[test]
    fn rate_limit_keeps_retry_after() {
        let err = model_api_status_error(429, Some(12), "{}", "m");
        assert_eq!(
            err,
            ApiError::RateLimited {
                message: "{}".to_string(),
                retry_after_secs: Some(12),
            }
        );
    }

    #[test]
    fn overloaded_and_unknown_statuses_are_classified() {
        assert_eq!(model_api_status_error(529, None, "", "m").kind(), "overloaded");
        let err = model_api_status_error(500, None, "boom", "m");
        assert_eq!(
            err,
            ApiError::Status {
                status: 500,
                message: "boom".to_string()
            }
        );
        let err = model_api_status_error(502, None, "  ", "m");
        assert!(err.to_string().contains("<empty response body>"));
    }
}
