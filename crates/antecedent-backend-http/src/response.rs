//! Mapping of HTTP responses and transport failures onto [`BackendError`].

use std::error::Error as StdError;
use std::time::Duration;

use antecedent_backend::{BackendError, StatusReason};
use reqwest::header::RETRY_AFTER;
use serde::Deserialize;
use serde_json::Value;

/// The subset of the API server's `Status` object we inspect.
#[derive(Debug, Default, Deserialize)]
struct Status {
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<StatusDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusDetails {
    #[serde(default)]
    retry_after_seconds: Option<u64>,
}

pub(crate) async fn decode_response(resp: reqwest::Response) -> Result<Value, BackendError> {
    let status = resp.status();
    let retry_after = resp
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);
    let body = resp.text().await.map_err(map_transport_error)?;

    if !status.is_success() {
        return Err(status_error(status.as_u16(), &body, retry_after));
    }

    serde_json::from_str(&body)
        .map_err(|e| BackendError::invalid_response(format!("failed to parse response JSON: {e}")))
}

/// Builds an API error from a failure status and its body.
///
/// The `Status` body wins over the bare status code; `retryAfterSeconds`
/// wins over the `Retry-After` header.
pub(crate) fn status_error(code: u16, body: &str, header_retry: Option<Duration>) -> BackendError {
    let parsed: Status = serde_json::from_str(body).unwrap_or_default();

    let reason = parsed
        .reason
        .as_deref()
        .filter(|r| !r.is_empty())
        .map(StatusReason::from_reason)
        .filter(|r| *r != StatusReason::Unknown)
        .unwrap_or_else(|| StatusReason::from_status_code(code));
    let message = parsed
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {code}")
            } else {
                body.trim().to_string()
            }
        });
    let retry_after = parsed
        .details
        .and_then(|d| d.retry_after_seconds)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .or(header_retry);

    let err = BackendError::api(code, reason, message);
    match retry_after {
        Some(delay) => err.with_retry_after(delay),
        None => err,
    }
}

pub(crate) fn map_transport_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::timeout(err.to_string());
    }
    if is_connection_reset(&err) {
        return BackendError::connection_reset(err.to_string());
    }
    BackendError::transport(err.to_string())
}

fn is_connection_reset(err: &(dyn StdError + 'static)) -> bool {
    let mut source = Some(err);
    while let Some(current) = source {
        if let Some(io) = current.downcast_ref::<std::io::Error>()
            && io.kind() == std::io::ErrorKind::ConnectionReset
        {
            return true;
        }
        source = current.source();
    }
    false
}
