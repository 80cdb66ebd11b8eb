//! Shared HTTP client construction and response classification
//!
//! Every outbound client goes through [`build_client`]: a per-request timeout
//! plus exponential-backoff retries on connection errors, 408, 429 and 5xx.
//! Whatever is left after retries is classified by [`check_status`].

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::RetryTransientMiddleware;
use reqwest_retry::policies::ExponentialBackoff;
use tracing::{debug, warn};

use crate::{AssistantError, ErrorCode, Result};

pub const USER_AGENT: &str = concat!("TravelAssist/", env!("CARGO_PKG_VERSION"));

const BODY_SNIPPET_LEN: usize = 300;

/// Build a retrying HTTP client
pub fn build_client(timeout: Duration, max_retries: u32) -> Result<ClientWithMiddleware> {
    build_client_with_backoff(
        timeout,
        max_retries,
        Duration::from_millis(500),
        Duration::from_secs(10),
    )
}

/// Build a retrying HTTP client with explicit backoff bounds
pub fn build_client_with_backoff(
    timeout: Duration,
    max_retries: u32,
    min_backoff: Duration,
    max_backoff: Duration,
) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| AssistantError::config(format!("Failed to create HTTP client: {e}")))?;

    let policy = ExponentialBackoff::builder()
        .retry_bounds(min_backoff, max_backoff)
        .build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(policy))
        .build())
}

/// Map a transport failure (after retries) to an API error
pub fn network_error(service: &str, err: &reqwest_middleware::Error) -> AssistantError {
    warn!("{service} request failed: {err}");
    AssistantError::api_with_context(
        format!("{service} request failed: {err}"),
        ErrorCode::ApiNetworkError,
        HashMap::from([("service".to_string(), service.to_string())]),
    )
}

fn code_for_status(status: StatusCode) -> ErrorCode {
    match status.as_u16() {
        401 | 403 => ErrorCode::ApiUnauthorized,
        404 => ErrorCode::ApiNotFound,
        429 => ErrorCode::ApiRateLimit,
        500..=599 => ErrorCode::ApiServerError,
        _ => ErrorCode::ApiInvalidResponse,
    }
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

/// Pass successful responses through, turn everything else into an error
pub async fn check_status(response: Response, service: &str) -> Result<Response> {
    let status = response.status();
    debug!("{service} responded with {status}");
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();

    let mut context = HashMap::from([
        ("service".to_string(), service.to_string()),
        ("status_code".to_string(), status.as_u16().to_string()),
    ]);
    if !body.trim().is_empty() {
        context.insert("body".to_string(), snippet(&body));
    }
    if let Some(retry_after) = retry_after {
        context.insert("retry_after".to_string(), retry_after);
    }

    let code = code_for_status(status);
    warn!("{service} request failed with {status} ({code})");
    Err(AssistantError::api_with_context(
        format!(
            "{service} request failed with status: {} - {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown error")
        ),
        code,
        context,
    ))
}
