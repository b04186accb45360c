//! Probe for servers reachable over HTTP or SSE.

use super::ProbeInitError;
use crate::server_config::domain::HttpTransport;
use crate::verification::domain::{
    InitializeRequest, ProbeBudget, ProbeError, ProbeOutcome, ProbeSettings, classify_http_body,
    sse_verdict,
};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tokio::time::timeout;
use tracing::debug;

/// Runs the `initialize` handshake as a single POST request.
///
/// Configured headers are applied over the defaults. The body is read
/// chunk by chunk up to the output cap, and reading stops as soon as a
/// server-sent event carries a complete answer.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    body: String,
    max_output_bytes: usize,
    max_body_excerpt: usize,
}

impl HttpProbe {
    /// Creates a probe from settings.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeInitError`] when the HTTP client cannot be built or the
    /// request cannot be encoded.
    pub fn new(settings: &ProbeSettings) -> Result<Self, ProbeInitError> {
        let client = reqwest::Client::builder()
            .user_agent(format!("{}/{}", settings.client_name, settings.client_version))
            .build()
            .map_err(ProbeInitError::client)?;
        let body = InitializeRequest::from_settings(settings)
            .to_body()
            .map_err(ProbeInitError::encode)?;
        Ok(Self {
            client,
            body,
            max_output_bytes: settings.max_output_bytes,
            max_body_excerpt: settings.max_body_excerpt,
        })
    }

    /// Probes one remote server within `budget`.
    pub async fn probe(&self, transport: &HttpTransport, budget: ProbeBudget) -> ProbeOutcome {
        let attempt = timeout(budget.timeout, self.exchange(transport))
            .await
            .unwrap_or_else(|_| {
                Err(ProbeError::Timeout {
                    budget: budget.timeout,
                })
            });
        ProbeOutcome::from_attempt(attempt)
    }

    async fn exchange(&self, transport: &HttpTransport) -> Result<Option<Value>, ProbeError> {
        let mut response = self
            .client
            .post(transport.url().clone())
            .headers(request_headers(transport)?)
            .body(self.body.clone())
            .send()
            .await
            .map_err(|err| ProbeError::transport(&err))?;

        let status = response.status();
        debug!(url = %transport.url(), %status, "probe endpoint answered");
        if !status.is_success() {
            return Err(ProbeError::HttpStatus {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_owned(),
            });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|err| ProbeError::transport(&err))?
        {
            let room = self.max_output_bytes.saturating_sub(body.len());
            body.extend_from_slice(chunk.get(..room.min(chunk.len())).unwrap_or_default());
            if let Some(verdict) = sse_verdict(&String::from_utf8_lossy(&body)) {
                return verdict;
            }
            if body.len() >= self.max_output_bytes {
                debug!(url = %transport.url(), "probe response body truncated");
                break;
            }
        }
        classify_http_body(&String::from_utf8_lossy(&body), self.max_body_excerpt)
    }
}

fn request_headers(transport: &HttpTransport) -> Result<HeaderMap, ProbeError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/event-stream"),
    );
    for (name, value) in transport.headers() {
        let invalid = |reason: String| ProbeError::InvalidHeader {
            name: name.clone(),
            reason,
        };
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|err| invalid(err.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|err| invalid(err.to_string()))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}
