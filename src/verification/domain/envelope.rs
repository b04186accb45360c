//! JSON-RPC envelopes exchanged during the `initialize` handshake.
//!
//! Responses are decoded strictly first. When strict decoding fails the
//! text is searched for a `serverInfo` object or a bare JSON-RPC marker,
//! which keeps servers that wrap or decorate their output recognizable.

use super::{ProbeError, ProbeSettings};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const MARKERS: [&str; 2] = ["\"jsonrpc\"", "\"result\""];
const SERVER_INFO_KEY: &str = "\"serverInfo\"";

/// The one request a probe sends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitializeRequest {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: InitializeParams,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeParams {
    protocol_version: String,
    capabilities: Map<String, Value>,
    client_info: ClientInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ClientInfo {
    name: String,
    version: String,
}

impl InitializeRequest {
    /// Builds the request advertising the configured client identity.
    #[must_use]
    pub fn from_settings(settings: &ProbeSettings) -> Self {
        Self {
            jsonrpc: "2.0",
            id: 1,
            method: "initialize",
            params: InitializeParams {
                protocol_version: settings.protocol_version.clone(),
                capabilities: Map::new(),
                client_info: ClientInfo {
                    name: settings.client_name.clone(),
                    version: settings.client_version.clone(),
                },
            },
        }
    }

    /// Encodes the request as a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if encoding fails.
    pub fn to_body(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Encodes the request as one newline-terminated line.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if encoding fails.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        self.to_body().map(|body| body + "\n")
    }
}

/// A decoded JSON-RPC response with every field optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JsonRpcEnvelope {
    #[serde(default)]
    jsonrpc: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl JsonRpcEnvelope {
    /// Strictly decodes one JSON object; anything else yields `None`.
    #[must_use]
    pub fn decode(text: &str) -> Option<Self> {
        match serde_json::from_str::<Value>(text.trim()).ok()? {
            object @ Value::Object(_) => serde_json::from_value(object).ok(),
            _ => None,
        }
    }

    /// Returns `result.serverInfo` when present.
    #[must_use]
    pub fn server_info(&self) -> Option<&Value> {
        self.result
            .as_ref()
            .and_then(|result| result.get("serverInfo"))
            .filter(|info| !info.is_null())
    }

    /// Returns the message of a top-level `error`.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        let error = self.error.as_ref().filter(|error| !error.is_null())?;
        Some(match error.get("message").and_then(Value::as_str) {
            Some(message) => message.to_owned(),
            None => error
                .as_str()
                .map_or_else(|| error.to_string(), str::to_owned),
        })
    }

    /// Returns whether the object looks like a JSON-RPC response at all.
    #[must_use]
    pub const fn is_rpc_shaped(&self) -> bool {
        self.jsonrpc.is_some() || self.result.is_some() || self.error.is_some()
    }

    /// Interprets the envelope as a handshake answer.
    ///
    /// `None` means the object is not a JSON-RPC response.
    #[must_use]
    pub fn verdict(&self) -> Option<Result<Option<Value>, ProbeError>> {
        if let Some(info) = self.server_info() {
            return Some(Ok(Some(info.clone())));
        }
        if let Some(message) = self.error_message() {
            return Some(Err(ProbeError::Server(message)));
        }
        self.is_rpc_shaped().then_some(Ok(None))
    }
}

/// Returns whether `text` contains a JSON-RPC marker.
#[must_use]
pub fn contains_marker(text: &str) -> bool {
    MARKERS.iter().any(|marker| text.contains(marker))
}

/// Finds the first `serverInfo` object in line-oriented output.
///
/// Lines longer than `max_line_length` characters are skipped. Each line is
/// decoded strictly first; otherwise the object following a `"serverInfo"`
/// key is decoded on its own.
#[must_use]
pub fn scan_server_info(text: &str, max_line_length: usize) -> Option<Value> {
    text.lines()
        .filter(|line| line.chars().nth(max_line_length).is_none())
        .find_map(|line| match JsonRpcEnvelope::decode(line) {
            Some(envelope) => envelope.server_info().cloned(),
            None => embedded_server_info(line),
        })
}

fn embedded_server_info(line: &str) -> Option<Value> {
    let (_, after_key) = line.split_once(SERVER_INFO_KEY)?;
    let value_text = after_key.trim_start().strip_prefix(':')?.trim_start();
    if !value_text.starts_with('{') {
        return None;
    }
    let mut values = serde_json::Deserializer::from_str(value_text).into_iter::<Value>();
    match values.next() {
        Some(Ok(value @ Value::Object(_))) => Some(value),
        _ => None,
    }
}

/// Classifies a successful HTTP response body.
///
/// A single JSON document is interpreted directly, then each server-sent
/// event's `data` payload, then the bare marker check.
///
/// # Errors
///
/// Returns [`ProbeError::Server`] for a JSON-RPC error and
/// [`ProbeError::Protocol`] with a body excerpt when nothing is recognized.
pub fn classify_http_body(body: &str, max_excerpt: usize) -> Result<Option<Value>, ProbeError> {
    if let Some(verdict) = JsonRpcEnvelope::decode(body).and_then(|envelope| envelope.verdict()) {
        return verdict;
    }
    if let Some(verdict) = sse_verdict(body) {
        return verdict;
    }
    if contains_marker(body) {
        return Ok(None);
    }
    Err(ProbeError::Protocol {
        excerpt: excerpt(body.trim(), max_excerpt),
    })
}

/// Interprets the first server-sent event carrying a JSON-RPC response.
#[must_use]
pub fn sse_verdict(body: &str) -> Option<Result<Option<Value>, ProbeError>> {
    sse_data(body)
        .iter()
        .filter_map(|data| JsonRpcEnvelope::decode(data))
        .find_map(|envelope| envelope.verdict())
}

/// Collects the `data` payload of each event in an SSE stream.
fn sse_data(body: &str) -> Vec<String> {
    let mut events = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in body.lines() {
        if let Some(data) = line.strip_prefix("data:") {
            current.push(data.strip_prefix(' ').unwrap_or(data));
        } else if line.trim().is_empty() && !current.is_empty() {
            events.push(current.join("\n"));
            current.clear();
        }
    }
    if !current.is_empty() {
        events.push(current.join("\n"));
    }
    events
}

fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", text.get(..cut).unwrap_or_default()),
        None => text.to_owned(),
    }
}
