//! Whole-entry validation for server definitions submitted by the host UI.

use super::{HttpKind, HttpTransport, ServerConfigDomainError};
use serde_json::Value;

/// Validates a submitted server entry and returns every problem found.
///
/// The entry has the shape edited by the host settings panel: a `name`, and
/// the transport under a nested `server` object whose `type` defaults to
/// `stdio`. An empty result means the entry is valid.
#[must_use]
pub fn validate_entry(entry: &Value) -> Vec<ServerConfigDomainError> {
    let mut errors = Vec::new();

    let has_name = entry
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|name| !name.trim().is_empty());
    if !has_name {
        errors.push(ServerConfigDomainError::EmptyServerName);
    }

    let Some(server) = entry.get("server").and_then(Value::as_object) else {
        errors.push(ServerConfigDomainError::MissingTransport);
        return errors;
    };

    let declared_type = server
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("stdio")
        .trim()
        .to_ascii_lowercase();
    let text_field = |field: &str| {
        server
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    match declared_type.as_str() {
        "stdio" => {
            if text_field("command").is_none() {
                errors.push(ServerConfigDomainError::MissingCommand);
            }
        }
        "http" | "sse" => match text_field("url") {
            None => errors.push(ServerConfigDomainError::MissingUrl),
            Some(url) => {
                if let Err(error) = HttpTransport::new(url, HttpKind::Auto) {
                    errors.push(error);
                }
            }
        },
        other => errors.push(ServerConfigDomainError::UnsupportedTransportType(
            other.to_owned(),
        )),
    }

    errors
}
