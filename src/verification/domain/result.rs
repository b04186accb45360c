//! Per-server verification result reported to the host.

use super::{ProbeOutcome, VerificationStatus};
use crate::server_config::domain::ServerSpec;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Outcome of verifying one configured server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    server_id: String,
    name: String,
    status: VerificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    server_info: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    checked_at: DateTime<Utc>,
}

impl VerificationResult {
    /// Attributes a probe outcome to the probed server.
    #[must_use]
    pub fn new(spec: &ServerSpec, outcome: ProbeOutcome, checked_at: DateTime<Utc>) -> Self {
        let (status, server_info, error) = outcome.into_parts();
        Self {
            server_id: spec.id().as_str().to_owned(),
            name: spec.display_name().to_owned(),
            status,
            server_info,
            error,
            checked_at,
        }
    }

    /// Returns the server identifier.
    #[must_use]
    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// Returns the server display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the terminal status.
    #[must_use]
    pub const fn status(&self) -> VerificationStatus {
        self.status
    }

    /// Returns the reported `serverInfo` payload.
    #[must_use]
    pub const fn server_info(&self) -> Option<&Value> {
        self.server_info.as_ref()
    }

    /// Returns the diagnostic message, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns when the probe finished.
    #[must_use]
    pub const fn checked_at(&self) -> DateTime<Utc> {
        self.checked_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server_config::domain::{ServerId, ServerTransport};
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn serializes_in_camel_case_without_empty_fields() {
        let spec = ServerSpec::new(
            ServerId::new("fs").expect("valid id"),
            ServerTransport::stdio("node"),
        )
        .with_display_name("Files");
        let checked_at = Utc
            .with_ymd_and_hms(2026, 1, 2, 3, 4, 5)
            .single()
            .expect("valid timestamp");

        let result = VerificationResult::new(
            &spec,
            ProbeOutcome::connected(Some(json!({"name": "fs-server"}))),
            checked_at,
        );

        assert_eq!(
            serde_json::to_value(&result).expect("serializes"),
            json!({
                "serverId": "fs",
                "name": "Files",
                "status": "connected",
                "serverInfo": {"name": "fs-server"},
                "checkedAt": "2026-01-02T03:04:05Z"
            })
        );
    }
}
