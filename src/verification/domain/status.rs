//! Terminal verification status and the outcome of a single probe.

use super::ProbeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Terminal status of one verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// The server answered the `initialize` handshake.
    Connected,
    /// The server could not be started or reached, or refused the handshake.
    Failed,
    /// The probe exhausted its time budget without a conclusive answer.
    Pending,
    /// The process exited cleanly without producing anything recognizable.
    Unknown,
}

impl VerificationStatus {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Failed => "failed",
            Self::Pending => "pending",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Result of one probe before it is attributed to a server.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    status: VerificationStatus,
    server_info: Option<Value>,
    error: Option<String>,
}

impl ProbeOutcome {
    /// A completed handshake, with the server's `serverInfo` when present.
    #[must_use]
    pub const fn connected(server_info: Option<Value>) -> Self {
        Self {
            status: VerificationStatus::Connected,
            server_info,
            error: None,
        }
    }

    /// A failed probe with a diagnostic message.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: VerificationStatus::Failed,
            server_info: None,
            error: Some(error.into()),
        }
    }

    /// Converts a probe attempt into an outcome.
    ///
    /// Errors are folded into the outcome so they never escape a probe.
    #[must_use]
    pub fn from_attempt(attempt: Result<Option<Value>, ProbeError>) -> Self {
        match attempt {
            Ok(server_info) => Self::connected(server_info),
            Err(error) => Self::from(error),
        }
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

    pub(crate) fn into_parts(self) -> (VerificationStatus, Option<Value>, Option<String>) {
        (self.status, self.server_info, self.error)
    }
}

impl From<ProbeError> for ProbeOutcome {
    fn from(error: ProbeError) -> Self {
        Self {
            status: error.status(),
            server_info: None,
            error: Some(error.to_string()),
        }
    }
}
