//! Failures a probe can run into, each mapped to a terminal status.

use super::VerificationStatus;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Reasons a probe did not complete the handshake.
///
/// Probe errors never propagate past a probe; they are rendered into
/// [`super::ProbeOutcome`] instead.
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    /// The `stdio` transport has an empty command.
    #[error("No command specified")]
    MissingCommand,

    /// The process could not be started.
    #[error("failed to start '{command}': {cause}")]
    Spawn {
        /// Command that was attempted.
        command: String,
        /// Underlying spawn failure.
        cause: Arc<std::io::Error>,
    },

    /// No conclusive answer arrived within the budget.
    #[error("No response within {}ms", .budget.as_millis())]
    Timeout {
        /// Budget that elapsed.
        budget: Duration,
    },

    /// The endpoint answered with a non-success HTTP status.
    #[error("HTTP {code}: {reason}")]
    HttpStatus {
        /// Numeric status code.
        code: u16,
        /// Canonical reason phrase.
        reason: String,
    },

    /// The server answered with a JSON-RPC error.
    #[error("{0}")]
    Server(String),

    /// A configured header cannot be sent.
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader {
        /// Header name as configured.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Network or stream failure, with the full cause chain.
    #[error("transport error: {0}")]
    Transport(String),

    /// The process exited unsuccessfully without answering.
    #[error("process exited without answering ({0})")]
    ProcessExited(ExitStatus),

    /// The process exited cleanly without producing anything recognizable.
    #[error("process exited without an MCP response")]
    Silent,

    /// The response was neither JSON-RPC nor recognizably MCP.
    #[error("unrecognized response: {excerpt}")]
    Protocol {
        /// Leading part of the response body.
        excerpt: String,
    },
}

impl ProbeError {
    /// Wraps a spawn failure.
    pub fn spawn(command: impl Into<String>, cause: std::io::Error) -> Self {
        Self::Spawn {
            command: command.into(),
            cause: Arc::new(cause),
        }
    }

    /// Renders a transport failure together with its chain of causes.
    pub fn transport(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            let detail = cause.to_string();
            if !message.contains(&detail) {
                message.push_str(": ");
                message.push_str(&detail);
            }
            source = cause.source();
        }
        Self::Transport(message)
    }

    /// Returns the terminal status this error maps to.
    #[must_use]
    pub const fn status(&self) -> VerificationStatus {
        match self {
            Self::Timeout { .. } => VerificationStatus::Pending,
            Self::Silent => VerificationStatus::Unknown,
            _ => VerificationStatus::Failed,
        }
    }
}
