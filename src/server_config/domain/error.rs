//! Error types for MCP server configuration validation.

use thiserror::Error;

/// Errors returned while constructing or validating server configuration
/// values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServerConfigDomainError {
    /// The server identifier is empty after trimming.
    #[error("MCP server id must not be empty")]
    EmptyServerId,

    /// The server display name is empty after trimming.
    #[error("MCP server name must not be empty")]
    EmptyServerName,

    /// The project path is empty after trimming.
    #[error("project path must not be empty")]
    EmptyProjectPath,

    /// The project path collides with an object-model key.
    #[error("project path '{0}' is not allowed as a scope key")]
    ReservedScopeKey(String),

    /// The entry declares neither a `command` nor a `url`.
    #[error("MCP server declares neither a command nor a url")]
    MissingEndpoint,

    /// A `stdio` entry has no command.
    #[error("stdio MCP server requires a command")]
    MissingCommand,

    /// An `http` or `sse` entry has no URL.
    #[error("http MCP server requires a url")]
    MissingUrl,

    /// The URL does not parse as an absolute `http://` or `https://` URI.
    #[error("invalid MCP server url '{url}': {reason}")]
    InvalidUrl {
        /// URL as written in the configuration.
        url: String,
        /// Parser or scheme diagnostic.
        reason: String,
    },

    /// The declared transport `type` is not one of `stdio`, `http`, or `sse`.
    #[error("unsupported MCP transport type: {0}")]
    UnsupportedTransportType(String),

    /// A transport field carries a value of the wrong JSON type.
    #[error("MCP server field '{field}' must be {expected}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Human-readable description of the expected shape.
        expected: &'static str,
    },

    /// The entry is missing its transport details entirely.
    #[error("MCP server entry has no transport configuration")]
    MissingTransport,
}
