//! Identifier and scope-key types for MCP server configuration.

use super::ServerConfigDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Keys that would shadow object-model members when a project path is used as
/// a mapping key by a scripting host.
const RESERVED_SCOPE_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Identifier of a configured MCP server, unique within one config store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(String);

impl ServerId {
    /// Creates a validated server identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ServerConfigDomainError::EmptyServerId`] when `value` is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ServerConfigDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(ServerConfigDomainError::EmptyServerId);
        }
        Ok(Self(normalized))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ServerId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Project path used as the key of a project-scoped disable list.
///
/// The path is opaque and untrusted: it is never touched on disk, only used
/// as a mapping key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectScope(String);

impl ProjectScope {
    /// Creates a validated project scope key.
    ///
    /// # Errors
    ///
    /// Returns [`ServerConfigDomainError::EmptyProjectPath`] for blank input
    /// and [`ServerConfigDomainError::ReservedScopeKey`] for `__proto__`,
    /// `constructor`, and `prototype`.
    pub fn new(value: impl Into<String>) -> Result<Self, ServerConfigDomainError> {
        let path = value.into();
        if path.trim().is_empty() {
            return Err(ServerConfigDomainError::EmptyProjectPath);
        }
        if RESERVED_SCOPE_KEYS.contains(&path.as_str()) {
            return Err(ServerConfigDomainError::ReservedScopeKey(path));
        }
        Ok(Self(path))
    }

    /// Returns the project path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ProjectScope {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ProjectScope {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
