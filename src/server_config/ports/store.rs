//! Config store port: uniform read/write access to persisted server
//! configuration.

use crate::server_config::domain::{
    ConfigSnapshot, ProjectScope, ServerConfigDomainError, ServerId, ServerSpec, StoreKind,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for config store operations.
pub type ConfigStoreResult<T> = Result<T, ConfigStoreError>;

/// Persistence contract for MCP server configuration.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Loads the current configuration view.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError::Read`] when the store actually consulted
    /// holds malformed JSON. A missing store is an empty view, not an error.
    async fn load(&self) -> ConfigStoreResult<ConfigSnapshot>;

    /// Creates or updates a server and records its enabled state.
    ///
    /// Without `scope` only the global disable list is touched; with `scope`
    /// only that project's list is. Returns the store that was written.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError::Read`] when the owning store cannot be
    /// read and [`ConfigStoreError::Write`] when persisting fails.
    async fn upsert(
        &self,
        spec: &ServerSpec,
        enabled: bool,
        scope: Option<&ProjectScope>,
    ) -> ConfigStoreResult<StoreKind>;

    /// Removes a server and scrubs its id from every disable list.
    ///
    /// Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError::Read`] or [`ConfigStoreError::Write`] when
    /// the owning store cannot be read or persisted.
    async fn delete(&self, id: &ServerId) -> ConfigStoreResult<bool>;
}

/// Errors returned by config store implementations.
#[derive(Debug, Clone, Error)]
pub enum ConfigStoreError {
    /// The consulted store exists but could not be read or parsed.
    #[error("failed to read MCP configuration from {location}: {cause}")]
    Read {
        /// Store location.
        location: String,
        /// Underlying failure.
        cause: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// Persisting to the chosen store failed.
    #[error("failed to write MCP configuration to {location}: {cause}")]
    Write {
        /// Store location.
        location: String,
        /// Underlying failure.
        cause: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// No home directory is available to locate the default stores.
    #[error("unable to resolve the home directory for MCP configuration")]
    HomeDirectory,

    /// The request was rejected before touching the store.
    #[error(transparent)]
    Validation(#[from] ServerConfigDomainError),
}

impl ConfigStoreError {
    /// Wraps a read or parse failure.
    pub fn read(
        location: impl Into<String>,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Read {
            location: location.into(),
            cause: Arc::new(err),
        }
    }

    /// Wraps a persistence failure.
    pub fn write(
        location: impl Into<String>,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Write {
            location: location.into(),
            cause: Arc::new(err),
        }
    }
}
