//! Service layer resolving configured servers and their enabled state.

use crate::server_config::{
    domain::{
        ProjectScope, ResolvedServerList, ServerConfigDomainError, ServerId, ServerSpec,
        StoreKind, validate_entry,
    },
    ports::{ConfigStore, ConfigStoreError},
};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Service-level errors for configuration operations.
#[derive(Debug, Clone, Error)]
pub enum ServerConfigServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ServerConfigDomainError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] ConfigStoreError),
}

/// Result type for configuration service operations.
pub type ServerConfigServiceResult<T> = Result<T, ServerConfigServiceError>;

/// Resolves, saves, and removes MCP server configuration.
#[derive(Debug)]
pub struct ServerConfigService<S>
where
    S: ConfigStore,
{
    store: Arc<S>,
}

impl<S: ConfigStore> Clone for ServerConfigService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> ServerConfigService<S>
where
    S: ConfigStore,
{
    /// Creates a service over the given store.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Lists every configured server with its effective enabled flag.
    ///
    /// With `project_path`, servers disabled for that project are reported
    /// disabled in addition to globally disabled ones. Entries that fail
    /// validation are left out of the servers and reported as rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ServerConfigServiceError::Domain`] for an invalid project
    /// path and [`ServerConfigServiceError::Store`] when the consulted store
    /// is malformed.
    pub async fn list_resolved(
        &self,
        project_path: Option<&str>,
    ) -> ServerConfigServiceResult<ResolvedServerList> {
        let scope = project_path.map(ProjectScope::new).transpose()?;
        let snapshot = self.store.load().await?;
        let resolved = ResolvedServerList::resolve(&snapshot, scope.as_ref());

        for rejected in resolved.rejected() {
            warn!(
                server_id = rejected.id(),
                error = %rejected.error(),
                "dropping invalid MCP server entry"
            );
        }
        info!(
            source = %resolved.source(),
            servers = resolved.servers().len(),
            enabled = resolved.enabled().count(),
            project_path,
            "resolved MCP servers"
        );
        Ok(resolved)
    }

    /// Creates or updates a server.
    ///
    /// Without `project_path` the enabled flag is recorded globally; with it,
    /// only for that project. Returns the store that was written.
    ///
    /// # Errors
    ///
    /// Returns [`ServerConfigServiceError::Domain`] for an invalid project
    /// path and [`ServerConfigServiceError::Store`] when reading or writing
    /// the store fails.
    pub async fn upsert(
        &self,
        spec: &ServerSpec,
        enabled: bool,
        project_path: Option<&str>,
    ) -> ServerConfigServiceResult<StoreKind> {
        let scope = project_path.map(ProjectScope::new).transpose()?;
        Ok(self.store.upsert(spec, enabled, scope.as_ref()).await?)
    }

    /// Removes a server from every scope.
    ///
    /// Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns [`ServerConfigServiceError::Domain`] for a blank id and
    /// [`ServerConfigServiceError::Store`] when reading or writing the store
    /// fails.
    pub async fn delete(&self, server_id: &str) -> ServerConfigServiceResult<bool> {
        let id = ServerId::new(server_id)?;
        Ok(self.store.delete(&id).await?)
    }

    /// Validates a server entry submitted by the host, returning every
    /// problem found.
    #[must_use]
    pub fn validate_entry(entry: &Value) -> Vec<ServerConfigDomainError> {
        validate_entry(entry)
    }
}
