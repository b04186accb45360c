//! Resolved server list: validated specs with their effective enabled flag.

use super::{ConfigSnapshot, ProjectScope, ServerConfigDomainError, ServerId, ServerSpec, StoreKind};

/// A validated server specification and whether it is enabled in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedServer {
    spec: ServerSpec,
    enabled: bool,
}

impl ResolvedServer {
    /// Creates a resolved entry.
    #[must_use]
    pub const fn new(spec: ServerSpec, enabled: bool) -> Self {
        Self { spec, enabled }
    }

    /// Returns the server specification.
    #[must_use]
    pub const fn spec(&self) -> &ServerSpec {
        &self.spec
    }

    /// Returns the server identifier.
    #[must_use]
    pub const fn id(&self) -> &ServerId {
        self.spec.id()
    }

    /// Returns whether the server is enabled in the resolved scope.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Consumes the entry, returning its specification.
    #[must_use]
    pub fn into_spec(self) -> ServerSpec {
        self.spec
    }
}

/// A stored entry that failed validation and was left out of the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    id: String,
    error: ServerConfigDomainError,
}

impl RejectedEntry {
    /// Creates a rejection record.
    #[must_use]
    pub fn new(id: impl Into<String>, error: ServerConfigDomainError) -> Self {
        Self {
            id: id.into(),
            error,
        }
    }

    /// Returns the raw identifier of the rejected entry.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the validation failure.
    #[must_use]
    pub const fn error(&self) -> &ServerConfigDomainError {
        &self.error
    }
}

/// Canonical list of configured servers for one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedServerList {
    source: StoreKind,
    servers: Vec<ResolvedServer>,
    rejected: Vec<RejectedEntry>,
}

impl ResolvedServerList {
    /// Resolves a configuration view for an optional project scope.
    ///
    /// A server is enabled exactly when its id is in neither the global
    /// disable set nor the disable set of `scope`. Entries that fail
    /// validation are collected in [`Self::rejected`] instead of failing the
    /// whole resolution.
    #[must_use]
    pub fn resolve(snapshot: &ConfigSnapshot, scope: Option<&ProjectScope>) -> Self {
        let project_path = scope.map(ProjectScope::as_str);
        let mut servers = Vec::with_capacity(snapshot.servers().len());
        let mut rejected = Vec::new();

        for stored in snapshot.servers() {
            let parsed = ServerId::new(stored.id()).and_then(|id| {
                ServerSpec::from_fields(id, stored.display_name(), stored.fields())
            });
            match parsed {
                Ok(spec) => {
                    let enabled = !snapshot.is_disabled(spec.id().as_str(), project_path);
                    servers.push(ResolvedServer::new(spec, enabled));
                }
                Err(error) => rejected.push(RejectedEntry::new(stored.id(), error)),
            }
        }

        Self {
            source: snapshot.source(),
            servers,
            rejected,
        }
    }

    /// Returns the store the list was resolved from.
    #[must_use]
    pub const fn source(&self) -> StoreKind {
        self.source
    }

    /// Returns resolved servers in store order.
    #[must_use]
    pub fn servers(&self) -> &[ResolvedServer] {
        &self.servers
    }

    /// Returns entries dropped by validation.
    #[must_use]
    pub fn rejected(&self) -> &[RejectedEntry] {
        &self.rejected
    }

    /// Finds a resolved server by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&ResolvedServer> {
        self.servers.iter().find(|server| server.id().as_str() == id)
    }

    /// Returns an iterator over enabled servers.
    pub fn enabled(&self) -> impl Iterator<Item = &ResolvedServer> {
        self.servers.iter().filter(|server| server.enabled())
    }

    /// Consumes the list, returning the enabled server specs.
    #[must_use]
    pub fn into_enabled_specs(self) -> Vec<ServerSpec> {
        self.servers
            .into_iter()
            .filter(ResolvedServer::enabled)
            .map(ResolvedServer::into_spec)
            .collect()
    }
}
