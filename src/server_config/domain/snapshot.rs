//! Normalized view over whichever persisted configuration was consulted.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Entry fields that describe the entry itself rather than its transport.
const RESERVED_ENTRY_FIELDS: [&str; 5] = ["id", "name", "enabled", "server", "apps"];

/// Persisted representation that produced a configuration view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    /// Layered map-of-objects file with global and per-project scopes.
    Primary,
    /// Flat array file with per-entry `enabled` flags and no project scopes.
    Secondary,
}

impl StoreKind {
    /// Returns the canonical log representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// One server entry as persisted, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredServer {
    id: String,
    display_name: Option<String>,
    fields: Map<String, Value>,
}

impl StoredServer {
    /// Creates a stored entry from already separated parts.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        display_name: Option<String>,
        fields: Map<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name,
            fields,
        }
    }

    /// Splits a persisted entry object into display name and transport
    /// fields.
    ///
    /// A nested `server` object carries the transport when present; otherwise
    /// every non-reserved field of the entry does.
    #[must_use]
    pub fn from_entry(id: impl Into<String>, entry: &Map<String, Value>) -> Self {
        let display_name = entry
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let fields = match entry.get("server") {
            Some(Value::Object(nested)) => nested.clone(),
            _ => entry
                .iter()
                .filter(|(key, _)| !RESERVED_ENTRY_FIELDS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        };
        Self::new(id, display_name, fields)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the persisted display name, if any.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the transport fields.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Configuration view produced by a config store load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    source: StoreKind,
    servers: Vec<StoredServer>,
    global_disabled: BTreeSet<String>,
    project_disabled: BTreeMap<String, BTreeSet<String>>,
}

impl ConfigSnapshot {
    /// Creates an empty view for the given source.
    #[must_use]
    pub const fn empty(source: StoreKind) -> Self {
        Self {
            source,
            servers: Vec::new(),
            global_disabled: BTreeSet::new(),
            project_disabled: BTreeMap::new(),
        }
    }

    /// Appends a stored server entry.
    #[must_use]
    pub fn with_server(mut self, server: StoredServer) -> Self {
        self.servers.push(server);
        self
    }

    /// Marks an id as disabled at global scope.
    #[must_use]
    pub fn with_global_disabled(mut self, id: impl Into<String>) -> Self {
        self.global_disabled.insert(id.into());
        self
    }

    /// Marks an id as disabled for one project path.
    #[must_use]
    pub fn with_project_disabled(
        mut self,
        project_path: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        self.project_disabled
            .entry(project_path.into())
            .or_default()
            .insert(id.into());
        self
    }

    /// Returns the store that produced this view.
    #[must_use]
    pub const fn source(&self) -> StoreKind {
        self.source
    }

    /// Returns stored entries in store order.
    #[must_use]
    pub fn servers(&self) -> &[StoredServer] {
        &self.servers
    }

    /// Returns globally disabled ids.
    #[must_use]
    pub const fn global_disabled(&self) -> &BTreeSet<String> {
        &self.global_disabled
    }

    /// Returns disabled ids keyed by project path.
    #[must_use]
    pub const fn project_disabled(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.project_disabled
    }

    /// Returns whether `id` is disabled globally or for `project_path`.
    #[must_use]
    pub fn is_disabled(&self, id: &str, project_path: Option<&str>) -> bool {
        self.global_disabled.contains(id)
            || project_path
                .and_then(|path| self.project_disabled.get(path))
                .is_some_and(|disabled| disabled.contains(id))
    }

    /// Consumes the view, returning its entries.
    #[must_use]
    pub fn into_servers(self) -> Vec<StoredServer> {
        self.servers
    }
}
