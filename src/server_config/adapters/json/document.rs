//! Pure transformations over the two persisted JSON document layouts.
//!
//! Both layouts keep unknown top-level keys untouched; the primary file in
//! particular is shared with other tooling.

use crate::server_config::domain::{
    ConfigSnapshot, ProjectScope, ServerId, ServerSpec, StoreKind, StoredServer,
};
use serde_json::{Map, Value};
use tracing::warn;

/// Top-level key holding server entries in both layouts.
pub(crate) const SERVERS_KEY: &str = "mcpServers";
/// Key of a disable list, at top level and inside each project object.
pub(crate) const DISABLED_KEY: &str = "disabledMcpServers";
/// Top-level key of the per-project map in the primary layout.
pub(crate) const PROJECTS_KEY: &str = "projects";

/// JSON object at the root of a store file.
pub type Document = Map<String, Value>;

/// Returns whether a primary document holds at least one server.
pub(crate) fn primary_has_servers(doc: &Document) -> bool {
    doc.get(SERVERS_KEY)
        .and_then(Value::as_object)
        .is_some_and(|servers| !servers.is_empty())
}

/// Returns whether a secondary document holds at least one server.
pub(crate) fn secondary_has_servers(doc: &Document) -> bool {
    doc.get(SERVERS_KEY)
        .and_then(Value::as_array)
        .is_some_and(|servers| !servers.is_empty())
}

/// Store document that owns the current view and receives writes.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Owner {
    /// The primary file exists and owns the view.
    Primary(Document),
    /// The secondary file owns the view; `None` when it does not exist yet.
    Secondary(Option<Document>),
}

/// Chooses the owning document.
///
/// The primary owns the view when it exists and either holds servers or the
/// secondary holds none. The secondary is only loaded when the primary is
/// absent or empty.
pub(crate) fn choose_owner<E>(
    primary: Option<Document>,
    load_secondary: impl FnOnce() -> Result<Option<Document>, E>,
) -> Result<Owner, E> {
    match primary {
        Some(doc) if primary_has_servers(&doc) => Ok(Owner::Primary(doc)),
        Some(doc) => {
            let secondary = load_secondary()?;
            if secondary.as_ref().is_some_and(secondary_has_servers) {
                Ok(Owner::Secondary(secondary))
            } else {
                Ok(Owner::Primary(doc))
            }
        }
        None => Ok(Owner::Secondary(load_secondary()?)),
    }
}

impl Owner {
    /// Builds the configuration view held by the owning document.
    pub(crate) fn snapshot(&self) -> ConfigSnapshot {
        match self {
            Self::Primary(doc) => primary_snapshot(doc),
            Self::Secondary(Some(doc)) => secondary_snapshot(doc),
            Self::Secondary(None) => ConfigSnapshot::empty(StoreKind::Secondary),
        }
    }

    /// Returns which store owns the view.
    pub(crate) const fn kind(&self) -> StoreKind {
        match self {
            Self::Primary(_) => StoreKind::Primary,
            Self::Secondary(_) => StoreKind::Secondary,
        }
    }

    /// Applies an upsert and returns the document to persist.
    pub(crate) fn upsert(
        self,
        spec: &ServerSpec,
        enabled: bool,
        scope: Option<&ProjectScope>,
    ) -> Document {
        match self {
            Self::Primary(mut doc) => {
                upsert_primary(&mut doc, spec, enabled, scope);
                doc
            }
            Self::Secondary(existing) => {
                let mut doc = existing.unwrap_or_default();
                upsert_secondary(&mut doc, spec, enabled);
                doc
            }
        }
    }

    /// Applies a delete; returns the document to persist when anything was
    /// removed.
    pub(crate) fn delete(self, id: &ServerId) -> Option<Document> {
        match self {
            Self::Primary(mut doc) => delete_primary(&mut doc, id).then_some(doc),
            Self::Secondary(Some(mut doc)) => delete_secondary(&mut doc, id).then_some(doc),
            Self::Secondary(None) => None,
        }
    }
}

/// Builds a view from the layered primary layout.
pub(crate) fn primary_snapshot(doc: &Document) -> ConfigSnapshot {
    let mut snapshot = ConfigSnapshot::empty(StoreKind::Primary);

    if let Some(servers) = doc.get(SERVERS_KEY).and_then(Value::as_object) {
        for (id, value) in servers {
            let stored = value.as_object().map_or_else(
                || StoredServer::new(id.as_str(), None, Map::new()),
                |entry| StoredServer::from_entry(id.as_str(), entry),
            );
            snapshot = snapshot.with_server(stored);
        }
    }

    for id in string_items(doc.get(DISABLED_KEY)) {
        snapshot = snapshot.with_global_disabled(id);
    }

    if let Some(projects) = doc.get(PROJECTS_KEY).and_then(Value::as_object) {
        for (path, project) in projects {
            if let Err(error) = ProjectScope::new(path.as_str()) {
                warn!(project_path = %path, %error, "skipping project scope");
                continue;
            }
            for id in string_items(project.get(DISABLED_KEY)) {
                snapshot = snapshot.with_project_disabled(path.as_str(), id);
            }
        }
    }

    snapshot
}

/// Builds a view from the flat secondary layout.
///
/// Entries with `"enabled": false` land in the global disable set; the
/// layout has no project scopes.
pub(crate) fn secondary_snapshot(doc: &Document) -> ConfigSnapshot {
    let mut snapshot = ConfigSnapshot::empty(StoreKind::Secondary);

    let items = doc.get(SERVERS_KEY).and_then(Value::as_array);
    for item in items.into_iter().flatten() {
        let Some(entry) = item.as_object() else {
            snapshot = snapshot.with_server(StoredServer::new("", None, Map::new()));
            continue;
        };
        let id = entry.get("id").and_then(Value::as_str).unwrap_or_default();
        let enabled = entry.get("enabled").and_then(Value::as_bool).unwrap_or(true);
        snapshot = snapshot.with_server(StoredServer::from_entry(id, entry));
        if !enabled {
            snapshot = snapshot.with_global_disabled(id);
        }
    }

    snapshot
}

/// Merges `spec` into the primary layout and updates one disable list.
pub(crate) fn upsert_primary(
    doc: &mut Document,
    spec: &ServerSpec,
    enabled: bool,
    scope: Option<&ProjectScope>,
) {
    let id = spec.id().as_str();

    let mut servers = take_object(doc, SERVERS_KEY);
    let mut entry = match servers.remove(id) {
        Some(Value::Object(existing)) => existing,
        _ => Map::new(),
    };
    merge_spec(&mut entry, spec);
    servers.insert(id.to_owned(), Value::Object(entry));
    doc.insert(SERVERS_KEY.to_owned(), Value::Object(servers));

    match scope {
        None => {
            let mut disabled = take_array(doc, DISABLED_KEY);
            set_membership(&mut disabled, id, !enabled);
            doc.insert(DISABLED_KEY.to_owned(), Value::Array(disabled));
        }
        Some(project_scope) => {
            let mut projects = take_object(doc, PROJECTS_KEY);
            let mut project = match projects.remove(project_scope.as_str()) {
                Some(Value::Object(existing)) => existing,
                _ => Map::new(),
            };
            let mut disabled = take_array(&mut project, DISABLED_KEY);
            set_membership(&mut disabled, id, !enabled);
            project.insert(DISABLED_KEY.to_owned(), Value::Array(disabled));
            projects.insert(project_scope.as_str().to_owned(), Value::Object(project));
            doc.insert(PROJECTS_KEY.to_owned(), Value::Object(projects));
        }
    }
}

/// Removes a server from the primary layout and scrubs every disable list.
pub(crate) fn delete_primary(doc: &mut Document, server_id: &ServerId) -> bool {
    let id = server_id.as_str();
    let mut removed = false;

    if let Some(Value::Object(servers)) = doc.get_mut(SERVERS_KEY) {
        removed |= servers.remove(id).is_some();
    }
    if let Some(Value::Array(disabled)) = doc.get_mut(DISABLED_KEY) {
        removed |= remove_id(disabled, id);
    }
    if let Some(Value::Object(projects)) = doc.get_mut(PROJECTS_KEY) {
        for project in projects.values_mut() {
            if let Some(Value::Array(disabled)) = project.get_mut(DISABLED_KEY) {
                removed |= remove_id(disabled, id);
            }
        }
    }

    removed
}

/// Replaces or appends `spec` in the secondary layout.
pub(crate) fn upsert_secondary(doc: &mut Document, spec: &ServerSpec, enabled: bool) {
    let id = spec.id().as_str();
    let mut fields = Map::new();
    fields.insert("id".to_owned(), Value::from(id));
    fields.insert("name".to_owned(), Value::from(spec.display_name()));
    fields.insert("enabled".to_owned(), Value::Bool(enabled));
    fields.insert("server".to_owned(), Value::Object(spec.to_fields()));
    let entry = Value::Object(fields);

    let mut servers = take_array(doc, SERVERS_KEY);
    match servers
        .iter_mut()
        .find(|item| item.get("id").and_then(Value::as_str) == Some(id))
    {
        Some(slot) => *slot = entry,
        None => servers.push(entry),
    }
    doc.insert(SERVERS_KEY.to_owned(), Value::Array(servers));
}

/// Removes a server from the secondary layout.
pub(crate) fn delete_secondary(doc: &mut Document, id: &ServerId) -> bool {
    let Some(Value::Array(servers)) = doc.get_mut(SERVERS_KEY) else {
        return false;
    };
    let before = servers.len();
    servers.retain(|item| item.get("id").and_then(Value::as_str) != Some(id.as_str()));
    servers.len() != before
}

/// Merges the transport of `spec` onto an existing entry.
///
/// Fields of the other transport variant are dropped so a server switched
/// from `stdio` to `http` does not keep a stale `command`.
fn merge_spec(entry: &mut Document, spec: &ServerSpec) {
    if let Some(Value::Object(nested)) = entry.get_mut("server") {
        merge_transport(nested, spec);
    } else {
        merge_transport(entry, spec);
    }

    if spec.has_custom_display_name() {
        entry.insert("name".to_owned(), Value::from(spec.display_name()));
    }
}

fn merge_transport(target: &mut Document, spec: &ServerSpec) {
    let fields = spec.to_fields();
    for field in spec.foreign_fields() {
        target.remove(*field);
    }
    if !fields.contains_key("type") {
        target.remove("type");
    }
    target.extend(fields);
}

fn take_object(doc: &mut Document, key: &str) -> Document {
    match doc.remove(key) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn take_array(doc: &mut Document, key: &str) -> Vec<Value> {
    match doc.remove(key) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

fn set_membership(list: &mut Vec<Value>, id: &str, present: bool) {
    remove_id(list, id);
    if present {
        list.push(Value::from(id));
    }
}

fn remove_id(list: &mut Vec<Value>, id: &str) -> bool {
    let before = list.len();
    list.retain(|item| item.as_str() != Some(id));
    list.len() != before
}

fn string_items(value: Option<&Value>) -> impl Iterator<Item = &str> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server_config::domain::{ServerTransport, StdioTransport};
    use rstest::rstest;
    use serde_json::json;

    fn document(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn stdio_spec(id: &str, command: &str) -> ServerSpec {
        ServerSpec::new(
            ServerId::new(id).expect("valid id"),
            ServerTransport::Stdio(StdioTransport::new(command)),
        )
    }

    #[rstest]
    fn upsert_merges_onto_existing_entry() {
        let mut doc = document(json!({
            "theme": "dark",
            "mcpServers": {
                "fs": {"command": "old", "args": ["a"], "timeout": 30}
            }
        }));

        upsert_primary(&mut doc, &stdio_spec("fs", "node"), true, None);

        assert_eq!(doc.get("theme"), Some(&json!("dark")));
        let entry = doc.get(SERVERS_KEY).and_then(|servers| servers.get("fs"));
        assert_eq!(
            entry,
            Some(&json!({
                "type": "stdio",
                "command": "node",
                "args": [],
                "env": {},
                "timeout": 30
            }))
        );
    }

    #[rstest]
    fn default_display_name_keeps_stored_name() {
        let mut doc = document(json!({
            "mcpServers": {"fs": {"name": "Files", "command": "old"}}
        }));

        upsert_primary(&mut doc, &stdio_spec("fs", "node"), true, None);

        let entry = doc.get(SERVERS_KEY).and_then(|servers| servers.get("fs"));
        assert_eq!(entry.and_then(|fs| fs.get("name")), Some(&json!("Files")));
        assert_eq!(entry.and_then(|fs| fs.get("command")), Some(&json!("node")));
    }

    #[rstest]
    fn switching_transport_drops_foreign_fields() {
        let mut doc = document(json!({
            "mcpServers": {"svc": {"command": "node", "args": ["x"], "env": {"A": "1"}}}
        }));
        let spec = ServerSpec::new(
            ServerId::new("svc").expect("valid id"),
            ServerTransport::http("https://example.test/mcp").expect("valid url"),
        );

        upsert_primary(&mut doc, &spec, true, None);

        let entry = doc
            .get(SERVERS_KEY)
            .and_then(|servers| servers.get("svc"))
            .and_then(Value::as_object)
            .expect("entry exists");
        assert!(!entry.contains_key("command"));
        assert!(!entry.contains_key("args"));
        assert_eq!(entry.get("type"), Some(&json!("http")));
    }

    #[rstest]
    fn project_scoped_disable_leaves_global_list_alone() {
        let mut doc = document(json!({"disabledMcpServers": ["other"]}));
        let scope = ProjectScope::new("/p").expect("valid scope");

        upsert_primary(&mut doc, &stdio_spec("fs", "node"), false, Some(&scope));

        assert_eq!(doc.get(DISABLED_KEY), Some(&json!(["other"])));
        assert_eq!(
            doc.get(PROJECTS_KEY).and_then(|projects| projects.get("/p")),
            Some(&json!({"disabledMcpServers": ["fs"]}))
        );
    }

    #[rstest]
    #[case(true, json!([]))]
    #[case(false, json!(["fs"]))]
    fn global_upsert_toggles_membership_once(#[case] enabled: bool, #[case] expected: Value) {
        let mut doc = document(json!({"disabledMcpServers": ["fs", "fs"]}));

        upsert_primary(&mut doc, &stdio_spec("fs", "node"), enabled, None);

        assert_eq!(doc.get(DISABLED_KEY), Some(&expected));
    }

    #[rstest]
    fn delete_scrubs_every_scope() {
        let mut doc = document(json!({
            "mcpServers": {"fs": {"command": "node"}, "git": {"command": "git-mcp"}},
            "disabledMcpServers": ["fs"],
            "projects": {
                "/a": {"disabledMcpServers": ["fs", "git"]},
                "/b": {"disabledMcpServers": ["fs"], "history": []}
            }
        }));

        let removed = delete_primary(&mut doc, &ServerId::new("fs").expect("valid id"));

        assert!(removed);
        assert_eq!(
            Value::Object(doc),
            json!({
                "mcpServers": {"git": {"command": "git-mcp"}},
                "disabledMcpServers": [],
                "projects": {
                    "/a": {"disabledMcpServers": ["git"]},
                    "/b": {"disabledMcpServers": [], "history": []}
                }
            })
        );
    }

    #[rstest]
    fn delete_of_unknown_id_reports_nothing_removed() {
        let mut doc = document(json!({"mcpServers": {"git": {"command": "git-mcp"}}}));
        assert!(!delete_primary(&mut doc, &ServerId::new("fs").expect("valid id")));
    }

    #[rstest]
    fn reserved_project_keys_are_skipped_on_load() {
        let doc = document(json!({
            "mcpServers": {"fs": {"command": "node"}},
            "projects": {
                "__proto__": {"disabledMcpServers": ["fs"]},
                "/p": {"disabledMcpServers": ["fs"]}
            }
        }));

        let snapshot = primary_snapshot(&doc);

        assert_eq!(
            snapshot.project_disabled().keys().map(String::as_str).collect::<Vec<_>>(),
            ["/p"]
        );
    }

    #[rstest]
    fn secondary_layout_maps_enabled_flags_to_global_scope() {
        let doc = document(json!({
            "mcpServers": [
                {"id": "fs", "enabled": true, "server": {"command": "node"}},
                {"id": "git", "enabled": false, "command": "git-mcp"},
                {"id": "web", "url": "https://example.test/mcp"}
            ]
        }));

        let snapshot = secondary_snapshot(&doc);

        assert_eq!(snapshot.source(), StoreKind::Secondary);
        assert_eq!(snapshot.servers().len(), 3);
        assert!(snapshot.is_disabled("git", Some("/any")));
        assert!(!snapshot.is_disabled("web", None));
    }

    #[rstest]
    fn secondary_upsert_replaces_entry_wholesale() {
        let mut doc = document(json!({
            "mcpServers": [{"id": "fs", "enabled": true, "command": "old", "extra": 1}]
        }));

        upsert_secondary(&mut doc, &stdio_spec("fs", "node"), false);

        assert_eq!(
            doc.get(SERVERS_KEY),
            Some(&json!([{
                "id": "fs",
                "name": "fs",
                "enabled": false,
                "server": {"type": "stdio", "command": "node", "args": [], "env": {}}
            }]))
        );
        assert!(delete_secondary(&mut doc, &ServerId::new("fs").expect("valid id")));
        assert_eq!(doc.get(SERVERS_KEY), Some(&json!([])));
    }

    #[rstest]
    #[case(None, true, StoreKind::Secondary)]
    #[case(Some(json!({"mcpServers": {"fs": {}}})), true, StoreKind::Primary)]
    #[case(Some(json!({"mcpServers": {}})), false, StoreKind::Primary)]
    #[case(Some(json!({"theme": "dark"})), true, StoreKind::Secondary)]
    fn owner_follows_fallback_rule(
        #[case] primary: Option<Value>,
        #[case] secondary_populated: bool,
        #[case] expected: StoreKind,
    ) {
        let secondary = if secondary_populated {
            json!({"mcpServers": [{"id": "fs", "command": "node"}]})
        } else {
            json!({"mcpServers": []})
        };

        let owner = choose_owner::<std::convert::Infallible>(primary.map(document), || {
            Ok(Some(document(secondary)))
        });

        assert_eq!(owner.map(|chosen| chosen.kind()), Ok(expected));
    }

    #[rstest]
    fn populated_primary_never_loads_secondary() {
        let primary = document(json!({"mcpServers": {"fs": {"command": "node"}}}));

        let owner = choose_owner(Some(primary), || Err("secondary must not be read"));

        assert!(matches!(owner, Ok(Owner::Primary(_))));
    }
}
