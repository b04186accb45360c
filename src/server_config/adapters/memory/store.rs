//! In-memory implementation of the [`ConfigStore`] port.

use crate::server_config::adapters::json::{Document, Owner, choose_owner};
use crate::server_config::domain::{ConfigSnapshot, ProjectScope, ServerId, ServerSpec, StoreKind};
use crate::server_config::ports::{ConfigStore, ConfigStoreError, ConfigStoreResult};
use async_trait::async_trait;
use std::convert::Infallible;
use std::sync::{Arc, RwLock};

const LOCATION: &str = "memory";

/// In-memory config store holding an optional primary and secondary
/// document.
///
/// Thread-safe via internal [`RwLock`]; clones share the same documents.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigStore {
    documents: Arc<RwLock<Documents>>,
}

#[derive(Debug, Default)]
struct Documents {
    primary: Option<Document>,
    secondary: Option<Document>,
}

impl InMemoryConfigStore {
    /// Creates a store with neither document present.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from existing documents.
    #[must_use]
    pub fn with_documents(primary: Option<Document>, secondary: Option<Document>) -> Self {
        Self {
            documents: Arc::new(RwLock::new(Documents { primary, secondary })),
        }
    }

    /// Returns a copy of the primary document, if present.
    #[must_use]
    pub fn primary(&self) -> Option<Document> {
        self.documents
            .read()
            .ok()
            .and_then(|guard| guard.primary.clone())
    }

    /// Returns a copy of the secondary document, if present.
    #[must_use]
    pub fn secondary(&self) -> Option<Document> {
        self.documents
            .read()
            .ok()
            .and_then(|guard| guard.secondary.clone())
    }

    fn owner(documents: &Documents) -> Owner {
        let Ok(owner) = choose_owner::<Infallible>(documents.primary.clone(), || {
            Ok(documents.secondary.clone())
        });
        owner
    }

    fn replace(documents: &mut Documents, kind: StoreKind, doc: Document) {
        match kind {
            StoreKind::Primary => documents.primary = Some(doc),
            StoreKind::Secondary => documents.secondary = Some(doc),
        }
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn load(&self) -> ConfigStoreResult<ConfigSnapshot> {
        let guard = self
            .documents
            .read()
            .map_err(|err| ConfigStoreError::read(LOCATION, std::io::Error::other(err.to_string())))?;
        Ok(Self::owner(&guard).snapshot())
    }

    async fn upsert(
        &self,
        spec: &ServerSpec,
        enabled: bool,
        scope: Option<&ProjectScope>,
    ) -> ConfigStoreResult<StoreKind> {
        let mut guard = self
            .documents
            .write()
            .map_err(|err| ConfigStoreError::write(LOCATION, std::io::Error::other(err.to_string())))?;
        let owner = Self::owner(&guard);
        let kind = owner.kind();
        let doc = owner.upsert(spec, enabled, scope);
        Self::replace(&mut guard, kind, doc);
        Ok(kind)
    }

    async fn delete(&self, id: &ServerId) -> ConfigStoreResult<bool> {
        let mut guard = self
            .documents
            .write()
            .map_err(|err| ConfigStoreError::write(LOCATION, std::io::Error::other(err.to_string())))?;
        let owner = Self::owner(&guard);
        let kind = owner.kind();
        Ok(match owner.delete(id) {
            Some(doc) => {
                Self::replace(&mut guard, kind, doc);
                true
            }
            None => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server_config::domain::ServerTransport;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn document(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => Document::new(),
        }
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn upsert_then_load_round_trips_through_primary() {
        let store = InMemoryConfigStore::with_documents(Some(Document::new()), None);
        let spec = ServerSpec::new(
            ServerId::new("fs").expect("valid id"),
            ServerTransport::stdio("node"),
        )
        .with_display_name("Files");

        let kind = store.upsert(&spec, true, None).await.expect("upsert succeeds");
        let snapshot = store.load().await.expect("load succeeds");

        assert_eq!(kind, StoreKind::Primary);
        assert_eq!(snapshot.servers().len(), 1);
        assert_eq!(
            snapshot.servers().first().and_then(|server| server.display_name()),
            Some("Files")
        );
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn delete_targets_the_owning_document() {
        let secondary = document(json!({"mcpServers": [{"id": "fs", "command": "node"}]}));
        let store = InMemoryConfigStore::with_documents(None, Some(secondary));

        let removed = store
            .delete(&ServerId::new("fs").expect("valid id"))
            .await
            .expect("delete succeeds");

        assert!(removed);
        assert!(store.primary().is_none());
        assert_eq!(
            store.secondary().and_then(|doc| doc.get("mcpServers").cloned()),
            Some(json!([]))
        );
    }
}
