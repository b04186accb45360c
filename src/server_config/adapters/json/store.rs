//! File-backed config store over the primary and secondary JSON files.

use super::document::{Owner, choose_owner};
use super::file::{read_document, write_document};
use super::paths::StorePaths;
use crate::server_config::domain::{ConfigSnapshot, ProjectScope, ServerId, ServerSpec, StoreKind};
use crate::server_config::ports::{ConfigStore, ConfigStoreError, ConfigStoreResult};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};
use tracing::info;

type FileLock = Arc<Mutex<()>>;

/// Locks shared by every store in the process, keyed by file path.
static FILE_LOCKS: LazyLock<Mutex<HashMap<Utf8PathBuf, FileLock>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Config store reading the layered primary file with fallback to the flat
/// secondary file.
///
/// Load-merge-write cycles are serialized per store file across every store
/// instance in the process, so independent instances over the same paths do
/// not lose each other's updates.
#[derive(Debug, Clone)]
pub struct LayeredJsonConfigStore {
    paths: Arc<StorePaths>,
}

impl LayeredJsonConfigStore {
    /// Creates a store over explicit file locations.
    #[must_use]
    pub fn new(paths: StorePaths) -> Self {
        Self {
            paths: Arc::new(paths),
        }
    }

    /// Creates a store over the default files in the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError::HomeDirectory`] when no home directory is
    /// available.
    pub fn discover() -> ConfigStoreResult<Self> {
        StorePaths::discover().map(Self::new)
    }

    /// Returns the file locations.
    #[must_use]
    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    async fn run_locked<F, T>(&self, operation: F) -> ConfigStoreResult<T>
    where
        F: FnOnce(&StorePaths) -> ConfigStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let paths = Arc::clone(&self.paths);
        run_blocking(&self.paths, move || {
            let locks = file_locks(&paths);
            let _guards = locks
                .iter()
                .map(|lock| {
                    lock.lock().map_err(|err| {
                        ConfigStoreError::write(
                            paths.primary().as_str(),
                            std::io::Error::other(err.to_string()),
                        )
                    })
                })
                .collect::<ConfigStoreResult<Vec<_>>>()?;
            operation(&paths)
        })
        .await
    }
}

#[async_trait]
impl ConfigStore for LayeredJsonConfigStore {
    async fn load(&self) -> ConfigStoreResult<ConfigSnapshot> {
        let paths = Arc::clone(&self.paths);
        let snapshot = run_blocking(&self.paths, move || {
            load_owner(&paths).map(|owner| owner.snapshot())
        })
        .await?;
        info!(
            source = %snapshot.source(),
            servers = snapshot.servers().len(),
            "loaded MCP configuration"
        );
        Ok(snapshot)
    }

    async fn upsert(
        &self,
        spec: &ServerSpec,
        enabled: bool,
        scope: Option<&ProjectScope>,
    ) -> ConfigStoreResult<StoreKind> {
        let owned_spec = spec.clone();
        let owned_scope = scope.cloned();
        let kind = self
            .run_locked(move |paths| {
                let owner = load_owner(paths)?;
                let target = owner.kind();
                let doc = owner.upsert(&owned_spec, enabled, owned_scope.as_ref());
                write_document(target_path(paths, target), &doc)?;
                Ok(target)
            })
            .await?;
        info!(
            server_id = %spec.id(),
            store = %kind,
            enabled,
            project_path = scope.map(ProjectScope::as_str),
            "saved MCP server"
        );
        Ok(kind)
    }

    async fn delete(&self, id: &ServerId) -> ConfigStoreResult<bool> {
        let owned_id = id.clone();
        let removed = self
            .run_locked(move |paths| {
                let owner = load_owner(paths)?;
                let target = owner.kind();
                match owner.delete(&owned_id) {
                    Some(doc) => {
                        write_document(target_path(paths, target), &doc)?;
                        Ok(true)
                    }
                    None => Ok(false),
                }
            })
            .await?;
        info!(server_id = %id, removed, "deleted MCP server");
        Ok(removed)
    }
}

fn load_owner(paths: &StorePaths) -> ConfigStoreResult<Owner> {
    let primary = read_document(paths.primary())?;
    choose_owner(primary, || read_document(paths.secondary()))
}

/// Returns the locks guarding both store files, in a stable acquisition
/// order.
fn file_locks(paths: &StorePaths) -> Vec<FileLock> {
    let mut files: Vec<&Utf8Path> = vec![paths.primary(), paths.secondary()];
    files.sort_unstable();
    files.dedup();
    let mut registry = FILE_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    files
        .into_iter()
        .map(|file| Arc::clone(registry.entry(file.to_owned()).or_default()))
        .collect()
}

fn target_path(paths: &StorePaths, kind: StoreKind) -> &Utf8Path {
    match kind {
        StoreKind::Primary => paths.primary(),
        StoreKind::Secondary => paths.secondary(),
    }
}

/// Runs blocking file work on the blocking thread pool.
async fn run_blocking<F, T>(paths: &StorePaths, f: F) -> ConfigStoreResult<T>
where
    F: FnOnce() -> ConfigStoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| ConfigStoreError::read(paths.primary().as_str(), err))?
}
