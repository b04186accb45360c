//! Service orchestration tests for configuration resolution.

use std::sync::Arc;

use crate::server_config::{
    adapters::json::Document,
    adapters::memory::InMemoryConfigStore,
    domain::{
        ConfigSnapshot, ProjectScope, ServerConfigDomainError, ServerId, ServerSpec,
        ServerTransport, StoreKind,
    },
    ports::{ConfigStore, ConfigStoreError, ConfigStoreResult},
    services::{ServerConfigService, ServerConfigServiceError},
};
use async_trait::async_trait;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

type TestService = ServerConfigService<InMemoryConfigStore>;

fn document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

fn service_with(primary: Option<Value>, secondary: Option<Value>) -> TestService {
    ServerConfigService::new(Arc::new(InMemoryConfigStore::with_documents(
        primary.map(document),
        secondary.map(document),
    )))
}

#[fixture]
fn layered_service() -> TestService {
    service_with(
        Some(json!({
            "mcpServers": {
                "fs": {"command": "node", "args": ["fs-server.js"]},
                "remote": {"url": "https://example.test/mcp"}
            },
            "projects": {"/p": {"disabledMcpServers": ["fs"]}}
        })),
        None,
    )
}

fn enabled_flags(list: &crate::server_config::domain::ResolvedServerList) -> Vec<(String, bool)> {
    list.servers()
        .iter()
        .map(|server| (server.id().as_str().to_owned(), server.enabled()))
        .collect()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn project_scope_disables_only_within_that_project(layered_service: TestService) {
    let scoped = layered_service
        .list_resolved(Some("/p"))
        .await
        .expect("resolution should succeed");
    let unscoped = layered_service
        .list_resolved(None)
        .await
        .expect("resolution should succeed");

    assert_eq!(scoped.source(), StoreKind::Primary);
    assert_eq!(
        enabled_flags(&scoped),
        [("fs".to_owned(), false), ("remote".to_owned(), true)]
    );
    assert_eq!(
        enabled_flags(&unscoped),
        [("fs".to_owned(), true), ("remote".to_owned(), true)]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_primary_falls_back_to_secondary_flags() {
    let service = service_with(
        Some(json!({"mcpServers": {}})),
        Some(json!({
            "mcpServers": [
                {"id": "fs", "enabled": false, "server": {"command": "node"}},
                {"id": "git", "command": "git-mcp"}
            ]
        })),
    );

    let resolved = service
        .list_resolved(Some("/p"))
        .await
        .expect("resolution should succeed");

    assert_eq!(resolved.source(), StoreKind::Secondary);
    assert_eq!(
        enabled_flags(&resolved),
        [("fs".to_owned(), false), ("git".to_owned(), true)]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_entries_are_rejected_without_hiding_valid_ones() {
    let service = service_with(
        Some(json!({
            "mcpServers": {
                "broken": {"timeout": 30},
                "fs": {"command": "node"}
            }
        })),
        None,
    );

    let resolved = service
        .list_resolved(None)
        .await
        .expect("resolution should succeed");

    assert_eq!(enabled_flags(&resolved), [("fs".to_owned(), true)]);
    assert_eq!(resolved.rejected().len(), 1);
    assert_eq!(
        resolved.rejected().first().map(|entry| entry.error()),
        Some(&ServerConfigDomainError::MissingEndpoint)
    );
}

#[rstest]
#[case("__proto__")]
#[case("   ")]
#[tokio::test(flavor = "multi_thread")]
async fn unusable_project_paths_are_rejected(layered_service: TestService, #[case] path: &str) {
    let result = layered_service.list_resolved(Some(path)).await;

    assert!(matches!(result, Err(ServerConfigServiceError::Domain(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn scoped_upsert_only_affects_that_project(layered_service: TestService) {
    let spec = ServerSpec::new(
        ServerId::new("remote").expect("valid id"),
        ServerTransport::http("https://example.test/mcp").expect("valid url"),
    );

    let kind = layered_service
        .upsert(&spec, false, Some("/q"))
        .await
        .expect("upsert should succeed");
    let in_project = layered_service
        .list_resolved(Some("/q"))
        .await
        .expect("resolution should succeed");
    let elsewhere = layered_service
        .list_resolved(Some("/p"))
        .await
        .expect("resolution should succeed");

    assert_eq!(kind, StoreKind::Primary);
    assert_eq!(in_project.find("remote").map(|server| server.enabled()), Some(false));
    assert_eq!(elsewhere.find("remote").map(|server| server.enabled()), Some(true));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_removes_server_and_reports_missing_ids(layered_service: TestService) {
    assert!(layered_service.delete("fs").await.expect("delete should succeed"));
    assert!(!layered_service.delete("fs").await.expect("delete should succeed"));

    let resolved = layered_service
        .list_resolved(Some("/p"))
        .await
        .expect("resolution should succeed");
    assert_eq!(enabled_flags(&resolved), [("remote".to_owned(), true)]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_rejects_blank_id(layered_service: TestService) {
    let result = layered_service.delete(" ").await;

    assert!(matches!(
        result,
        Err(ServerConfigServiceError::Domain(ServerConfigDomainError::EmptyServerId))
    ));
}

struct UnreadableStore;

#[async_trait]
impl ConfigStore for UnreadableStore {
    async fn load(&self) -> ConfigStoreResult<ConfigSnapshot> {
        Err(ConfigStoreError::read(
            "claude.json",
            std::io::Error::new(std::io::ErrorKind::InvalidData, "expected value"),
        ))
    }

    async fn upsert(
        &self,
        _spec: &ServerSpec,
        _enabled: bool,
        _scope: Option<&ProjectScope>,
    ) -> ConfigStoreResult<StoreKind> {
        Err(ConfigStoreError::write(
            "claude.json",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        ))
    }

    async fn delete(&self, _id: &ServerId) -> ConfigStoreResult<bool> {
        Ok(false)
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn store_failures_propagate_unchanged() {
    let service = ServerConfigService::new(Arc::new(UnreadableStore));
    let spec = ServerSpec::new(
        ServerId::new("fs").expect("valid id"),
        ServerTransport::stdio("node"),
    );

    let listed = service.list_resolved(None).await;
    let saved = service.upsert(&spec, true, None).await;

    assert!(matches!(
        listed,
        Err(ServerConfigServiceError::Store(ConfigStoreError::Read { .. }))
    ));
    assert!(matches!(
        saved,
        Err(ServerConfigServiceError::Store(ConfigStoreError::Write { .. }))
    ));
}

#[rstest]
fn validate_entry_reports_missing_command() {
    let errors = TestService::validate_entry(&json!({"name": "Files", "server": {"type": "stdio"}}));

    assert_eq!(errors, [ServerConfigDomainError::MissingCommand]);
}
