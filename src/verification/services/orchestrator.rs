//! Concurrent verification of every enabled server.

use crate::server_config::{
    domain::{ResolvedServerList, ServerSpec, StoreKind},
    ports::ConfigStore,
    services::{ServerConfigService, ServerConfigServiceResult},
};
use crate::verification::{
    domain::{ProbeError, ProbeOutcome, ProbeSettings, VerificationResult, VerificationStatus},
    ports::ServerProbe,
};
use mockable::Clock;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{info, warn};

/// Resolves configured servers and verifies them concurrently.
///
/// Configuration reads and writes are delegated to [`ServerConfigService`];
/// probing goes through the injected [`ServerProbe`].
pub struct VerificationService<S, P, C>
where
    S: ConfigStore,
    P: ServerProbe + 'static,
    C: Clock + Send + Sync,
{
    config: ServerConfigService<S>,
    probe: Arc<P>,
    clock: Arc<C>,
    settings: ProbeSettings,
}

impl<S, P, C> VerificationService<S, P, C>
where
    S: ConfigStore,
    P: ServerProbe + 'static,
    C: Clock + Send + Sync,
{
    /// Creates a verification service.
    #[must_use]
    pub const fn new(
        config: ServerConfigService<S>,
        probe: Arc<P>,
        clock: Arc<C>,
        settings: ProbeSettings,
    ) -> Self {
        Self {
            config,
            probe,
            clock,
            settings,
        }
    }

    /// Returns the configuration service.
    #[must_use]
    pub const fn config(&self) -> &ServerConfigService<S> {
        &self.config
    }

    /// Returns the probe settings.
    #[must_use]
    pub const fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// Lists configured servers; see [`ServerConfigService::list_resolved`].
    ///
    /// # Errors
    ///
    /// Returns configuration errors from the underlying service.
    pub async fn list_resolved(
        &self,
        project_path: Option<&str>,
    ) -> ServerConfigServiceResult<ResolvedServerList> {
        self.config.list_resolved(project_path).await
    }

    /// Saves a server; see [`ServerConfigService::upsert`].
    ///
    /// # Errors
    ///
    /// Returns configuration errors from the underlying service.
    pub async fn upsert(
        &self,
        spec: &ServerSpec,
        enabled: bool,
        project_path: Option<&str>,
    ) -> ServerConfigServiceResult<StoreKind> {
        self.config.upsert(spec, enabled, project_path).await
    }

    /// Removes a server; see [`ServerConfigService::delete`].
    ///
    /// # Errors
    ///
    /// Returns configuration errors from the underlying service.
    pub async fn delete(&self, server_id: &str) -> ServerConfigServiceResult<bool> {
        self.config.delete(server_id).await
    }

    /// Probes every server enabled for `project_path`.
    ///
    /// Probes run concurrently and independently; the result holds exactly
    /// one entry per enabled server, sorted by name and then id. Probe
    /// failures never surface as errors.
    ///
    /// # Errors
    ///
    /// Returns configuration errors when the server list cannot be resolved.
    pub async fn verify_all(
        &self,
        project_path: Option<&str>,
    ) -> ServerConfigServiceResult<Vec<VerificationResult>> {
        let specs = self
            .config
            .list_resolved(project_path)
            .await?
            .into_enabled_specs();
        Ok(self.verify_specs(specs).await)
    }

    /// Probes the given servers concurrently, regardless of enabled state.
    pub async fn verify_specs(&self, specs: Vec<ServerSpec>) -> Vec<VerificationResult> {
        let budget = self.settings.budget();
        let hard_limit = budget.hard_limit();

        let tasks: Vec<_> = specs
            .into_iter()
            .map(|spec| {
                let probe = Arc::clone(&self.probe);
                let task_spec = spec.clone();
                let handle = tokio::spawn(async move {
                    timeout(hard_limit, probe.probe(&task_spec, budget))
                        .await
                        .unwrap_or_else(|_| {
                            ProbeOutcome::from(ProbeError::Timeout {
                                budget: budget.timeout,
                            })
                        })
                });
                (spec, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(tasks.len());
        for (spec, handle) in tasks {
            let outcome = handle
                .await
                .unwrap_or_else(|err| ProbeOutcome::failed(format!("probe task failed: {err}")));
            if outcome.status() != VerificationStatus::Connected {
                warn!(
                    server_id = %spec.id(),
                    status = %outcome.status(),
                    error = outcome.error(),
                    "MCP server verification did not connect"
                );
            }
            results.push(VerificationResult::new(&spec, outcome, self.clock.utc()));
        }

        results.sort_by(|left, right| {
            left.name()
                .cmp(right.name())
                .then_with(|| left.server_id().cmp(right.server_id()))
        });
        info!(
            servers = results.len(),
            connected = results
                .iter()
                .filter(|result| result.status() == VerificationStatus::Connected)
                .count(),
            "verified MCP servers"
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server_config::adapters::json::Document;
    use crate::server_config::adapters::memory::InMemoryConfigStore;
    use crate::server_config::domain::{ServerId, ServerTransport};
    use crate::verification::adapters::memory::ScriptedProbe;
    use crate::verification::ports::MockServerProbe;
    use mockable::DefaultClock;
    use rstest::rstest;
    use serde_json::{Value, json};
    use std::time::{Duration, Instant};

    fn store(primary: Value) -> ServerConfigService<InMemoryConfigStore> {
        let Value::Object(doc) = primary else {
            panic!("object literal");
        };
        ServerConfigService::new(Arc::new(InMemoryConfigStore::with_documents(
            Some(doc),
            None::<Document>,
        )))
    }

    fn five_servers() -> ServerConfigService<InMemoryConfigStore> {
        store(json!({
            "mcpServers": {
                "alpha": {"command": "alpha"},
                "bravo": {"command": "bravo"},
                "charlie": {"command": "charlie"},
                "hang": {"command": "hang"},
                "broken": {"command": "broken"}
            }
        }))
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn probes_run_concurrently_and_independently() {
        let delay = Duration::from_millis(200);
        let timeout_budget = Duration::from_millis(400);
        let connected = || ProbeOutcome::connected(Some(json!({"name": "ok"})));
        let probe = ScriptedProbe::new()
            .with_delayed_outcome("alpha", connected(), delay)
            .with_delayed_outcome("bravo", connected(), delay)
            .with_delayed_outcome("charlie", connected(), delay)
            .with_timeout("hang")
            .with_outcome("broken", ProbeOutcome::failed("spawn failed"));
        let service = VerificationService::new(
            five_servers(),
            Arc::new(probe.clone()),
            Arc::new(DefaultClock),
            ProbeSettings::with_timeout(timeout_budget),
        );
        let started = Instant::now();

        let results = service.verify_all(None).await.expect("verification runs");

        assert!(started.elapsed() < timeout_budget * 3);
        let statuses: Vec<_> = results
            .iter()
            .map(|result| (result.server_id(), result.status()))
            .collect();
        assert_eq!(
            statuses,
            [
                ("alpha", VerificationStatus::Connected),
                ("bravo", VerificationStatus::Connected),
                ("broken", VerificationStatus::Failed),
                ("charlie", VerificationStatus::Connected),
                ("hang", VerificationStatus::Pending),
            ]
        );
        let mut probed = probe.invocations();
        probed.sort();
        assert_eq!(probed, ["alpha", "bravo", "broken", "charlie", "hang"]);
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn stalled_probe_is_cut_off_at_the_hard_limit() {
        let settings = ProbeSettings {
            termination_grace: Duration::from_millis(50),
            ..ProbeSettings::with_timeout(Duration::from_millis(100))
        };
        let probe = ScriptedProbe::new()
            .with_stall("alpha")
            .with_outcome("bravo", ProbeOutcome::connected(None));
        let service = VerificationService::new(
            store(json!({"mcpServers": {"alpha": {"command": "a"}, "bravo": {"command": "b"}}})),
            Arc::new(probe),
            Arc::new(DefaultClock),
            settings,
        );

        let results = service.verify_all(None).await.expect("verification runs");

        assert_eq!(results.len(), 2);
        assert_eq!(
            results.first().map(VerificationResult::status),
            Some(VerificationStatus::Pending)
        );
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn only_enabled_servers_are_probed() {
        let config = store(json!({
            "mcpServers": {
                "fs": {"command": "node", "args": ["fs-server.js"]},
                "remote": {"url": "https://example.test/mcp"}
            },
            "disabledMcpServers": ["remote"]
        }));
        let mut probe = MockServerProbe::new();
        probe
            .expect_probe()
            .withf(|spec, _| spec.id().as_str() == "fs")
            .times(1)
            .returning(|_, _| ProbeOutcome::connected(None));
        let service = VerificationService::new(
            config,
            Arc::new(probe),
            Arc::new(DefaultClock),
            ProbeSettings::default(),
        );

        let results = service.verify_all(None).await.expect("verification runs");

        assert_eq!(
            results.iter().map(VerificationResult::server_id).collect::<Vec<_>>(),
            ["fs"]
        );
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn results_are_sorted_by_display_name() {
        let probe = ScriptedProbe::new();
        let service = VerificationService::new(
            store(json!({"mcpServers": {}})),
            Arc::new(probe),
            Arc::new(DefaultClock),
            ProbeSettings::default(),
        );
        let specs = vec![
            ServerSpec::new(ServerId::new("b").expect("valid id"), ServerTransport::stdio("x"))
                .with_display_name("Alpha"),
            ServerSpec::new(ServerId::new("a").expect("valid id"), ServerTransport::stdio("x"))
                .with_display_name("Zulu"),
        ];

        let results = service.verify_specs(specs).await;

        assert_eq!(
            results.iter().map(VerificationResult::name).collect::<Vec<_>>(),
            ["Alpha", "Zulu"]
        );
        assert!(results
            .iter()
            .all(|result| result.status() == VerificationStatus::Failed));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn invalid_project_path_is_a_configuration_error() {
        let service = VerificationService::new(
            five_servers(),
            Arc::new(ScriptedProbe::new()),
            Arc::new(DefaultClock),
            ProbeSettings::default(),
        );

        assert!(service.verify_all(Some("constructor")).await.is_err());
    }
}
