//! Probe returning canned outcomes, for exercising orchestration.

use crate::server_config::domain::ServerSpec;
use crate::verification::domain::{ProbeBudget, ProbeError, ProbeOutcome};
use crate::verification::ports::ServerProbe;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Script {
    Respond { outcome: ProbeOutcome, delay: Duration },
    Timeout,
    Stall,
}

/// Probe answering from a per-server script.
///
/// Servers without a script fail immediately. Every invocation is recorded
/// in call order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProbe {
    scripts: HashMap<String, Script>,
    invocations: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProbe {
    /// Creates a probe with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `server_id` with `outcome` immediately.
    #[must_use]
    pub fn with_outcome(self, server_id: impl Into<String>, outcome: ProbeOutcome) -> Self {
        self.with_delayed_outcome(server_id, outcome, Duration::ZERO)
    }

    /// Answers `server_id` with `outcome` after `delay`.
    #[must_use]
    pub fn with_delayed_outcome(
        mut self,
        server_id: impl Into<String>,
        outcome: ProbeOutcome,
        delay: Duration,
    ) -> Self {
        self.scripts
            .insert(server_id.into(), Script::Respond { outcome, delay });
        self
    }

    /// Makes `server_id` wait out its budget, like a server that never
    /// answers.
    #[must_use]
    pub fn with_timeout(mut self, server_id: impl Into<String>) -> Self {
        self.scripts.insert(server_id.into(), Script::Timeout);
        self
    }

    /// Makes `server_id` never return, ignoring its budget.
    #[must_use]
    pub fn with_stall(mut self, server_id: impl Into<String>) -> Self {
        self.scripts.insert(server_id.into(), Script::Stall);
        self
    }

    /// Returns the ids probed so far, in call order.
    #[must_use]
    pub fn invocations(&self) -> Vec<String> {
        self.invocations
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ServerProbe for ScriptedProbe {
    async fn probe(&self, spec: &ServerSpec, budget: ProbeBudget) -> ProbeOutcome {
        let server_id = spec.id().as_str();
        if let Ok(mut guard) = self.invocations.lock() {
            guard.push(server_id.to_owned());
        }
        match self.scripts.get(server_id).cloned() {
            Some(Script::Respond { outcome, delay }) => {
                tokio::time::sleep(delay).await;
                outcome
            }
            Some(Script::Timeout) => {
                tokio::time::sleep(budget.timeout).await;
                ProbeOutcome::from(ProbeError::Timeout {
                    budget: budget.timeout,
                })
            }
            Some(Script::Stall) => std::future::pending().await,
            None => ProbeOutcome::failed(format!("no scripted outcome for {server_id}")),
        }
    }
}
