//! Probe port: one bounded handshake attempt against one server.

use crate::server_config::domain::ServerSpec;
use crate::verification::domain::{ProbeBudget, ProbeOutcome};
use async_trait::async_trait;

/// Attempts the `initialize` handshake against a configured server.
///
/// Implementations never fail: every error is folded into the returned
/// outcome, and every process or connection they open is released before
/// they return.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServerProbe: Send + Sync {
    /// Probes `spec` within `budget`.
    async fn probe(&self, spec: &ServerSpec, budget: ProbeBudget) -> ProbeOutcome;
}
