//! Probe dispatching on the configured transport.

use super::{HttpProbe, ProbeInitError, StdioProbe};
use crate::server_config::domain::{ServerSpec, ServerTransport};
use crate::verification::domain::{ProbeBudget, ProbeOutcome, ProbeSettings};
use crate::verification::ports::ServerProbe;
use async_trait::async_trait;
use tracing::debug;

/// Probe for any configured server: subprocesses for `stdio`, a POST
/// request for `http`, `sse`, and bare-url entries.
#[derive(Debug, Clone)]
pub struct TransportProbe {
    stdio: StdioProbe,
    http: HttpProbe,
}

impl TransportProbe {
    /// Creates a probe from settings.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeInitError`] when either transport cannot be prepared.
    pub fn new(settings: &ProbeSettings) -> Result<Self, ProbeInitError> {
        Ok(Self {
            stdio: StdioProbe::new(settings)?,
            http: HttpProbe::new(settings)?,
        })
    }
}

#[async_trait]
impl ServerProbe for TransportProbe {
    async fn probe(&self, spec: &ServerSpec, budget: ProbeBudget) -> ProbeOutcome {
        debug!(
            server_id = %spec.id(),
            transport = spec.transport().label(),
            timeout = ?budget.timeout,
            "probing MCP server"
        );
        let outcome = match spec.transport() {
            ServerTransport::Stdio(stdio) => self.stdio.probe(stdio, budget).await,
            ServerTransport::Http(http) => self.http.probe(http, budget).await,
        };
        debug!(server_id = %spec.id(), status = %outcome.status(), "probe finished");
        outcome
    }
}
