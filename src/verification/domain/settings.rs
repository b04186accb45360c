//! Tunables for verification probes.

use std::time::Duration;

/// Default per-probe time budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(8000);
/// Default wait between graceful and forced process termination.
pub const DEFAULT_TERMINATION_GRACE: Duration = Duration::from_millis(500);

/// Time limits handed to a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeBudget {
    /// Time allowed for the handshake.
    pub timeout: Duration,
    /// Time a process gets to exit after a termination request.
    pub termination_grace: Duration,
}

impl ProbeBudget {
    /// Creates a budget.
    #[must_use]
    pub const fn new(timeout: Duration, termination_grace: Duration) -> Self {
        Self {
            timeout,
            termination_grace,
        }
    }

    /// Upper bound on a probe's total running time, cleanup included.
    ///
    /// Cleanup may wait out the grace period and then the reaping of a
    /// killed process, so the grace is counted twice.
    #[must_use]
    pub const fn hard_limit(self) -> Duration {
        self.timeout
            .saturating_add(self.termination_grace)
            .saturating_add(self.termination_grace)
    }
}

impl Default for ProbeBudget {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_TERMINATION_GRACE)
    }
}

/// Configuration for probe adapters and the verification service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    /// Time allowed for each handshake.
    pub timeout: Duration,
    /// Wait between SIGTERM and SIGKILL when stopping a probe process.
    pub termination_grace: Duration,
    /// Lines longer than this many characters are skipped when looking for
    /// `serverInfo`.
    pub max_line_length: usize,
    /// Cap on buffered process output or response body, in bytes.
    pub max_output_bytes: usize,
    /// Characters of an unrecognized body kept in the error message.
    pub max_body_excerpt: usize,
    /// Client name sent in `clientInfo`.
    pub client_name: String,
    /// Client version sent in `clientInfo`.
    pub client_version: String,
    /// MCP protocol version requested.
    pub protocol_version: String,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            termination_grace: DEFAULT_TERMINATION_GRACE,
            max_line_length: 10_000,
            max_output_bytes: 1024 * 1024, // 1 MiB
            max_body_excerpt: 200,
            client_name: "belvedere".to_owned(),
            client_version: "1.0.0".to_owned(),
            protocol_version: "2024-11-05".to_owned(),
        }
    }
}

impl ProbeSettings {
    /// Creates default settings with a different handshake timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }

    /// Returns the budget passed to each probe.
    #[must_use]
    pub const fn budget(&self) -> ProbeBudget {
        ProbeBudget::new(self.timeout, self.termination_grace)
    }
}
