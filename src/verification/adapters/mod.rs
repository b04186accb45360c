//! Probe adapters for the verification port.
//!
//! - [`TransportProbe`]: dispatches to [`StdioProbe`] or [`HttpProbe`] by
//!   transport variant.
//! - [`memory::ScriptedProbe`]: canned outcomes and delays for tests.

pub mod memory;
mod http;
mod process;
mod stdio;
mod transport;

use std::sync::Arc;
use thiserror::Error;

pub use http::HttpProbe;
pub use process::shutdown_child;
pub use stdio::StdioProbe;
pub use transport::TransportProbe;

/// Errors raised while preparing a probe.
#[derive(Debug, Clone, Error)]
pub enum ProbeInitError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(Arc<reqwest::Error>),
    /// The `initialize` request could not be encoded.
    #[error("failed to encode initialize request: {0}")]
    Encode(Arc<serde_json::Error>),
}

impl ProbeInitError {
    /// Wraps an HTTP client construction failure.
    #[must_use]
    pub fn client(err: reqwest::Error) -> Self {
        Self::Client(Arc::new(err))
    }

    /// Wraps a request encoding failure.
    #[must_use]
    pub fn encode(err: serde_json::Error) -> Self {
        Self::Encode(Arc::new(err))
    }
}
