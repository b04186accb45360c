//! Domain model for live MCP server verification.
//!
//! Probes produce a [`ProbeOutcome`] per server; outcomes are never errors.
//! The handshake wire types and the heuristics that recognize an answer
//! live here so both transports classify responses the same way.

mod envelope;
mod error;
mod result;
mod settings;
mod status;
mod transcript;

pub use envelope::{
    InitializeRequest, JsonRpcEnvelope, classify_http_body, contains_marker, scan_server_info,
    sse_verdict,
};
pub use error::ProbeError;
pub use result::VerificationResult;
pub use settings::{DEFAULT_TERMINATION_GRACE, DEFAULT_TIMEOUT, ProbeBudget, ProbeSettings};
pub use status::{ProbeOutcome, VerificationStatus};
pub use transcript::{Handshake, StdoutTranscript};
