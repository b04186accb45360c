//! Live status verification of configured MCP servers.
//!
//! Every enabled server is probed with a single `initialize` handshake over
//! its configured transport, and the answer is classified as connected,
//! failed, pending, or unknown. Probes run concurrently under a bounded
//! budget and always produce a result. The module follows the same layout
//! as [`crate::server_config`]:
//!
//! - Domain types in [`domain`]
//! - The probe port in [`ports`]
//! - Stdio, HTTP, and scripted probes in [`adapters`]
//! - The orchestrating service in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
