//! Belvedere: MCP server configuration and live status verification.
//!
//! This crate resolves which Model Context Protocol servers a host
//! application has configured, which of them are enabled for a given
//! project, and whether each enabled server actually answers an MCP
//! `initialize` handshake.
//!
//! # Architecture
//!
//! Belvedere follows hexagonal architecture principles:
//!
//! - **Domain**: Pure configuration and verification logic
//! - **Ports**: Trait interfaces for persistence and probing
//! - **Adapters**: JSON file stores, process and HTTP probes, and in-memory
//!   doubles
//!
//! # Modules
//!
//! - [`server_config`]: Loading, resolving, and editing server configuration
//! - [`verification`]: Concurrent live handshake probes

pub mod server_config;
pub mod verification;
