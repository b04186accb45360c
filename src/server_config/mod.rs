//! MCP server configuration resolution for Belvedere.
//!
//! This module answers two questions for the host application: which MCP
//! servers exist, and which of them are enabled for the current project. The
//! configuration lives in one of two persisted JSON representations (a layered
//! primary file with global and per-project disable lists, and a flat
//! secondary file used as a fallback). The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Resolution and mutation services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
