//! Port contracts for MCP server configuration persistence.

mod store;

pub use store::{ConfigStore, ConfigStoreError, ConfigStoreResult};
