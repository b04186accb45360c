//! Application services for MCP server configuration.

mod resolver;

pub use resolver::{ServerConfigService, ServerConfigServiceError, ServerConfigServiceResult};
