//! Domain model for MCP server configuration.
//!
//! The configuration domain models server identity, transport settings, the
//! normalized view produced by a store load, and the resolved list with
//! per-scope enabled flags. Persistence concerns remain outside this
//! boundary.

mod error;
mod ids;
mod resolved;
mod snapshot;
mod spec;
mod transport;
mod validation;

pub use error::ServerConfigDomainError;
pub use ids::{ProjectScope, ServerId};
pub use resolved::{RejectedEntry, ResolvedServer, ResolvedServerList};
pub use snapshot::{ConfigSnapshot, StoreKind, StoredServer};
pub use spec::ServerSpec;
pub use transport::{HttpKind, HttpTransport, ServerTransport, StdioTransport};
pub use validation::validate_entry;
