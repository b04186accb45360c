//! In-memory adapter implementations.
//!
//! The store keeps both documents in memory and applies the same layout
//! rules as the file-backed store, which makes it suitable for unit tests
//! and for hosts that persist configuration themselves.

mod store;

pub use store::InMemoryConfigStore;
