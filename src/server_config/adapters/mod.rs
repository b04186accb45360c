//! Adapter implementations of the configuration store port.
//!
//! - [`json`]: the on-disk primary and secondary JSON files.
//! - [`memory`]: an in-memory store holding the same documents.

pub mod json;
pub mod memory;
