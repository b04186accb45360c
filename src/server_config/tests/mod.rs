//! Unit tests for the server configuration module.
//!
//! Service tests exercise resolution against the in-memory store, covering
//! scoping, fallback, and error propagation.

mod service_tests;
