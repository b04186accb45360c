//! In-memory probe implementations for testing.

mod scripted;

pub use scripted::ScriptedProbe;
