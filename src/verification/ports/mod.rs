//! Port contracts for server verification.

mod probe;

#[cfg(test)]
pub use probe::MockServerProbe;
pub use probe::ServerProbe;
