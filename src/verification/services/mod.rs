//! Application services for live server verification.

mod orchestrator;

pub use orchestrator::VerificationService;
