pub mod base;
pub mod http_verifier;

// Re-export the primary items so callers can do
// "use crate::verifier::{Verifier, create_verifier};"
pub use base::{create_verifier, VerificationError, Verifier};
pub use http_verifier::HttpVerifier;
