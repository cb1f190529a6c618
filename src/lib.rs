//! Library exports for handover, shared between the binary and tests.

pub mod config;
pub mod flow;
pub mod models;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
pub mod verifier;
