//! xrate Library
//!
//! Exposes the cache, config, and rate modules to the binary and to
//! integration tests.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod rates;

pub use error::Error;
