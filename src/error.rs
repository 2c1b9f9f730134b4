//! Top-level error type reported by the command line tool

use thiserror::Error;

use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::rates::RateError;

/// Any failure that ends an `xrate` run
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Rate(#[from] RateError),
}
