//! Cache module for persisting a value to disk as JSON
//!
//! This module provides a file-backed cache that remembers a SHA-256 checksum of
//! the bytes it last read or wrote, so saving unchanged data does not touch the
//! file.

mod manager;

pub use manager::{CacheError, JsonCache};
