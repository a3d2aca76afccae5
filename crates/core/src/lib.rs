//! Core types and shared functionality for cachet.
//!
//! This crate provides:
//! - Cache store abstraction with in-memory and SQLite backends
//! - Response snapshot and request-identity types
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheStore, MemoryStore, Partition, Snapshot, SqliteStore, request_key};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
