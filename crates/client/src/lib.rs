//! Client code for cachet.
//!
//! This crate provides the network side of the proxy: the [`Network`]
//! trait the strategy executors fetch through, a reqwest-backed
//! implementation, and URL canonicalization.

pub mod fetch;

pub use fetch::{HttpNetwork, Network, NetworkConfig, UrlError, canonicalize};
