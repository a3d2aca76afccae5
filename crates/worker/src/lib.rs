//! The cachet worker core.
//!
//! Classifies intercepted requests into strategy classes and serves each
//! through cache-first, network-first, or stale-while-revalidate handling,
//! with versioned cache lifecycle management (precache at install, stale
//! partition eviction at activation).

pub mod classify;
pub mod lifecycle;
pub mod strategy;
pub mod worker;

#[cfg(test)]
mod testing;

pub use classify::{Destination, PatternTable, RequestClass, RequestDescriptor, RequestMode, classify};
pub use lifecycle::LifecycleManager;
pub use strategy::{Outcome, Source, StrategyRunner};
pub use worker::{ControlMessage, WorkerCore};
