//! # marquee-cache
//!
//! Coordination-store backends for Marquee. Two concerns share the same
//! backend: the distributed multi-key seat lock and the reservation cache
//! mirror.
//!
//! - **redis**: Lua-scripted atomic multi-key locking plus a Redis cache,
//!   for multi-process deployments
//! - **memory**: single-mutex locking plus a dashmap cache, for single-node
//!   deployments and tests
//!
//! The provider is selected at runtime based on configuration.

pub mod keys;
pub mod memory;
pub mod provider;
pub mod redis;

pub use provider::CacheManager;
