//! Trait definitions for the external collaborators of the reservation core.
//!
//! Marquee never holds authoritative state in-process: seats live in the
//! durable store, locks and cache entries in the coordination store, and
//! deferred expirations in the job queue. These traits define exactly the
//! operations the core requires from each backend.

pub mod cache;
pub mod lock;
pub mod scheduler;

pub use cache::CacheProvider;
pub use lock::{AcquireOutcome, LockCoordinator};
pub use scheduler::ExpirationScheduler;
