//! Background expiration processing and scheduled sweeps for Marquee.
//!
//! This crate provides:
//! - The durable expiration queue backing the core's scheduler trait
//! - A worker runner that claims and executes due jobs with bounded
//!   concurrency, retry backoff, and a dead set
//! - A job executor that dispatches jobs to the correct handler
//! - The expiration and sweep job handlers
//! - A cron scheduler that enqueues the periodic sweep

pub mod executor;
pub mod jobs;
pub mod queue;
pub mod runner;
pub mod scheduler;

pub use queue::ExpirationQueue;
pub use runner::WorkerRunner;
pub use scheduler::CronScheduler;
