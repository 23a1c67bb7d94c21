//! # marquee-entity
//!
//! Domain entity models for Marquee: cinema sessions, seats, reservations,
//! sales, and background jobs. All models derive `sqlx::FromRow` for the
//! PostgreSQL store and serde for cache snapshots and job payloads.

pub mod job;
pub mod reservation;
pub mod sale;
pub mod seat;
pub mod session;
