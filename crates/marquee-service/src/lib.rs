//! # marquee-service
//!
//! Business logic for the reservation core: the lifecycle manager that
//! serializes conflicting reservation attempts behind the distributed lock,
//! drives the reservation state machine, and maintains the fast-read cache
//! mirror.

pub mod reservation;

pub use reservation::service::ReservationService;
