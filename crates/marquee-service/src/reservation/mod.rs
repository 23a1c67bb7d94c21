//! Reservation lifecycle management.

pub mod mirror;
pub mod service;
pub mod view;

pub use mirror::{CacheMirror, ReservationSnapshot};
pub use service::{CreateReservation, ReservationService};
pub use view::{ReservationView, SaleView};
