//! Built-in job handlers.

pub mod expiration;
pub mod sweep;

pub use expiration::ExpirationJobHandler;
pub use sweep::SweepJobHandler;
