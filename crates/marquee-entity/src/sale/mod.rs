//! Sale domain entities.

pub mod model;

pub use model::{NewSale, Sale};
