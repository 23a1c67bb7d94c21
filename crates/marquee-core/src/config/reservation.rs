//! Reservation lifecycle configuration.

use serde::{Deserialize, Serialize};

/// Settings for the reservation hold window and seat locking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationConfig {
    /// How long a pending reservation holds its seats, in seconds.
    #[serde(default = "default_hold_ttl")]
    pub hold_ttl_seconds: u64,
    /// TTL on individual seat locks, in seconds.
    ///
    /// A crash-safety ceiling only: it bounds how long a dead holder can
    /// block other callers, and is independent of (and much shorter than)
    /// the reservation's own hold TTL.
    #[serde(default = "default_lock_ttl")]
    pub lock_ttl_seconds: u64,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            hold_ttl_seconds: default_hold_ttl(),
            lock_ttl_seconds: default_lock_ttl(),
        }
    }
}

fn default_hold_ttl() -> u64 {
    30
}

fn default_lock_ttl() -> u64 {
    10
}
