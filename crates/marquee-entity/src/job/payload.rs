//! Typed job payload definitions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use marquee_core::error::{AppError, Subsystem};
use marquee_core::result::AppResult;

/// Typed payloads for known job types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "job_type")]
pub enum JobPayload {
    /// Expire a single reservation once its hold window has passed.
    #[serde(rename = "reservation_expiration")]
    ReservationExpiration {
        /// The reservation to expire.
        reservation_id: Uuid,
    },
    /// Batch sweep of all overdue pending reservations.
    #[serde(rename = "expiration_sweep")]
    ExpirationSweep,
}

impl JobPayload {
    /// The `job_type` string under which this payload is dispatched.
    pub fn job_type(&self) -> &'static str {
        match self {
            Self::ReservationExpiration { .. } => "reservation_expiration",
            Self::ExpirationSweep => "expiration_sweep",
        }
    }

    /// Serialize for storage in a job row.
    pub fn to_value(&self) -> AppResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| AppError::queue("Failed to encode payload", e))
    }

    /// Parse a stored job payload.
    pub fn from_value(value: &serde_json::Value) -> AppResult<Self> {
        serde_json::from_value(value.clone()).map_err(|e| {
            AppError::Infrastructure {
                subsystem: Subsystem::Queue,
                message: format!("Unparseable job payload: {value}"),
                source: Some(Box::new(e)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_roundtrip_carries_job_type_tag() {
        let payload = JobPayload::ReservationExpiration {
            reservation_id: Uuid::new_v4(),
        };
        let value = payload.to_value().expect("encode");
        assert_eq!(value["job_type"], "reservation_expiration");
        let parsed = JobPayload::from_value(&value).expect("decode");
        assert_eq!(parsed.job_type(), "reservation_expiration");
    }
}
