//! Unified application error types for Marquee.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The set is deliberately closed:
//! callers branch on the variant and its structured fields instead of
//! parsing messages.

use std::fmt;
use thiserror::Error;

/// Backend subsystem named by [`AppError::Infrastructure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Subsystem {
    /// The durable relational store.
    Database,
    /// The distributed lock coordinator.
    Lock,
    /// The cache / coordination store.
    Cache,
    /// The delayed work queue.
    Queue,
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database => write!(f, "DATABASE"),
            Self::Lock => write!(f, "LOCK"),
            Self::Cache => write!(f, "CACHE"),
            Self::Queue => write!(f, "QUEUE"),
        }
    }
}

/// The unified application error used throughout Marquee.
#[derive(Debug, Error)]
pub enum AppError {
    /// The requested entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind, e.g. `"reservation"`.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The entity exists but its current status forbids the attempted action.
    #[error("cannot {attempted_action} {entity} {id} with status '{current_status}'")]
    InvalidState {
        /// Entity kind.
        entity: &'static str,
        /// Identifier of the entity.
        id: String,
        /// Status the entity was found in.
        current_status: String,
        /// The action that was refused.
        attempted_action: &'static str,
    },

    /// A contention outcome. Always safe for the caller to retry.
    #[error("{reason}")]
    Conflict {
        /// Human-readable contention description.
        reason: String,
        /// Identifiers of the contended items.
        offending: Vec<String>,
    },

    /// The reservation's validity window has passed.
    #[error("reservation {id} has expired")]
    Expired {
        /// Reservation identifier.
        id: String,
    },

    /// A backing service is unreachable or misbehaving. Never swallowed.
    #[error("{subsystem} failure: {message}")]
    Infrastructure {
        /// Which backend failed.
        subsystem: Subsystem,
        /// What went wrong.
        message: String,
        /// Underlying cause, when one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl AppError {
    /// Create a not-found error.
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create an invalid-state error.
    pub fn invalid_state(
        entity: &'static str,
        id: impl fmt::Display,
        current_status: impl Into<String>,
        attempted_action: &'static str,
    ) -> Self {
        Self::InvalidState {
            entity,
            id: id.to_string(),
            current_status: current_status.into(),
            attempted_action,
        }
    }

    /// Create a conflict error naming the contended items.
    pub fn conflict(reason: impl Into<String>, offending: Vec<String>) -> Self {
        Self::Conflict {
            reason: reason.into(),
            offending,
        }
    }

    /// Create an expired error.
    pub fn expired(id: impl fmt::Display) -> Self {
        Self::Expired { id: id.to_string() }
    }

    /// Create an infrastructure error without an underlying cause.
    pub fn infrastructure(subsystem: Subsystem, message: impl Into<String>) -> Self {
        Self::Infrastructure {
            subsystem,
            message: message.into(),
            source: None,
        }
    }

    /// Create a database infrastructure error with its cause.
    pub fn database(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Infrastructure {
            subsystem: Subsystem::Database,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a lock-service infrastructure error with its cause.
    pub fn lock(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Infrastructure {
            subsystem: Subsystem::Lock,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a cache infrastructure error with its cause.
    pub fn cache(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Infrastructure {
            subsystem: Subsystem::Cache,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a queue infrastructure error with its cause.
    pub fn queue(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Infrastructure {
            subsystem: Subsystem::Queue,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether the caller may safely retry the same request.
    ///
    /// Conflicts are transient by definition; infrastructure failures are
    /// retryable with backoff. The rest require a different request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::Infrastructure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_is_retryable() {
        let err = AppError::conflict("seats contended", vec!["a1".into()]);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_invalid_state_is_not_retryable() {
        let err = AppError::invalid_state("reservation", "xyz", "confirmed", "cancel");
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "cannot cancel reservation xyz with status 'confirmed'"
        );
    }

    #[test]
    fn test_infrastructure_display_names_subsystem() {
        let err = AppError::infrastructure(Subsystem::Lock, "connection refused");
        assert_eq!(err.to_string(), "LOCK failure: connection refused");
    }
}
