//! Session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A cinema session (a showing of a movie in a room).
///
/// Sessions are managed by an external module; the reservation core only
/// reads them to validate seat ownership and to price sales.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Unique session identifier.
    pub id: Uuid,
    /// Movie title shown in this session.
    pub movie_name: String,
    /// Room identifier, e.g. `"3"` or `"IMAX"`.
    pub room_number: String,
    /// When the showing starts.
    pub start_time: DateTime<Utc>,
    /// When the showing ends.
    pub end_time: DateTime<Utc>,
    /// Ticket price in integer cents.
    pub ticket_price_cents: i64,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last updated.
    pub updated_at: DateTime<Utc>,
}
