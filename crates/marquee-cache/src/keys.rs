//! Cache key builders for all Marquee cache entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses. Backend-level prefixing
//! (e.g. `marquee:`) is applied by the provider, not here.

use uuid::Uuid;

// ── Lock keys ──────────────────────────────────────────────

/// Lock key for a single seat within a session.
///
/// Seat locks are namespaced by session so identically labeled seats in
/// different sessions never contend.
pub fn seat_lock(session_id: Uuid, seat_id: Uuid) -> String {
    format!("lock:session:{session_id}:seat:{seat_id}")
}

// ── Reservation keys ───────────────────────────────────────

/// Cache key for a reservation snapshot.
pub fn reservation_snapshot(reservation_id: Uuid) -> String {
    format!("reservation:{reservation_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_lock_key() {
        let sid = Uuid::nil();
        let seat = Uuid::nil();
        assert_eq!(
            seat_lock(sid, seat),
            "lock:session:00000000-0000-0000-0000-000000000000:seat:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_reservation_key() {
        assert_eq!(
            reservation_snapshot(Uuid::nil()),
            "reservation:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_seat_lock_keys_sort_by_seat_id() {
        let sid = Uuid::nil();
        let a = Uuid::parse_str("00000000-0000-0000-0000-00000000000a").unwrap();
        let b = Uuid::parse_str("00000000-0000-0000-0000-00000000000b").unwrap();
        assert!(seat_lock(sid, a) < seat_lock(sid, b));
    }
}
