//! Integration scenarios for the reservation core, run end-to-end over the
//! in-memory store, lock coordinator, and cache — no external services.

#[path = "integration/expiration_test.rs"]
mod expiration_test;
#[path = "integration/helpers.rs"]
mod helpers;
#[path = "integration/reservation_test.rs"]
mod reservation_test;
