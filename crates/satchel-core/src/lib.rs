//! Pure booking domain for the tutoring marketplace.
//!
//! Everything here is synchronous and side-effect free: interval algebra,
//! policy normalization, availability resolution, slot enumeration,
//! recurrence expansion, travel pricing, and cost assembly. Fetching booked
//! weeks, geocoding, and persistence live behind ports in the outer crates.

pub mod availability;
pub mod block;
pub mod booking;
pub mod error;
pub mod geo;
pub mod ids;
pub mod money;
pub mod policy;
pub mod pricing;
pub mod recurrence;
pub mod slots;
pub mod week;
