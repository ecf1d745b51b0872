//! Collaborator contracts between the booking engine and the outside
//! world: settings storage, the per-week booked-intervals feed, the
//! geocoder, and the booking persistence sink.

pub mod error;
pub mod outbound;
pub mod types;
