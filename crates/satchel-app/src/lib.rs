//! Booking workflows on top of the pure domain: loading and degrading
//! gracefully when a port misbehaves, assembling week views for the
//! calendar, expanding recurring series, and placing bookings.

pub mod availability_service;
pub mod booking_service;
pub mod error;
pub mod load;
pub mod recurrence_service;
