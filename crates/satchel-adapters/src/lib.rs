//! Concrete implementations of the booking engine's ports: sqlite-backed
//! settings and booking storage, and geocoders for the travel flow.

pub mod geocode;
pub mod persistence;
