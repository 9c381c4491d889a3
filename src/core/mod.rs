//! Core types and constants for the geolocator

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
