//! Integration tests for the debrid client
//!
//! Exercise adapters and the facade through the public API only, with a
//! scripted HTTP client standing in for the provider services.

#[path = "integration/common.rs"]
mod common;

#[path = "integration/facade.rs"]
mod facade;
#[path = "integration/invalid_magnets.rs"]
mod invalid_magnets;
#[path = "integration/rate_limiting.rs"]
mod rate_limiting;
#[path = "integration/registration.rs"]
mod registration;
#[path = "integration/round_trip.rs"]
mod round_trip;
