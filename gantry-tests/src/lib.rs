//! Shared test utilities for the gantry crates
//!
//! This crate provides:
//! - **Fixtures**: wire payloads and specs with realistic defaults
//! - **Mocks**: a mock Google API server and token providers
//! - **Assertions**: round-trip and request-shape checks
//!
//! # Example
//!
//! ```ignore
//! use gantry_tests::{fixtures, mocks::MockGoogleApi};
//!
//! #[tokio::test]
//! async fn provisions_queue() {
//!     let api = MockGoogleApi::start().await;
//!     api.mount_not_found("GET", "/v2beta3/projects/p/locations/l/queues/q1").await;
//!     // ...
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mocks;

pub use assertions::{assert_round_trip, check_round_trip, RoundTripInvariantViolation};
pub use mocks::{CountingTokenProvider, FailingTokenProvider, MockGoogleApi};
