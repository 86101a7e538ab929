//! Test module for encounter-level and determinism tests.
//!
//! Unit tests live next to the code they cover; this module holds the
//! pieces that exercise a whole [`crate::Battle`] through the public
//! `tick` loop:
//!
//! - `integration.rs`: full turn cycles, ties, statuses, items, and both
//!   battle outcomes driven end to end
//! - `determinism.rs`: same seed plus same decisions reproduces the
//!   whole transcript
//! - `helpers.rs`: battle factories and stub dice shared across tests

pub mod helpers;
