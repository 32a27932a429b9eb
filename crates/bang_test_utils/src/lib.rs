//! # Bang Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Board and piece fixtures
//! - A recording [`view::RecordingView`] for driving the action scheduler
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod view;

/// Re-export proptest for convenience.
pub use proptest;
