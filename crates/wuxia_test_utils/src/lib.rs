//! # Wuxia Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Determinism test harness
//! - Entity, technique and arena fixtures
//! - Scripted random sources
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod random;

/// Re-export proptest for convenience.
pub use proptest;
