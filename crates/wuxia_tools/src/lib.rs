//! # Wuxia Development Tools
//!
//! Command-line tools for development:
//! - Technique data validators
//! - Seeded scenario runner
//! - Interactive terminal combat

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod runner;
pub mod scenario;
pub mod validate;
