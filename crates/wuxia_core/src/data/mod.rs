//! Content data loaded from RON.
//!
//! This module contains no IO - it parses strings. File loading is handled
//! by `wuxia_tools`.

mod technique_catalog;

pub use technique_catalog::TechniqueCatalog;
