//! Common utilities for the Trellis layout engine.
//!
//! This crate provides shared infrastructure used by all engine components:
//! - **Warning System** - deduplicated warnings for degraded input
//! - **Errors** - the error types returned at the engine's API boundaries

pub mod error;
pub mod warning;

pub use error::{ConfigError, DocumentError, TreeError};
