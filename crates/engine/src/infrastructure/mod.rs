//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod clock;
pub mod content_cache;
pub mod memory_content;
pub mod ports;
pub mod settings;
