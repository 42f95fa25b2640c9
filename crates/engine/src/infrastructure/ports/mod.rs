//! Port traits for infrastructure boundaries.
//!
//! Ports exist for:
//! - Content access (JSON bundle today, a database behind the same trait later)
//! - Clock (for testing)

mod error;
mod repos;
mod testing;

pub use error::RepoError;
pub use repos::{ContentQuery, ContentRepo};
pub use testing::ClockPort;

#[cfg(test)]
pub use repos::MockContentRepo;
#[cfg(test)]
pub use testing::MockClockPort;
