//! # Cachet Core
//!
//! The domain layer of the Cachet cache and rate-limiting layer.
//! This crate contains ports and pure logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;

pub use error::ConfigError;
