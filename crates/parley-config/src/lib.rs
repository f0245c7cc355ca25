//! # parley-config
//!
//! Configuration system for Parley. Loads `parley.toml`, applies environment
//! variable overrides, and validates the result.

pub mod loader;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::ParleyConfig;
