//! # parley-cli
//!
//! Command-line interface for the parley conversation agent.
//!
//! ## Commands
//!
//! - `parley chat` — Interactive chat in the terminal
//! - `parley serve` — Start the HTTP/WebSocket API server
//! - `parley config` — Show current configuration
//! - `parley init` — Initialize a new parley.toml
//! - `parley completions` — Generate shell completions

pub mod commands;

pub use commands::Cli;
