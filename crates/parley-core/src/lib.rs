//! # parley-core
//!
//! Core types for the Parley conversational agent: the transcript vocabulary
//! (`Turn`, `Part`, `Role`), the next-speaker decision value, tool-capability
//! metadata, and the shared error type. Every other crate in the workspace
//! builds on this vocabulary.

pub mod decision;
pub mod error;
pub mod tool;
pub mod turn;

pub use decision::{NextSpeaker, SpeakerDecision};
pub use error::{ParleyError, Result};
pub use tool::FunctionDecl;
pub use turn::{Part, Role, Transcript, Turn};
