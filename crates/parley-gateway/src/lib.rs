//! # parley-gateway
//!
//! The model gateway abstraction. A [`ModelGateway`] takes a transcript plus a
//! [`GenerationConfig`] and returns exactly one model turn. The core treats
//! the model as an opaque remote capability; failures surface as
//! `ParleyError::Gateway`, never as a malformed success.

pub mod gateway;
pub mod gemini;
pub mod mock;

pub use gateway::{GenerationConfig, ModelGateway};
pub use gemini::GeminiGateway;
pub use mock::MockGateway;
