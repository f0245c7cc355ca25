//! # parley-session
//!
//! Conversation sessions and the turn-continuation machinery around them.
//!
//! The flow per user input: [`ChatSession::submit`] appends the user turn,
//! obtains one model turn through the gateway, then hands the transcript to
//! the [`TurnController`], which budgets turns and asks the
//! [`SpeakerDetector`] who should speak next. Front-ends act on the returned
//! decision; the session itself never loops.

pub mod controller;
pub mod detector;
pub mod extract;
pub mod prompts;
pub mod registry;
pub mod session;

pub use controller::{SessionTurnState, TurnController};
pub use detector::SpeakerDetector;
pub use registry::{SessionRegistry, SessionSummary};
pub use session::{ChatSession, TurnOutcome};
