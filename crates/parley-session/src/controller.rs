use std::sync::Arc;

use tracing::debug;

use parley_config::schema::ClassifierConfig;
use parley_core::{SpeakerDecision, Transcript};
use parley_gateway::ModelGateway;

use crate::detector::SpeakerDetector;

/// Per-session turn accounting: how many turns have been processed and the
/// configured cap. Owned by the controller, reset between logical sessions.
#[derive(Debug, Clone)]
pub struct SessionTurnState {
    pub current_turn: u64,
    /// Non-positive = unlimited.
    pub max_session_turns: i64,
}

impl SessionTurnState {
    pub fn new(max_session_turns: i64) -> Self {
        Self {
            current_turn: 0,
            max_session_turns,
        }
    }

    /// Count one turn and report whether the budget is now exhausted.
    fn advance(&mut self) -> bool {
        self.current_turn += 1;
        self.max_session_turns > 0 && self.current_turn >= self.max_session_turns as u64
    }

    fn reset(&mut self) {
        self.current_turn = 0;
    }
}

/// Enforces the per-session turn budget and gates auto-continuation.
///
/// Every processed turn counts against the budget, whether or not detection
/// runs. The budget check comes before the auto-continue flag so an exhausted
/// session reports its terminal decision regardless of what the caller asked.
pub struct TurnController {
    detector: SpeakerDetector,
    state: SessionTurnState,
}

impl TurnController {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        classifier: ClassifierConfig,
        max_session_turns: i64,
    ) -> Self {
        Self {
            detector: SpeakerDetector::new(gateway, classifier),
            state: SessionTurnState::new(max_session_turns),
        }
    }

    /// Turns processed so far in this session.
    pub fn current_turn(&self) -> u64 {
        self.state.current_turn
    }

    /// Account for one completed turn and decide whether the conversation
    /// should continue automatically. Returns the continuation verdict plus
    /// the decision that produced it, when one exists.
    pub async fn advance(
        &mut self,
        transcript: &Transcript,
        auto_continue: bool,
    ) -> (bool, Option<SpeakerDecision>) {
        if self.state.advance() {
            debug!(
                turn = self.state.current_turn,
                max = self.state.max_session_turns,
                "session turn budget exhausted"
            );
            return (
                false,
                Some(SpeakerDecision::yield_to_user("Maximum session turns reached")),
            );
        }

        if !auto_continue {
            return (false, None);
        }

        match self.detector.detect(transcript).await {
            Some(decision) => (decision.should_continue, Some(decision)),
            None => (false, None),
        }
    }

    /// Reset the turn counter. The budget itself is unchanged.
    pub fn reset(&mut self) {
        self.state.reset();
    }
}
