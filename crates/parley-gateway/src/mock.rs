use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use parley_core::{ParleyError, Part, Result, Role, Transcript, Turn};

use crate::gateway::{GenerationConfig, ModelGateway};

/// Outcome queued on a [`MockGateway`].
#[derive(Debug, Clone)]
enum QueuedResponse {
    Turn(Turn),
    Error(String),
}

/// A scripted gateway for tests. Responses are dequeued in order; once the
/// queue is empty, a canned text turn is returned. Every request is recorded
/// so tests can assert what was actually sent.
#[derive(Clone, Default)]
pub struct MockGateway {
    queue: Arc<Mutex<VecDeque<QueuedResponse>>>,
    requests: Arc<Mutex<Vec<(Transcript, GenerationConfig)>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a plain text model turn.
    pub fn with_text_turn(self, text: impl Into<String>) -> Self {
        self.queue
            .lock()
            .push_back(QueuedResponse::Turn(Turn::model_text(text)));
        self
    }

    /// Queue a model turn containing a single function call.
    pub fn with_function_call(self, name: impl Into<String>, args: serde_json::Value) -> Self {
        let turn = Turn::new(
            Role::Model,
            vec![Part::FunctionCall {
                name: name.into(),
                args,
            }],
        );
        self.queue.lock().push_back(QueuedResponse::Turn(turn));
        self
    }

    /// Queue an arbitrary model turn.
    pub fn with_turn(self, turn: Turn) -> Self {
        self.queue.lock().push_back(QueuedResponse::Turn(turn));
        self
    }

    /// Queue a gateway failure.
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.queue
            .lock()
            .push_back(QueuedResponse::Error(message.into()));
        self
    }

    /// All (transcript, config) pairs seen so far, in call order.
    pub fn requests(&self) -> Vec<(Transcript, GenerationConfig)> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ModelGateway for MockGateway {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, transcript: &Transcript, config: &GenerationConfig) -> Result<Turn> {
        self.requests
            .lock()
            .push((transcript.clone(), config.clone()));

        match self.queue.lock().pop_front() {
            Some(QueuedResponse::Turn(turn)) => Ok(turn),
            Some(QueuedResponse::Error(message)) => Err(ParleyError::Gateway(message)),
            None => Ok(Turn::model_text("mock response")),
        }
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
