//! Backend that replays canned model output.

use crate::llm::{Backend, GenerateRequest, ModelError};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Returns queued outputs in order, one per `generate` call.
///
/// Used for replaying recorded transcripts and for driving the session loop
/// in tests without a model.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    outputs: Mutex<VecDeque<String>>,
}

impl ScriptedBackend {
    pub fn new<I, S>(outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            outputs: Mutex::new(outputs.into_iter().map(Into::into).collect()),
        }
    }

    /// Queue another output.
    pub fn push(&self, output: impl Into<String>) {
        self.outputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(output.into());
    }

    pub fn remaining(&self) -> usize {
        self.outputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Backend for ScriptedBackend {
    async fn generate(&self, _request: GenerateRequest<'_>) -> Result<String, ModelError> {
        self.outputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| ModelError::Unavailable("script exhausted".to_string()))
    }
}
