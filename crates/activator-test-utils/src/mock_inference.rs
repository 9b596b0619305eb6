// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted classification / reasoning service.
//!
//! Replies are popped from a FIFO script; when the script is empty the
//! standing reply is used.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use activator_core::{
    ActivatorError, AdapterType, InferenceAdapter, InferenceRequest, PluginAdapter,
    RouteSuggestion, TierId,
};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Suggest(RouteSuggestion),
    Fail(String),
}

/// Inference double with a scripted reply queue and a call log.
pub struct MockInference {
    name: String,
    delay: Duration,
    standing: Mutex<Reply>,
    script: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<InferenceRequest>>,
    calls: AtomicUsize,
}

impl MockInference {
    /// A service that fails every call until told otherwise.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            delay: Duration::ZERO,
            standing: Mutex::new(Reply::Fail("no scripted reply".to_string())),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A service that always suggests `tool` on the default execution tier.
    pub fn suggesting(name: &str, tool: &str, confidence: f64) -> Self {
        let mock = Self::new(name);
        mock.set_reply(suggestion(tool, confidence));
        mock
    }

    /// Delay every reply by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Replace the standing reply.
    pub fn set_reply(&self, reply: RouteSuggestion) {
        *self.standing.lock().unwrap_or_else(PoisonError::into_inner) = Reply::Suggest(reply);
    }

    /// Make the standing reply an inference failure.
    pub fn set_failure(&self, message: &str) {
        *self.standing.lock().unwrap_or_else(PoisonError::into_inner) =
            Reply::Fail(message.to_string());
    }

    /// Queue a one-shot reply ahead of the standing one.
    pub fn push(&self, reply: Reply) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<InferenceRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next_reply(&self) -> Reply {
        let scripted = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        scripted.unwrap_or_else(|| {
            self.standing
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        })
    }
}

/// Suggestion for `tool` with an empty tier (the default execution tier).
pub fn suggestion(tool: &str, confidence: f64) -> RouteSuggestion {
    RouteSuggestion {
        tier: TierId::new(""),
        tool: tool.to_string(),
        parameters: serde_json::json!({}),
        confidence,
    }
}

#[async_trait]
impl PluginAdapter for MockInference {
    fn name(&self) -> &str {
        &self.name
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Inference
    }
}

#[async_trait]
impl InferenceAdapter for MockInference {
    async fn infer(&self, request: InferenceRequest) -> Result<RouteSuggestion, ActivatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.next_reply() {
            Reply::Suggest(suggestion) => Ok(suggestion),
            Reply::Fail(message) => Err(ActivatorError::inference(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> InferenceRequest {
        InferenceRequest {
            text: "restart web".into(),
            context: Default::default(),
        }
    }

    #[tokio::test]
    async fn script_runs_before_standing_reply() {
        let mock = MockInference::suggesting("classifier", "get_pods", 0.9);
        mock.push(Reply::Fail("warming up".into()));

        assert!(mock.infer(request()).await.is_err());
        assert_eq!(mock.infer(request()).await.unwrap().tool, "get_pods");
        assert_eq!(mock.calls(), 2);
        assert_eq!(mock.requests()[0].text, "restart web");
    }

    #[tokio::test]
    async fn new_mock_fails_with_inference_error() {
        let err = MockInference::new("reasoning")
            .infer(request())
            .await
            .unwrap_err();
        assert!(matches!(err, ActivatorError::Inference { .. }));
    }
}
