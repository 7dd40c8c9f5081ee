mod proptest_fsm;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use aether_core::lexicon::Lexicon;
use aether_core::protocol::{PredictRequest, PredictResult};
use aether_core::transport::PredictClient;

use super::types::key;
use super::{InputContext, KeyEvent, KeyOutcome};

/// Scriptable in-process stand-in for the daemon transport.
pub(super) struct StubClient {
    scripted: Mutex<VecDeque<Option<PredictResult>>>,
    default_reply: Option<PredictResult>,
    requests: Mutex<Vec<PredictRequest>>,
}

impl StubClient {
    /// Daemon down: every request fails silently.
    pub(super) fn silent() -> Arc<Self> {
        Arc::new(Self {
            scripted: Mutex::new(VecDeque::new()),
            default_reply: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Same prediction for every request.
    pub(super) fn always(reply: PredictResult) -> Arc<Self> {
        Arc::new(Self {
            scripted: Mutex::new(VecDeque::new()),
            default_reply: Some(reply),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Scripted replies first, then the silent default.
    pub(super) fn scripted(replies: Vec<Option<PredictResult>>) -> Arc<Self> {
        Arc::new(Self {
            scripted: Mutex::new(replies.into()),
            default_reply: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(super) fn last_request(&self) -> Option<PredictRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl PredictClient for StubClient {
    fn predict(&self, request: PredictRequest) -> Option<PredictResult> {
        self.requests.lock().unwrap().push(request);
        let mut scripted = self.scripted.lock().unwrap();
        match scripted.pop_front() {
            Some(reply) => reply,
            None => self.default_reply.clone(),
        }
    }
}

pub(super) fn ghost_result(text: &str, confidence: f32) -> PredictResult {
    PredictResult {
        ghost_text: text.to_string(),
        confidence,
        source: "local_fim".to_string(),
        ..Default::default()
    }
}

pub(super) fn make_context(client: Arc<StubClient>) -> InputContext {
    InputContext::new(
        Arc::new(Lexicon::unavailable("built without pinyin backend")),
        client,
    )
}

// Helper: simulate typing a string one character at a time
pub(super) fn type_string(context: &mut InputContext, s: &str) -> Vec<KeyOutcome> {
    s.chars()
        .map(|ch| context.handle_key(KeyEvent::chr(ch)))
        .collect()
}
