//! Debounced request coordination.
//!
//! One single-shot deadline per context: each observed edit re-arms it, the
//! fire supersedes any in-flight request by id, and only the response whose
//! id matches the current in-flight id is honoured, exactly once ("latest
//! wins"). The
//! clock is passed in explicitly so hosts can drive it from their own timer
//! primitive.

use std::time::{Duration, Instant};

use tracing::debug;

use aether_core::protocol::{CancelRequest, LanguageHint, SuggestRequest, SuggestionResponse};
use aether_core::settings::settings;

#[derive(Debug, Clone)]
struct PendingEdit {
    context: String,
    cursor: u32,
}

/// Frames to enqueue when the deadline fires.
#[derive(Debug, Clone, PartialEq)]
pub struct FirePlan {
    pub cancel: Option<CancelRequest>,
    pub request: SuggestRequest,
}

/// UI-thread verdict on a worker response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseDisposition {
    /// Show this suggestion as a ghost. `replace_range` is carried for the
    /// state machine but the ghost is inserted at the caret.
    Show {
        suggestion: String,
        replace_range: [u32; 2],
    },
    /// Below the confidence gate or empty: remove any ghost.
    Clear,
    /// Response id does not match the in-flight id: drop it.
    Stale,
}

pub struct RequestCoordinator {
    pending: Option<PendingEdit>,
    deadline: Option<Instant>,
    inflight_request_id: Option<String>,
    next_request_id: u64,
}

impl Default for RequestCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestCoordinator {
    pub fn new() -> Self {
        Self {
            pending: None,
            deadline: None,
            inflight_request_id: None,
            next_request_id: 1,
        }
    }

    /// Capture the context before the caret and (re)arm the single-shot
    /// deadline.
    pub fn note_edit(&mut self, context: String, cursor: u32, now: Instant) {
        self.pending = Some(PendingEdit { context, cursor });
        self.deadline = Some(now + Duration::from_millis(settings().debounce.interval_ms));
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn inflight_request_id(&self) -> Option<&str> {
        self.inflight_request_id.as_deref()
    }

    /// If the deadline has passed, mint a new request id, supersede any
    /// in-flight request, and hand back the frames to enqueue.
    pub fn take_due(&mut self, now: Instant) -> Option<FirePlan> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;
        let pending = self.pending.take()?;

        let cancel = self
            .inflight_request_id
            .take()
            .map(|request_id| CancelRequest { request_id });

        let request_id = self.next_request_id.to_string();
        self.next_request_id += 1;
        self.inflight_request_id = Some(request_id.clone());
        debug!(%request_id, "debounce fired");

        Some(FirePlan {
            cancel,
            request: SuggestRequest {
                request_id,
                context: pending.context,
                cursor: pending.cursor,
                language_hint: LanguageHint::Auto,
                max_len: settings().debounce.max_len,
            },
        })
    }

    /// Disarm the timer and forget the in-flight id (focus change,
    /// deactivation). The returned cancel frame, if any, should be sent.
    pub fn cancel_all(&mut self) -> Option<CancelRequest> {
        self.pending = None;
        self.deadline = None;
        self.inflight_request_id
            .take()
            .map(|request_id| CancelRequest { request_id })
    }

    pub fn on_response(&mut self, response: &SuggestionResponse) -> ResponseDisposition {
        if self.inflight_request_id.as_deref() != Some(response.request_id.as_str()) {
            debug!(request_id = %response.request_id, "stale response discarded");
            return ResponseDisposition::Stale;
        }
        // One response per request id: a replayed frame with the same id
        // is stale from here on.
        self.inflight_request_id = None;
        if response.suggestion.is_empty()
            || response.confidence < settings().debounce.min_confidence
        {
            return ResponseDisposition::Clear;
        }
        ResponseDisposition::Show {
            suggestion: response.suggestion.clone(),
            replace_range: response.replace_range,
        }
    }
}
