//! Per-context prediction façade.

use std::sync::Arc;

use tracing::debug;

use aether_core::protocol::{Language, PredictMode, PredictRequest, PredictResult};
use aether_core::settings::settings;
use aether_core::transport::PredictClient;

/// Owns the "last prediction" for one input context and the language/mode
/// it was requested with. Submission is synchronous; the daemon's own
/// latency budget bounds the wait.
pub struct GhostSession {
    client: Arc<dyn PredictClient>,
    language: Language,
    mode: PredictMode,
    last_prediction: Option<PredictResult>,
    ghost_text: String,
}

impl GhostSession {
    pub fn new(client: Arc<dyn PredictClient>) -> Self {
        Self {
            client,
            language: Language::Zh,
            mode: PredictMode::Fim,
            last_prediction: None,
            ghost_text: String::new(),
        }
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn set_mode(&mut self, mode: PredictMode) {
        self.mode = mode;
    }

    /// Request a prediction for the new context window. Returns the ghost
    /// text to display (empty when there is nothing to show).
    pub fn on_text_changed(&mut self, prefix: &str, suffix: &str) -> String {
        let predict = &settings().predict;
        let request = PredictRequest {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            language: self.language,
            mode: self.mode,
            max_tokens: predict.max_tokens,
            latency_budget_ms: predict.latency_budget_ms,
        };

        self.last_prediction = self.client.predict(request);
        match &self.last_prediction {
            Some(prediction) if !prediction.ghost_text.is_empty() => {
                debug!(source = %prediction.source, elapsed_ms = prediction.elapsed_ms, "prediction");
                self.ghost_text = prediction.ghost_text.clone();
            }
            _ => {
                self.last_prediction = None;
                self.ghost_text.clear();
            }
        }
        self.ghost_text.clone()
    }

    /// Take the current ghost text, clearing it from the cache.
    pub fn accept_ghost(&mut self) -> String {
        let accepted = std::mem::take(&mut self.ghost_text);
        if let Some(prediction) = &mut self.last_prediction {
            prediction.ghost_text.clear();
        }
        accepted
    }

    pub fn clear_ghost(&mut self) {
        self.ghost_text.clear();
        self.last_prediction = None;
    }

    pub fn last_prediction(&self) -> Option<&PredictResult> {
        self.last_prediction.as_ref()
    }

    pub fn ghost(&self) -> &str {
        &self.ghost_text
    }
}
