//! Per-input-context editing state machine for the addon front-end.
//!
//! [`InputContext`] owns the composing buffer, the candidate list, the ghost
//! text, and the prediction session for one focused text field. The host
//! feeds it key events and surrounding-text snapshots; it answers with
//! [`KeyOutcome`]s (eat / commit / re-render) and exposes a [`UiState`]
//! snapshot the host turns into its panel and preedit primitives.

mod commit;
pub mod composing;
pub mod ghost;
mod key_handlers;
mod prediction;
mod response;
pub(crate) mod types;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use aether_core::lexicon::Lexicon;
use aether_core::transport::PredictClient;

use composing::ComposingBuffer;
use ghost::GhostSession;
use types::{CandidateListState, Surrounding};

pub use types::{key, CandidatePage, KeyEvent, KeyOutcome, PreeditRun, TextStyle, UiState};

pub struct InputContext {
    buffer: ComposingBuffer,
    english_mode: bool,
    predict_enabled: bool,
    ghost_text: String,
    prediction_source: String,
    candidates: CandidateListState,
    ghost_session: GhostSession,
    lexicon: Arc<Lexicon>,
    surrounding: Option<Surrounding>,
    prev_page_keys: Vec<u32>,
    next_page_keys: Vec<u32>,
}

impl InputContext {
    pub fn new(lexicon: Arc<Lexicon>, client: Arc<dyn PredictClient>) -> Self {
        Self {
            buffer: ComposingBuffer::new(),
            english_mode: false,
            predict_enabled: true,
            ghost_text: String::new(),
            prediction_source: String::new(),
            candidates: CandidateListState::new(),
            ghost_session: GhostSession::new(client),
            lexicon,
            surrounding: None,
            prev_page_keys: vec![key::PAGE_UP, '-' as u32],
            next_page_keys: vec![key::PAGE_DOWN, '=' as u32],
        }
    }

    /// Override the host's configured pagination key lists.
    pub fn set_page_keys(&mut self, prev: Vec<u32>, next: Vec<u32>) {
        self.prev_page_keys = prev;
        self.next_page_keys = next;
    }

    /// Full reset: buffer, candidates, ghost, prediction cache. Called on
    /// Escape, on mode toggles, and when the context loses focus; a live
    /// ghost must never survive a focus change.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.ghost_session.clear_ghost();
        self.ghost_text.clear();
        self.prediction_source.clear();
        self.candidates.clear();
    }

    /// Engine-level reset from the host (panel dismissed): drops the
    /// composition but leaves the prediction cache alone.
    pub fn on_host_reset(&mut self) {
        self.buffer.clear();
        self.candidates.clear();
    }

    /// Recompute candidates or the ghost prediction from current state.
    /// Hosts call this on focus-in and after surrounding-text updates.
    pub fn refresh(&mut self) {
        self.refresh_prediction("");
    }

    /// Store the host's surrounding-text snapshot. Invalid snapshots and
    /// non-UTF-8 text clear it, which suppresses prediction context.
    pub fn update_surrounding(&mut self, bytes: &[u8], cursor_chars: usize, valid: bool) {
        if !valid {
            self.surrounding = None;
            return;
        }
        match std::str::from_utf8(bytes) {
            Ok(text) => {
                self.surrounding = Some(Surrounding {
                    text: text.to_string(),
                    cursor_chars,
                });
            }
            Err(_) => self.surrounding = None,
        }
    }

    pub fn clear_surrounding(&mut self) {
        self.surrounding = None;
    }

    pub fn is_composing(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn english_mode(&self) -> bool {
        self.english_mode
    }

    pub fn predict_enabled(&self) -> bool {
        self.predict_enabled
    }

    pub fn ghost_text(&self) -> &str {
        &self.ghost_text
    }

    pub fn prediction_source(&self) -> &str {
        &self.prediction_source
    }

    pub fn merged_candidates(&self) -> &[String] {
        self.candidates.entries()
    }

    pub fn buffer_text(&self) -> &str {
        self.buffer.user_input()
    }
}
