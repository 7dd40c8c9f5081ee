use super::types::{PreeditRun, TextStyle, UiState};
use super::InputContext;

impl InputContext {
    /// Snapshot for the host's panel and preedit rendering.
    pub fn ui_state(&self) -> UiState {
        let active = !self.buffer.is_empty()
            || !self.ghost_text.is_empty()
            || !self.candidates.is_empty();

        let mut preedit = Vec::new();
        if !self.buffer.is_empty() {
            preedit.push(PreeditRun {
                text: self.buffer.user_input().to_string(),
                style: TextStyle::Highlight,
            });
        }
        if !self.ghost_text.is_empty() {
            preedit.push(PreeditRun {
                text: self.ghost_text.clone(),
                style: TextStyle::Ghost,
            });
        }

        let candidates = if self.candidates.is_empty() {
            None
        } else {
            Some(self.candidates.page())
        };

        UiState {
            preedit,
            candidates,
            mode_label: self.mode_label().to_string(),
            status: self.status_line(),
            active,
        }
    }

    pub fn mode_label(&self) -> &'static str {
        if self.english_mode {
            "EN"
        } else {
            "中"
        }
    }

    /// Aux status line: prediction toggle, last prediction source, and
    /// which pinyin backend answers lookups.
    fn status_line(&self) -> String {
        let mut status = String::from(if self.predict_enabled { "AI:on" } else { "AI:off" });
        if !self.prediction_source.is_empty() {
            status.push(' ');
            status.push_str(&self.prediction_source);
        }
        if self.lexicon.available() {
            status.push_str(" PY:libime");
        } else if !self.english_mode {
            status.push_str(" PY:fallback");
        }
        status
    }
}
