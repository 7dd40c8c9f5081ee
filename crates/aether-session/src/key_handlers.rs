use tracing::debug_span;

use super::types::{digit_index, is_printable_ascii, key, KeyEvent, KeyOutcome};
use super::InputContext;

impl InputContext {
    /// Dispatch one key press. First match wins; anything not handled while
    /// a composition is active is swallowed so stray keys cannot corrupt
    /// the host document mid-composition.
    pub fn handle_key(&mut self, event: KeyEvent) -> KeyOutcome {
        let _span = debug_span!("handle_key", sym = event.sym, ctrl = event.ctrl).entered();

        // Prediction toggle (Ctrl+;)
        if event.ctrl && event.sym == key::SEMICOLON {
            self.predict_enabled = !self.predict_enabled;
            self.refresh_prediction("");
            return KeyOutcome::eaten_with_ui();
        }

        // English mode toggle (Ctrl+Space)
        if event.ctrl && event.sym == key::SPACE {
            self.english_mode = !self.english_mode;
            self.reset();
            return KeyOutcome::eaten_with_ui();
        }

        // Candidate interaction while the list is visible.
        if !self.candidates.is_empty() {
            if let Some(index) = digit_index(event.sym) {
                if let Some(text) = self.candidates.page_entry(index).cloned() {
                    return self.commit_and_refresh(text);
                }
            }
            if event.sym == key::UP {
                self.candidates.cursor_prev();
                return KeyOutcome::eaten_with_ui();
            }
            if event.sym == key::DOWN {
                self.candidates.cursor_next();
                return KeyOutcome::eaten_with_ui();
            }
            if self.prev_page_keys.contains(&event.sym) {
                let moved = self.candidates.page_prev();
                return KeyOutcome {
                    eaten: true,
                    commit: None,
                    ui_changed: moved,
                };
            }
            if self.next_page_keys.contains(&event.sym) {
                let moved = self.candidates.page_next();
                return KeyOutcome {
                    eaten: true,
                    commit: None,
                    ui_changed: moved,
                };
            }
        }

        if event.sym == key::TAB {
            if !self.ghost_text.is_empty() {
                let text = if self.buffer.is_empty() {
                    self.ghost_text.clone()
                } else {
                    format!("{}{}", self.buffer.user_input(), self.ghost_text)
                };
                return self.commit_and_refresh(text);
            }
            if !self.buffer.is_empty() {
                let text = self.buffer.user_input().to_string();
                return self.commit_and_refresh(text);
            }
            return KeyOutcome::pass();
        }

        if event.sym == key::ESCAPE {
            if !self.buffer.is_empty() || !self.ghost_text.is_empty() {
                self.reset();
                return KeyOutcome::eaten_with_ui();
            }
            return KeyOutcome::pass();
        }

        if event.sym == key::BACKSPACE {
            if !self.buffer.is_empty() && self.buffer.backspace() {
                self.refresh_prediction("");
                return KeyOutcome::eaten_with_ui();
            }
            return KeyOutcome::pass();
        }

        if event.sym == key::RETURN {
            if !self.buffer.is_empty() {
                let text = self.buffer.user_input().to_string();
                return self.commit_and_refresh(text);
            }
            return KeyOutcome::pass();
        }

        if event.sym == key::SPACE {
            if !self.buffer.is_empty() {
                if let Some(first) = self.candidates.first().cloned() {
                    return self.commit_and_refresh(first);
                }
                let text = self.buffer.user_input().to_string();
                return self.commit_and_refresh(text);
            }
            return KeyOutcome::pass();
        }

        // English mode with nothing composed: the app gets the raw key.
        if self.english_mode && self.buffer.is_empty() {
            return KeyOutcome::pass();
        }

        // Plain printable ASCII composes; chorded keys fall through.
        if !event.ctrl && is_printable_ascii(event.sym) && self.buffer.push_sym(event.sym) {
            self.refresh_prediction("");
            return KeyOutcome::eaten_with_ui();
        }

        // Stray keys and remaining chords: swallow mid-composition, pass
        // through otherwise.
        if !self.buffer.is_empty() {
            KeyOutcome::eaten()
        } else {
            KeyOutcome::pass()
        }
    }
}
