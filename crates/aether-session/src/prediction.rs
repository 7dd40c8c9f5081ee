use tracing::debug;

use aether_core::protocol::{Language, PredictMode};
use aether_core::settings::settings;

use super::InputContext;

impl InputContext {
    /// Recompute what is shown: lexical candidates while composing, a ghost
    /// prediction otherwise. `context_tail` is text just committed that the
    /// host's surrounding snapshot does not include yet.
    pub(crate) fn refresh_prediction(&mut self, context_tail: &str) {
        self.candidates.clear();
        self.prediction_source.clear();
        self.ghost_text.clear();

        if !self.buffer.is_empty() {
            let limit = settings().candidates.max_merged;
            let mut merged = Vec::new();
            append_unique(&mut merged, self.lexical_candidates(), limit);
            self.candidates.set_entries(merged);
            return;
        }

        if !self.predict_enabled {
            return;
        }

        let (prefix, suffix) = self.predict_context(context_tail);
        if prefix.is_empty() && suffix.is_empty() {
            return;
        }

        self.ghost_session.set_language(if self.english_mode {
            Language::En
        } else {
            Language::Zh
        });
        self.ghost_session.set_mode(PredictMode::Fim);
        self.ghost_text = self.ghost_session.on_text_changed(&prefix, &suffix);
        if let Some(prediction) = self.ghost_session.last_prediction() {
            self.prediction_source = prediction.source.clone();
        }
        if !self.ghost_text.is_empty() {
            debug!(chars = self.ghost_text.chars().count(), "ghost updated");
        }
    }

    fn lexical_candidates(&self) -> Vec<String> {
        let code = self.buffer.code();
        let language = if self.english_mode {
            Language::En
        } else {
            Language::Zh
        };
        self.lexicon
            .query(language, &code, settings().candidates.max_merged)
    }

    /// Context window around the host caret: up to `prefix_chars` code
    /// points before plus the freshly committed tail, up to `suffix_chars`
    /// after.
    fn predict_context(&self, context_tail: &str) -> (String, String) {
        let mut prefix = String::new();
        let mut suffix = String::new();

        if let Some(surrounding) = &self.surrounding {
            let text = surrounding.text.as_str();
            if !text.is_empty() {
                let window = &settings().context;
                let total_chars = text.chars().count();
                let cursor = surrounding.cursor_chars.min(total_chars);
                let before = window.prefix_chars.min(cursor);
                let after = window.suffix_chars.min(total_chars - cursor);

                let start = byte_offset_at_char(text, cursor - before);
                let caret = byte_offset_at_char(text, cursor);
                let end = byte_offset_at_char(text, cursor + after);

                prefix.push_str(&text[start..caret]);
                suffix.push_str(&text[caret..end]);
            }
        }

        prefix.push_str(context_tail);
        (prefix, suffix)
    }
}

pub(crate) fn append_unique(output: &mut Vec<String>, input: Vec<String>, limit: usize) {
    for entry in input {
        if entry.is_empty() || output.contains(&entry) {
            continue;
        }
        output.push(entry);
        if output.len() >= limit {
            return;
        }
    }
}

fn byte_offset_at_char(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}
