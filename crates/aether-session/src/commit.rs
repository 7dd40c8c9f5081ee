use tracing::debug;

use super::types::KeyOutcome;
use super::InputContext;

impl InputContext {
    /// Host-side candidate activation (e.g. a click in the panel).
    pub fn commit_candidate(&mut self, text: String) -> KeyOutcome {
        self.commit_and_refresh(text)
    }

    /// Commit text to the host, drop the whole composition state, then
    /// schedule the follow-up ghost prediction with the committed text as
    /// an extra prefix tail; the host document will not reflect the commit
    /// until after this call returns.
    pub(crate) fn commit_and_refresh(&mut self, text: String) -> KeyOutcome {
        if text.is_empty() {
            return KeyOutcome::eaten();
        }
        debug!(chars = text.chars().count(), "commit");

        self.buffer.clear();
        self.candidates.clear();
        self.prediction_source.clear();
        self.ghost_text.clear();
        self.ghost_session.clear_ghost();
        self.refresh_prediction(&text);

        KeyOutcome {
            eaten: true,
            commit: Some(text),
            ui_changed: true,
        }
    }
}
