
use std::collections::HashSet;

use crate::host::{CompositionId, EditContext, EditOps, HostSurface, Selection};

/// In-memory document standing in for the host: a char vector, a selection,
/// at most one live composition, and a set of attributed compositions.
pub(crate) struct MockHost {
    chars: Vec<char>,
    selection: Selection,
    sensitive: bool,
    refuse_compositions: bool,
    live: Option<LiveComposition>,
    attributed: HashSet<u64>,
    next_id: u64,
}

struct LiveComposition {
    id: CompositionId,
    start: usize,
    chars: usize,
}

impl MockHost {
    pub(crate) fn with_text(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let caret = chars.len();
        Self {
            chars,
            selection: Selection::caret(caret),
            sensitive: false,
            refuse_compositions: false,
            live: None,
            attributed: HashSet::new(),
            next_id: 1,
        }
    }

    pub(crate) fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub(crate) fn caret(&self) -> usize {
        self.selection.start
    }

    pub(crate) fn select(&mut self, start: usize, end: usize) {
        self.selection = Selection { start, end };
    }

    pub(crate) fn set_sensitive(&mut self, sensitive: bool) {
        self.sensitive = sensitive;
    }

    pub(crate) fn refuse_compositions(&mut self) {
        self.refuse_compositions = true;
    }

    /// Simulate the user typing at the caret (the host would then report a
    /// document edit). A live composition range shifts the way host ranges
    /// do.
    pub(crate) fn type_text(&mut self, text: &str) {
        let at = self.selection.start;
        let inserted = text.chars().count();
        for (offset, c) in text.chars().enumerate() {
            self.chars.insert(at + offset, c);
        }
        if let Some(live) = self.live.as_mut() {
            if at <= live.start {
                live.start += inserted;
            } else if at < live.start + live.chars {
                live.chars += inserted;
            }
        }
        self.selection = Selection::caret(at + inserted);
    }

    pub(crate) fn live_id(&self) -> Option<CompositionId> {
        self.live.as_ref().map(|live| live.id)
    }

    pub(crate) fn has_attribute(&self) -> bool {
        !self.attributed.is_empty()
    }

    /// Simulate the app terminating the composition itself: the handle dies
    /// but the text stays.
    pub(crate) fn terminate_composition(&mut self) -> Option<CompositionId> {
        self.live.take().map(|live| live.id)
    }
}

impl EditContext for MockHost {
    fn selection(&self) -> Option<Selection> {
        Some(self.selection)
    }

    fn text_before(&self, pos: usize, max_chars: usize) -> String {
        let pos = pos.min(self.chars.len());
        let start = pos.saturating_sub(max_chars);
        self.chars[start..pos].iter().collect()
    }

    fn is_sensitive(&self) -> bool {
        self.sensitive
    }
}

impl EditOps for MockHost {
    fn start_composition(&mut self, at: usize) -> Option<CompositionId> {
        if self.refuse_compositions || self.live.is_some() || at > self.chars.len() {
            return None;
        }
        let id = CompositionId(self.next_id);
        self.next_id += 1;
        self.live = Some(LiveComposition { id, start: at, chars: 0 });
        Some(id)
    }

    fn set_composition_text(&mut self, id: CompositionId, text: &str) -> bool {
        let Some(live) = self.live.as_mut() else {
            return false;
        };
        if live.id != id {
            return false;
        }
        let new_chars: Vec<char> = text.chars().collect();
        let new_len = new_chars.len();
        self.chars.splice(live.start..live.start + live.chars, new_chars);
        live.chars = new_len;
        true
    }

    fn set_ghost_attribute(&mut self, id: CompositionId) -> bool {
        if self.live.as_ref().map(|live| live.id) != Some(id) {
            return false;
        }
        self.attributed.insert(id.0);
        true
    }

    fn clear_ghost_attribute(&mut self, id: CompositionId) -> bool {
        self.attributed.remove(&id.0)
    }

    fn end_composition(&mut self, id: CompositionId) {
        if self.live.as_ref().map(|live| live.id) == Some(id) {
            self.live = None;
        }
    }

    fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }
}

impl HostSurface for MockHost {
    fn with_edit_session(&mut self, f: &mut dyn FnMut(&mut dyn EditOps)) {
        f(self);
    }

    fn with_read_session(&self, f: &mut dyn FnMut(&dyn EditContext)) {
        f(self);
    }
}
