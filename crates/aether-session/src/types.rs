use aether_core::settings::settings;

// X11 keysym values for the keys the state machine dispatches on.
pub mod key {
    pub const SPACE: u32 = 0x20;
    pub const SEMICOLON: u32 = 0x3b;
    pub const BACKSPACE: u32 = 0xff08;
    pub const TAB: u32 = 0xff09;
    pub const RETURN: u32 = 0xff0d;
    pub const ESCAPE: u32 = 0xff1b;
    pub const UP: u32 = 0xff52;
    pub const DOWN: u32 = 0xff54;
    pub const PAGE_UP: u32 = 0xff55;
    pub const PAGE_DOWN: u32 = 0xff56;
}

/// One key press, as delivered by the host after release filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub sym: u32,
    pub ctrl: bool,
}

impl KeyEvent {
    pub fn plain(sym: u32) -> Self {
        Self { sym, ctrl: false }
    }

    pub fn ctrl(sym: u32) -> Self {
        Self { sym, ctrl: true }
    }

    pub fn chr(c: char) -> Self {
        Self::plain(c as u32)
    }
}

/// What the host should do after a key was dispatched.
///
/// `commit` text goes into the document; `ui_changed` means the panel and
/// preedit must be re-rendered from [`ui_state`](crate::InputContext::ui_state).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyOutcome {
    pub eaten: bool,
    pub commit: Option<String>,
    pub ui_changed: bool,
}

impl KeyOutcome {
    pub(crate) fn pass() -> Self {
        Self::default()
    }

    pub(crate) fn eaten() -> Self {
        Self {
            eaten: true,
            ..Self::default()
        }
    }

    pub(crate) fn eaten_with_ui() -> Self {
        Self {
            eaten: true,
            commit: None,
            ui_changed: true,
        }
    }
}

/// Inline text styles the host maps onto its preedit format flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    /// The composing code (highlighted).
    Highlight,
    /// Grey italic completion, not yet committed.
    Ghost,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreeditRun {
    pub text: String,
    pub style: TextStyle,
}

/// Snapshot the host renders after `ui_changed`.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub preedit: Vec<PreeditRun>,
    pub candidates: Option<CandidatePage>,
    pub mode_label: String,
    pub status: String,
    pub active: bool,
}

/// The visible page of the candidate list.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePage {
    pub entries: Vec<String>,
    /// Cursor index within `entries`.
    pub cursor: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

/// Host surrounding-text snapshot, kept only while valid UTF-8.
#[derive(Debug, Clone)]
pub(crate) struct Surrounding {
    pub text: String,
    /// Caret position in code points.
    pub cursor_chars: usize,
}

// ---------------------------------------------------------------------------
// Candidate list state
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub(crate) struct CandidateListState {
    entries: Vec<String>,
    /// Cursor as a global index into `entries`.
    cursor: usize,
    page: usize,
    page_size: usize,
}

impl CandidateListState {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            page: 0,
            page_size: settings().candidates.page_size,
        }
    }

    pub(crate) fn set_entries(&mut self, entries: Vec<String>) {
        self.entries = entries;
        self.cursor = 0;
        self.page = 0;
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
        self.page = 0;
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[String] {
        &self.entries
    }

    pub(crate) fn first(&self) -> Option<&String> {
        self.entries.first()
    }

    pub(crate) fn cursor_next(&mut self) {
        self.cursor = cyclic_index(self.cursor, 1, self.entries.len());
        self.page = self.cursor / self.page_size;
    }

    pub(crate) fn cursor_prev(&mut self) {
        self.cursor = cyclic_index(self.cursor, -1, self.entries.len());
        self.page = self.cursor / self.page_size;
    }

    pub(crate) fn page_next(&mut self) -> bool {
        if (self.page + 1) * self.page_size >= self.entries.len() {
            return false;
        }
        self.page += 1;
        self.cursor = self.page * self.page_size;
        true
    }

    pub(crate) fn page_prev(&mut self) -> bool {
        if self.page == 0 {
            return false;
        }
        self.page -= 1;
        self.cursor = self.page * self.page_size;
        true
    }

    /// Entry for a selection key on the visible page.
    pub(crate) fn page_entry(&self, index_in_page: usize) -> Option<&String> {
        if index_in_page >= self.page_size {
            return None;
        }
        self.entries.get(self.page * self.page_size + index_in_page)
    }

    pub(crate) fn page(&self) -> CandidatePage {
        let start = self.page * self.page_size;
        let end = (start + self.page_size).min(self.entries.len());
        CandidatePage {
            entries: self.entries[start..end].to_vec(),
            cursor: self.cursor - start,
            has_prev: self.page > 0,
            has_next: end < self.entries.len(),
        }
    }
}

pub(crate) fn cyclic_index(current: usize, delta: i32, count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    let c = current as i32;
    let n = count as i32;
    ((c + delta + n) % n) as usize
}

/// Selection keys `1..9,0` map to page indices 0..9.
pub(crate) fn digit_index(sym: u32) -> Option<usize> {
    match sym {
        0x31..=0x39 => Some((sym - 0x31) as usize),
        0x30 => Some(9),
        _ => None,
    }
}

pub(crate) fn is_printable_ascii(sym: u32) -> bool {
    (0x20..=0x7e).contains(&sym)
}
