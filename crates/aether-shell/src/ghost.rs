//! Ghost composition lifecycle: `Idle → Active(range)` and back.
//!
//! At most one styled inline composition is live per context. Every
//! operation runs under the re-entrancy guard; the text-edit observer must
//! treat any edit seen while the guard is raised as self-induced.

use std::cell::Cell;

use tracing::debug;

use crate::host::{CompositionId, EditOps, Selection};

#[derive(Debug, Clone, Copy)]
struct GhostComposition {
    id: CompositionId,
    start: usize,
    chars: usize,
}

pub struct GhostController {
    composition: Option<GhostComposition>,
    ignore_depth: Cell<u32>,
}

/// Scoped increment of the re-entrancy counter; decrements on every exit
/// path, including early returns.
struct EditGuard<'a>(&'a Cell<u32>);

impl<'a> EditGuard<'a> {
    fn enter(depth: &'a Cell<u32>) -> Self {
        depth.set(depth.get() + 1);
        Self(depth)
    }
}

impl Drop for EditGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

impl Default for GhostController {
    fn default() -> Self {
        Self::new()
    }
}

impl GhostController {
    pub fn new() -> Self {
        Self {
            composition: None,
            ignore_depth: Cell::new(0),
        }
    }

    pub fn has_ghost(&self) -> bool {
        self.composition.is_some()
    }

    /// True while one of the controller's own edit sessions is open. The
    /// edit observer must skip clear/schedule for such edits.
    pub fn in_self_edit(&self) -> bool {
        self.ignore_depth.get() > 0
    }

    /// Write `suggestion` as a styled composition at the caret, replacing
    /// any live one. The caret moves back to the composition start so
    /// typing continues in front of the ghost. Returns whether a ghost is
    /// live afterwards.
    pub fn show(&mut self, session: &mut dyn EditOps, suggestion: &str) -> bool {
        let _guard = EditGuard::enter(&self.ignore_depth);

        if suggestion.is_empty() {
            Self::clear_in_guard(&mut self.composition, session);
            return false;
        }
        if self.composition.is_some() {
            Self::clear_in_guard(&mut self.composition, session);
        }

        let Some(selection) = session.selection() else {
            return false;
        };
        if !selection.is_insertion_point() {
            return false;
        }
        let at = selection.start;

        let Some(id) = session.start_composition(at) else {
            debug!("host refused composition");
            return false;
        };
        if !session.set_composition_text(id, suggestion) {
            session.end_composition(id);
            return false;
        }
        session.set_ghost_attribute(id);
        session.set_selection(Selection::caret(at));

        self.composition = Some(GhostComposition {
            id,
            start: at,
            chars: suggestion.chars().count(),
        });
        true
    }

    /// Remove the ghost text and its styling. Idempotent.
    pub fn clear(&mut self, session: &mut dyn EditOps) {
        let _guard = EditGuard::enter(&self.ignore_depth);
        Self::clear_in_guard(&mut self.composition, session);
    }

    fn clear_in_guard(composition: &mut Option<GhostComposition>, session: &mut dyn EditOps) {
        let Some(composition) = composition.take() else {
            return;
        };
        session.clear_ghost_attribute(composition.id);
        session.set_composition_text(composition.id, "");
        session.end_composition(composition.id);
    }

    /// Make the ghost text permanent: drop the styling, end the composition
    /// with its text in place, and put the caret after it. Idempotent;
    /// returns whether a ghost was accepted.
    pub fn accept(&mut self, session: &mut dyn EditOps) -> bool {
        let _guard = EditGuard::enter(&self.ignore_depth);
        let Some(composition) = self.composition.take() else {
            return false;
        };
        session.clear_ghost_attribute(composition.id);
        session.end_composition(composition.id);
        let end = composition.start + composition.chars;
        session.set_selection(Selection::caret(end));
        true
    }

    /// Host-initiated termination (the app ended the composition itself).
    pub fn on_composition_terminated(&mut self, id: CompositionId) {
        if self.composition.map(|c| c.id) == Some(id) {
            self.composition = None;
        }
    }
}
