//! Wiring between the worker thread, the coordinator, and the ghost
//! controller.
//!
//! All document work happens on the host thread: the worker callback only
//! posts responses into a channel, and [`ShellEngine::pump`] drains it from
//! host-thread message handling. The worker never touches the document.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Instant;

use tracing::debug;

use aether_core::protocol::SuggestionResponse;
use aether_core::settings::settings;
use aether_core::transport::DaemonEndpoint;
use aether_core::worker::PredictionWorker;

use crate::debounce::{RequestCoordinator, ResponseDisposition};
use crate::ghost::GhostController;
use crate::host::{CompositionId, HostSurface};

/// The key classes the shell reacts to while a ghost is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKey {
    Tab,
    Escape,
    /// Shift/Ctrl/Alt and friends: leave the ghost alone.
    Modifier,
    /// Anything else: the user keeps typing, drop the ghost but let the
    /// key through.
    Other,
}

pub struct ShellEngine {
    worker: Option<PredictionWorker>,
    responses: Receiver<SuggestionResponse>,
    response_tx: Sender<SuggestionResponse>,
    coordinator: RequestCoordinator,
    controller: GhostController,
}

impl Default for ShellEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellEngine {
    pub fn new() -> Self {
        let (response_tx, responses) = channel();
        Self {
            worker: None,
            responses,
            response_tx,
            coordinator: RequestCoordinator::new(),
            controller: GhostController::new(),
        }
    }

    /// Start the transport worker against `endpoint`.
    pub fn activate(&mut self, endpoint: DaemonEndpoint) {
        let tx = self.response_tx.clone();
        self.worker = Some(PredictionWorker::start(
            endpoint,
            Box::new(move |response| {
                let _ = tx.send(response);
            }),
        ));
    }

    /// Stop the worker, drop any pending request, and clear the ghost in
    /// the focused context.
    pub fn deactivate(&mut self, host: &mut dyn HostSurface) {
        self.coordinator.cancel_all();
        let controller = &mut self.controller;
        host.with_edit_session(&mut |session| controller.clear(session));
        // Dropping the worker joins its thread.
        self.worker = None;
    }

    pub fn has_ghost(&self) -> bool {
        self.controller.has_ghost()
    }

    /// Focus moved to another context: cancel everything in flight and
    /// clear any ghost left in the previous context.
    pub fn on_focus_change(&mut self, previous: Option<&mut dyn HostSurface>) {
        if let Some(cancel) = self.coordinator.cancel_all() {
            if let Some(worker) = &self.worker {
                worker.send_cancel(cancel.request_id);
            }
        }
        if let Some(host) = previous {
            let controller = &mut self.controller;
            host.with_edit_session(&mut |session| controller.clear(session));
        }
    }

    /// Key sink. Returns whether the key was eaten.
    pub fn on_key_down(&mut self, key: ShellKey, host: &mut dyn HostSurface) -> bool {
        if !self.controller.has_ghost() {
            return false;
        }
        let controller = &mut self.controller;
        match key {
            ShellKey::Tab => {
                host.with_edit_session(&mut |session| {
                    controller.accept(session);
                });
                true
            }
            ShellKey::Escape => {
                host.with_edit_session(&mut |session| controller.clear(session));
                true
            }
            ShellKey::Modifier => false,
            ShellKey::Other => {
                host.with_edit_session(&mut |session| controller.clear(session));
                false
            }
        }
    }

    /// Text-edit sink. Ignores self-induced edits, refuses sensitive
    /// scopes, requires a bare insertion point, then captures the context
    /// before the caret and arms the debouncer.
    pub fn on_document_edit(&mut self, host: &mut dyn HostSurface, now: Instant) {
        if self.controller.in_self_edit() {
            return;
        }

        let mut sensitive = false;
        let mut capture: Option<(String, u32)> = None;
        host.with_read_session(&mut |doc| {
            if doc.is_sensitive() {
                sensitive = true;
                return;
            }
            let Some(selection) = doc.selection() else {
                return;
            };
            if !selection.is_insertion_point() {
                return;
            }
            let before = doc.text_before(selection.start, settings().context.prefix_chars);
            let cursor = before.chars().count() as u32;
            capture = Some((before, cursor));
        });

        // A foreign edit always invalidates a visible ghost.
        if self.controller.has_ghost() {
            let controller = &mut self.controller;
            host.with_edit_session(&mut |session| controller.clear(session));
        }

        if sensitive {
            debug!("sensitive input scope; prediction suppressed");
            return;
        }
        let Some((context, cursor)) = capture else {
            return;
        };
        self.coordinator.note_edit(context, cursor, now);
    }

    /// Host timer tick: send the due request, superseding the previous one.
    pub fn tick(&mut self, now: Instant) {
        let Some(plan) = self.coordinator.take_due(now) else {
            return;
        };
        if let Some(worker) = &self.worker {
            if let Some(cancel) = plan.cancel {
                worker.send_cancel(cancel.request_id);
            }
            worker.send_suggest(plan.request);
        }
    }

    /// Drain worker responses on the host thread and apply the resulting
    /// ghost directives.
    pub fn pump(&mut self, host: &mut dyn HostSurface) {
        while let Ok(response) = self.responses.try_recv() {
            self.apply_response(&response, host);
        }
    }

    pub(crate) fn apply_response(
        &mut self,
        response: &SuggestionResponse,
        host: &mut dyn HostSurface,
    ) {
        let controller = &mut self.controller;
        match self.coordinator.on_response(response) {
            ResponseDisposition::Stale => {}
            ResponseDisposition::Clear => {
                host.with_edit_session(&mut |session| controller.clear(session));
            }
            ResponseDisposition::Show { suggestion, .. } => {
                host.with_edit_session(&mut |session| {
                    controller.show(session, &suggestion);
                });
            }
        }
    }

    /// Host composition-termination callback.
    pub fn on_composition_terminated(&mut self, id: CompositionId) {
        self.controller.on_composition_terminated(id);
    }
}
