//! Text-service front-end core: ghost composition lifecycle and the
//! debounced, cancellable suggestion pipeline.
//!
//! The host owns threads and timers; this crate owns the policy. Document
//! access goes exclusively through the [`host`] seams, always inside the
//! host's scoped edit sessions, and only ever from the host thread.

pub mod debounce;
pub mod engine;
pub mod ghost;
pub mod host;

#[cfg(test)]
mod tests;

pub use debounce::{FirePlan, RequestCoordinator, ResponseDisposition};
pub use engine::{ShellEngine, ShellKey};
pub use ghost::GhostController;
pub use host::{CompositionId, EditContext, EditOps, HostSurface, Selection};
