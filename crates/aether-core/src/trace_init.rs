//! Optional JSON-lines tracing for the front-end hosts.
//!
//! Both front-ends live inside host processes that own stderr, so traces go
//! to a rotated file under a host-chosen log directory. The text service
//! can be unloaded, so the flush guard is handed back to the host instead
//! of living for the whole process.

use std::path::Path;

/// Keeps the non-blocking writer alive; drop it on host teardown to flush.
pub struct TraceGuard {
    #[cfg(feature = "trace")]
    _worker: tracing_appender::non_blocking::WorkerGuard,
}

#[cfg(feature = "trace")]
pub fn init_tracing(log_dir: &Path) -> Option<TraceGuard> {
    use std::sync::atomic::{AtomicBool, Ordering};

    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    // Activate/Deactivate cycles may call in more than once; the subscriber
    // can only be installed for the first.
    static ACTIVE: AtomicBool = AtomicBool::new(false);
    if ACTIVE.swap(true, Ordering::SeqCst) {
        return None;
    }

    let appender = tracing_appender::rolling::daily(log_dir, "aetherime-frontend.jsonl");
    let (writer, worker) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("aether_core=debug,aether_session=debug,aether_shell=debug")
    });

    tracing_subscriber::fmt()
        .json()
        .with_writer(writer)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(filter)
        .init();

    Some(TraceGuard { _worker: worker })
}

#[cfg(not(feature = "trace"))]
pub fn init_tracing(_log_dir: &Path) -> Option<TraceGuard> {
    None
}
