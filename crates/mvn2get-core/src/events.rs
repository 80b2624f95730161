//! Event reporting seam between the resolver and its host.
//!
//! The resolver never prints; it hands everything to an [`EventSink`].
//! The default [`TracingSink`] forwards to `tracing`, so embedders that
//! just install a subscriber get sensible logs for free.

use crate::problem::Problem;

/// Receiver for resolver events.
///
/// Implementations must be cheap to call; the resolver reports liberally
/// at `debug`/`trace` level.
pub trait EventSink: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn debug(&self, message: &str);
    fn trace(&self, message: &str);

    /// A problem was recorded in the ledger.
    fn problem(&self, problem: &Problem);

    /// The resolver moved on to new work; suitable for a spinner caption.
    fn progress(&self, message: &str);
}

/// Sink that forwards every event to the `tracing` macros.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn trace(&self, message: &str) {
        tracing::trace!("{message}");
    }

    fn problem(&self, problem: &Problem) {
        tracing::warn!(
            kind = problem.kind.as_str(),
            coordinate = problem.coordinate.as_deref().unwrap_or("-"),
            "{}",
            problem.message
        );
    }

    fn progress(&self, message: &str) {
        tracing::trace!("{message}");
    }
}
