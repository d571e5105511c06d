// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tracing layer counting warnings and errors for the end-of-run summary.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A `tracing_subscriber::Layer` that tallies warn and error events
#[derive(Debug, Clone, Default)]
pub struct LogTally {
    warnings: Arc<AtomicUsize>,
    errors: Arc<AtomicUsize>,
}

impl LogTally {
    /// Warnings seen so far
    pub fn warnings(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }

    /// Errors seen so far
    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }
}

impl<S> tracing_subscriber::Layer<S> for LogTally
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let counter = match *event.metadata().level() {
            tracing::Level::WARN => &self.warnings,
            tracing::Level::ERROR => &self.errors,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
