//! Profiling sessions: one collector wrapped around one execution.

use std::time::Duration;

use seqtrace_signal::SignalEmitter;
use tracing::{debug, info_span};

use crate::collector::TraceCollector;
use crate::config::CollectorConfig;
use crate::error::Result;
use crate::record::TraceBuffer;

/// Result of a profiled execution.
#[derive(Debug)]
pub struct Profiled<T> {
    /// Whatever the execution returned, untouched.
    pub output: T,
    /// Records captured while it ran.
    pub trace: TraceBuffer,
    /// Length of the recording window.
    pub elapsed: Duration,
}

impl<T> Profiled<T> {
    /// Split into output and trace.
    #[must_use]
    pub fn into_parts(self) -> (T, TraceBuffer) {
        (self.output, self.trace)
    }
}

/// Run `execute` with a fresh collector attached to `emitter`.
///
/// The collector is subscribed only for the duration of `execute`. It is
/// unsubscribed on every exit path: if `execute` panics, the panic continues
/// after the subscription is gone. The output is returned as-is, so an
/// execution returning `Err` still yields its trace alongside the error.
///
/// # Errors
///
/// Returns [`crate::TraceError::InvalidConfig`] if `config` is rejected.
/// Activation of a fresh collector cannot otherwise fail.
pub fn profile<T>(
    emitter: &SignalEmitter,
    config: CollectorConfig,
    execute: impl FnOnce() -> T,
) -> Result<Profiled<T>> {
    let _span = info_span!("profile").entered();
    let mut collector = TraceCollector::with_config(emitter, config)?;

    let output = {
        let _session = collector.start()?;
        execute()
    };

    let elapsed = collector.elapsed().unwrap_or_default();
    let trace = collector.drain();
    debug!(
        records = trace.len(),
        dropped = trace.dropped(),
        ?elapsed,
        "profiling session finished"
    );
    Ok(Profiled {
        output,
        trace,
        elapsed,
    })
}

/// [`profile`] on the process-wide emitter with the default configuration.
///
/// # Errors
///
/// See [`profile`].
pub fn profile_global<T>(execute: impl FnOnce() -> T) -> Result<Profiled<T>> {
    profile(SignalEmitter::global(), CollectorConfig::default(), execute)
}
