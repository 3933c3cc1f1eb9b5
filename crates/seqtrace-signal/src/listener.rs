//! Listener trait and small built-in listeners.

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use crate::{CodeUnitId, SequencePoint};

/// Failure raised by a listener while handling a signal.
///
/// These never reach the emitting code; the emitter logs and counts them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListenerError {
    #[error("listener rejected signal: {0}")]
    Rejected(String),

    #[error("listener panicked: {0}")]
    Panicked(String),
}

/// Receiver of sequence-point signals.
///
/// `on_signal` runs synchronously on the thread executing the observed code,
/// so implementations must not block and should return quickly.
pub trait SignalListener: Send + Sync {
    /// Called once for every signal emitted while this listener is attached.
    fn on_signal(&self, unit: CodeUnitId, point: SequencePoint) -> Result<(), ListenerError>;
}

impl<F> SignalListener for F
where
    F: Fn(CodeUnitId, SequencePoint) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_signal(&self, unit: CodeUnitId, point: SequencePoint) -> Result<(), ListenerError> {
        self(unit, point)
    }
}

/// Listener that only counts signals.
#[derive(Debug, Default)]
pub struct CountingListener {
    signals: AtomicU64,
}

impl CountingListener {
    /// Number of signals received so far.
    #[must_use]
    pub fn signals(&self) -> u64 {
        self.signals.load(Ordering::Relaxed)
    }
}

impl SignalListener for CountingListener {
    fn on_signal(&self, _unit: CodeUnitId, _point: SequencePoint) -> Result<(), ListenerError> {
        self.signals.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
