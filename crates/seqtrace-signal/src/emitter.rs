//! Process-wide signal emitter.
//!
//! # Locking
//!
//! The listener set is a copy-on-write snapshot behind a `RwLock`. `attach`
//! and `detach` replace the snapshot under the write lock; `emit` clones the
//! current snapshot under a short read lock and delivers with no lock held.
//! Listeners may therefore attach or detach from inside `on_signal`.
//!
//! A signal already being delivered when a listener detaches may still reach
//! that listener. Listeners that must not see late signals (such as the trace
//! collector) filter them themselves.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use metrics::counter;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::{CodeUnitId, ListenerError, SequencePoint, SignalListener};

/// Metric incremented for every failed listener delivery.
pub const LISTENER_FAILURES_TOTAL: &str = "seqtrace_listener_failures_total";

/// Handle returned by [`SignalEmitter::attach`], used to detach later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Raw id value (unique per emitter).
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

#[derive(Clone)]
struct Registration {
    id: ListenerId,
    listener: Arc<dyn SignalListener>,
}

/// Fan-out point for sequence-point signals.
pub struct SignalEmitter {
    listeners: RwLock<Arc<[Registration]>>,
    /// Mirrors `listeners.len()` so `emit` can bail out without locking.
    active: AtomicUsize,
    next_id: AtomicU64,
    failures: AtomicU64,
}

impl SignalEmitter {
    /// Create an emitter with no listeners.
    ///
    /// Most code should use [`SignalEmitter::global`]; separate instances are
    /// useful for embedding several engines or for isolated tests.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Arc::from(Vec::new())),
            active: AtomicUsize::new(0),
            next_id: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// The process-wide emitter. Created on first use and never reset.
    #[must_use]
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<SignalEmitter> = OnceLock::new();
        GLOBAL.get_or_init(Self::new)
    }

    /// Report that `point` in `unit` was reached.
    ///
    /// Listeners are called in registration order on the current thread.
    /// Listener failures (errors or panics) are contained here.
    #[inline]
    pub fn emit(&self, unit: CodeUnitId, point: SequencePoint) {
        if self.active.load(Ordering::Acquire) == 0 {
            return;
        }
        self.dispatch(unit, point);
    }

    #[inline(never)]
    fn dispatch(&self, unit: CodeUnitId, point: SequencePoint) {
        let snapshot = Arc::clone(&*self.listeners.read());
        for registration in snapshot.iter() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                registration.listener.on_signal(unit, point)
            }))
            .unwrap_or_else(|payload| Err(ListenerError::Panicked(panic_message(&*payload))));

            if let Err(err) = result {
                self.record_failure(registration.id, unit, point, &err);
            }
        }
    }

    #[cold]
    fn record_failure(
        &self,
        id: ListenerId,
        unit: CodeUnitId,
        point: SequencePoint,
        err: &ListenerError,
    ) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        counter!(LISTENER_FAILURES_TOTAL).increment(1);
        warn!(
            listener = id.0,
            unit = %unit,
            point = point.0,
            error = %err,
            "listener failed, signal discarded for this listener"
        );
    }

    /// Attach a listener. It receives every signal emitted from now on.
    pub fn attach(&self, listener: Arc<dyn SignalListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.listeners.write();
        let mut next = Vec::with_capacity(listeners.len() + 1);
        next.extend(listeners.iter().cloned());
        next.push(Registration { id, listener });
        self.active.store(next.len(), Ordering::Release);
        *listeners = Arc::from(next);
        drop(listeners);

        debug!(listener = id.0, "attached signal listener");
        id
    }

    /// Detach a listener.
    ///
    /// Returns `false` if `id` is not attached (never attached, or already
    /// detached); the listener set is left untouched in that case.
    pub fn detach(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        if !listeners.iter().any(|r| r.id == id) {
            return false;
        }
        let next: Vec<Registration> = listeners.iter().filter(|r| r.id != id).cloned().collect();
        self.active.store(next.len(), Ordering::Release);
        *listeners = Arc::from(next);
        drop(listeners);

        debug!(listener = id.0, "detached signal listener");
        true
    }

    /// Number of attached listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Whether any listener is attached, i.e. whether `emit` does any work.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.listener_count() != 0
    }

    /// Total listener failures contained by this emitter.
    #[must_use]
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

impl Default for SignalEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SignalEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalEmitter")
            .field("listeners", &self.listener_count())
            .field("failures", &self.failure_count())
            .finish_non_exhaustive()
    }
}

/// Emit on the process-wide emitter.
#[inline]
pub fn emit(unit: CodeUnitId, point: SequencePoint) {
    SignalEmitter::global().emit(unit, point);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
