//! Sequence-point signals for interpreted code.
//!
//! An execution engine calls [`emit`] (or [`SignalEmitter::emit`]) each time a
//! compiled code unit reaches one of its sequence points. Listeners attached to
//! the emitter receive the `(unit, point)` pair synchronously on the emitting
//! thread.
//!
//! ```ignore
//! use std::sync::Arc;
//! use seqtrace_signal::{CodeUnitId, SignalEmitter, SequencePoint};
//!
//! let emitter = SignalEmitter::global();
//! let id = emitter.attach(Arc::new(MyListener::default()));
//!
//! let unit = CodeUnitId::new();
//! emitter.emit(unit, SequencePoint(0));
//!
//! emitter.detach(id);
//! ```
//!
//! With no listener attached, `emit` is a single atomic load and can stay in
//! hot interpreter paths.

mod emitter;
mod id;
mod listener;

pub use emitter::{LISTENER_FAILURES_TOTAL, ListenerId, SignalEmitter, emit};
pub use id::{CodeUnitId, SequencePoint};
pub use listener::{CountingListener, ListenerError, SignalListener};
