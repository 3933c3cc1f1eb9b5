//! Sequence-point tracing for interpreted code.
//!
//! A [`TraceCollector`] subscribes to a [`SignalEmitter`] for one profiling
//! session and stores every `(unit, point)` signal it receives, stamped with
//! the wall-clock time of capture, in a [`TraceBuffer`].
//!
//! # Example
//!
//! ```ignore
//! use seqtrace::{CollectorConfig, SignalEmitter, profile};
//!
//! let profiled = profile(SignalEmitter::global(), CollectorConfig::default(), || {
//!     engine.run(&script)
//! })?;
//! for record in &profiled.trace {
//!     println!("{} {} {}", record.timestamp(), record.unit(), record.point());
//! }
//! ```
//!
//! # Memory
//!
//! By default a collector keeps every record, so a long session grows without
//! bound. Set [`CollectorConfig::max_records`] to cap it; extra signals are then
//! counted in [`TraceBuffer::dropped`].

mod collector;
mod config;
mod error;
pub mod metrics;
mod record;
mod session;

pub use collector::{ActiveSession, CollectorState, TraceCollector};
pub use config::{CAPACITY_HINT_ENV, CollectorConfig, DEFAULT_CAPACITY_HINT, MAX_RECORDS_ENV};
pub use error::{Result, TraceError};
pub use record::{TraceBuffer, TraceRecord};
pub use session::{Profiled, profile, profile_global};

pub use seqtrace_signal::{
    CodeUnitId, CountingListener, ListenerError, ListenerId, SequencePoint,
    SignalEmitter, SignalListener, emit,
};
