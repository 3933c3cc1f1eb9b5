//! Trace collector: captures signals from one emitter for one session.
//!
//! A collector moves through `Created -> Active -> Inactive` exactly once.
//! Only an active collector records signals; a finished collector cannot be
//! reactivated, so each session owns a fresh buffer.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use seqtrace_signal::{
    CodeUnitId, ListenerError, ListenerId, SequencePoint, SignalEmitter, SignalListener,
};
use tracing::{debug, warn};

use crate::config::CollectorConfig;
use crate::error::{Result, TraceError};
use crate::metrics;
use crate::record::{SessionClock, TraceBuffer, TraceRecord};

/// Lifecycle state of a [`TraceCollector`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectorState {
    /// Constructed, not yet subscribed.
    Created,
    /// Subscribed and recording.
    Active,
    /// Unsubscribed; the buffer is final.
    Inactive,
}

/// Capture state shared between the collector and the emitter.
struct Capture {
    recording: bool,
    clock: SessionClock,
    records: Vec<TraceRecord>,
    max_records: Option<usize>,
    dropped: u64,
}

/// The listener half of a collector, attached to the emitter while active.
struct CaptureSink {
    capture: Mutex<Capture>,
}

impl CaptureSink {
    fn new(config: &CollectorConfig) -> Self {
        Self {
            capture: Mutex::new(Capture {
                recording: false,
                clock: SessionClock::start(),
                records: Vec::with_capacity(config.initial_capacity()),
                max_records: config.max_records,
                dropped: 0,
            }),
        }
    }

    /// Append one record. The timestamp is taken under the lock so that the
    /// buffer stays ordered when several threads emit.
    fn capture(&self, unit: CodeUnitId, point: SequencePoint) {
        let mut capture = self.capture.lock();
        if !capture.recording {
            return;
        }
        if capture
            .max_records
            .is_some_and(|max| capture.records.len() >= max)
        {
            capture.dropped += 1;
            let first_drop = capture.dropped == 1;
            let kept = capture.records.len();
            drop(capture);
            if first_drop {
                warn!(kept, "trace buffer full, dropping further signals");
            }
            return;
        }
        let timestamp = capture.clock.now();
        capture
            .records
            .push(TraceRecord::new(timestamp, unit, point));
    }

    fn begin(&self) {
        let mut capture = self.capture.lock();
        capture.clock = SessionClock::start();
        capture.recording = true;
    }

    /// Stop recording. Returns `(records, dropped, elapsed)` for reporting.
    fn seal(&self) -> (usize, u64, Duration) {
        let mut capture = self.capture.lock();
        capture.recording = false;
        (capture.records.len(), capture.dropped, capture.clock.elapsed())
    }
}

impl SignalListener for CaptureSink {
    fn on_signal(
        &self,
        unit: CodeUnitId,
        point: SequencePoint,
    ) -> std::result::Result<(), ListenerError> {
        self.capture(unit, point);
        Ok(())
    }
}

/// Captures every signal delivered while active into an owned [`TraceBuffer`].
///
/// Dropping a collector deactivates it, so a subscription can never outlive
/// its collector.
pub struct TraceCollector<'e> {
    emitter: &'e SignalEmitter,
    config: CollectorConfig,
    sink: Arc<CaptureSink>,
    state: CollectorState,
    listener: Option<ListenerId>,
    elapsed: Option<Duration>,
}

impl<'e> TraceCollector<'e> {
    /// Create a collector with the default configuration.
    #[must_use]
    pub fn new(emitter: &'e SignalEmitter) -> Self {
        Self::build(emitter, CollectorConfig::default())
    }

    /// Create a collector with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::InvalidConfig`] if the config fails validation.
    pub fn with_config(emitter: &'e SignalEmitter, config: CollectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(emitter, config))
    }

    fn build(emitter: &'e SignalEmitter, config: CollectorConfig) -> Self {
        let sink = Arc::new(CaptureSink::new(&config));
        Self {
            emitter,
            config,
            sink,
            state: CollectorState::Created,
            listener: None,
            elapsed: None,
        }
    }

    /// Subscribe to the emitter and start recording.
    ///
    /// Pair with [`TraceCollector::deactivate`] on every exit path, or use
    /// [`TraceCollector::start`] to get a guard that does it for you.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::AlreadyActive`] if already recording and
    /// [`TraceError::SessionEnded`] once the collector has been deactivated.
    pub fn activate(&mut self) -> Result<()> {
        match self.state {
            CollectorState::Created => {}
            CollectorState::Active => return Err(TraceError::AlreadyActive),
            CollectorState::Inactive => return Err(TraceError::SessionEnded),
        }
        self.sink.begin();
        let sink: Arc<dyn SignalListener> = self.sink.clone();
        let id = self.emitter.attach(sink);
        self.listener = Some(id);
        self.state = CollectorState::Active;
        debug!(
            listener = id.get(),
            capacity = self.config.initial_capacity(),
            max_records = ?self.config.max_records,
            "trace collector activated"
        );
        Ok(())
    }

    /// Activate and return a guard that deactivates when dropped.
    ///
    /// # Errors
    ///
    /// Same as [`TraceCollector::activate`].
    pub fn start(&mut self) -> Result<ActiveSession<'_, 'e>> {
        self.activate()?;
        Ok(ActiveSession { collector: self })
    }

    /// Stop recording and unsubscribe.
    ///
    /// Safe to call in any state. Returns `true` only when this call released
    /// a live subscription.
    pub fn deactivate(&mut self) -> bool {
        let previous = std::mem::replace(&mut self.state, CollectorState::Inactive);
        if previous != CollectorState::Active {
            return false;
        }

        // Seal before detaching: a signal already in flight to the sink must
        // not land after deactivation returns.
        let (records, dropped, elapsed) = self.sink.seal();
        if let Some(id) = self.listener.take() {
            self.emitter.detach(id);
        }
        self.elapsed = Some(elapsed);

        metrics::record_session(records, dropped, elapsed);
        debug!(records, dropped, ?elapsed, "trace collector deactivated");
        true
    }

    #[must_use]
    pub const fn state(&self) -> CollectorState {
        self.state
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.state, CollectorState::Active)
    }

    #[must_use]
    pub const fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Duration of the recording window, once deactivated.
    #[must_use]
    pub const fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    /// Records captured so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sink.capture.lock().records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the records captured so far. While active this is a partial view.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TraceRecord> {
        self.sink.capture.lock().records.clone()
    }

    /// Hand the buffer over, consuming the collector.
    ///
    /// Deactivates first if still active, in which case the buffer holds what
    /// was captured up to this call.
    #[must_use]
    pub fn drain(mut self) -> TraceBuffer {
        self.deactivate();
        let mut capture = self.sink.capture.lock();
        let records = std::mem::take(&mut capture.records);
        TraceBuffer::new(records, capture.dropped)
    }
}

impl Drop for TraceCollector<'_> {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl std::fmt::Debug for TraceCollector<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceCollector")
            .field("state", &self.state)
            .field("listener", &self.listener)
            .field("records", &self.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Scoped activation of a [`TraceCollector`].
///
/// The collector is deactivated when this guard is dropped, including during
/// unwinding.
pub struct ActiveSession<'c, 'e> {
    collector: &'c mut TraceCollector<'e>,
}

impl ActiveSession<'_, '_> {
    /// Records captured so far in this session.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collector.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collector.is_empty()
    }

    /// Partial copy of the records captured so far.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TraceRecord> {
        self.collector.snapshot()
    }

    /// End the session now rather than at end of scope.
    pub fn finish(self) {}
}

impl Drop for ActiveSession<'_, '_> {
    fn drop(&mut self) {
        self.collector.deactivate();
    }
}

impl std::fmt::Debug for ActiveSession<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveSession")
            .field("collector", &self.collector)
            .finish()
    }
}
