//! Session metrics via the `metrics` facade.
//!
//! Nothing here runs per captured signal; sessions are recorded once, when
//! the collector is deactivated. Without an installed recorder every call is
//! a no-op.

use std::time::Duration;

use metrics::{Unit, counter, describe_counter, describe_histogram, histogram};
use seqtrace_signal::LISTENER_FAILURES_TOTAL;

pub const RECORDS_CAPTURED_TOTAL: &str = "seqtrace_records_captured_total";
pub const RECORDS_DROPPED_TOTAL: &str = "seqtrace_records_dropped_total";
pub const SESSIONS_TOTAL: &str = "seqtrace_sessions_total";
pub const SESSION_DURATION_SECONDS: &str = "seqtrace_session_duration_seconds";

/// Register metric descriptions. Call once after installing a recorder.
pub fn init() {
    describe_counter!(
        RECORDS_CAPTURED_TOTAL,
        Unit::Count,
        "Trace records captured across all sessions"
    );
    describe_counter!(
        RECORDS_DROPPED_TOTAL,
        Unit::Count,
        "Signals dropped because a collector hit its record cap"
    );
    describe_counter!(SESSIONS_TOTAL, Unit::Count, "Completed profiling sessions");
    describe_counter!(
        LISTENER_FAILURES_TOTAL,
        Unit::Count,
        "Listener deliveries that returned an error or panicked"
    );
    describe_histogram!(
        SESSION_DURATION_SECONDS,
        Unit::Seconds,
        "Length of the recording window per session"
    );
}

/// Record one finished session.
pub fn record_session(records: usize, dropped: u64, elapsed: Duration) {
    counter!(SESSIONS_TOTAL).increment(1);
    counter!(RECORDS_CAPTURED_TOTAL).increment(u64::try_from(records).unwrap_or(u64::MAX));
    if dropped > 0 {
        counter!(RECORDS_DROPPED_TOTAL).increment(dropped);
    }
    histogram!(SESSION_DURATION_SECONDS).record(elapsed.as_secs_f64());
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use seqtrace_signal::{CodeUnitId, ListenerError, SequencePoint, SignalEmitter};

    use super::testing::MemoryRecorder;
    use super::*;
    use crate::{CollectorConfig, TraceCollector};

    #[test]
    fn test_session_recorded_on_deactivate() {
        let recorder = MemoryRecorder::default();
        metrics::with_local_recorder(&recorder, || {
            init();
            let emitter = SignalEmitter::new();
            let config = CollectorConfig::default().with_max_records(2);
            let mut collector = TraceCollector::with_config(&emitter, config).unwrap();
            collector.activate().unwrap();
            let unit = CodeUnitId::new();
            for point in 0..5 {
                emitter.emit(unit, SequencePoint(point));
            }
            collector.deactivate();
        });

        assert_eq!(recorder.counter(SESSIONS_TOTAL), 1);
        assert_eq!(recorder.counter(RECORDS_CAPTURED_TOTAL), 2);
        assert_eq!(recorder.counter(RECORDS_DROPPED_TOTAL), 3);
        assert_eq!(recorder.histogram_len(SESSION_DURATION_SECONDS), 1);
    }

    #[test]
    fn test_listener_failures_counted() {
        let recorder = MemoryRecorder::default();
        metrics::with_local_recorder(&recorder, || {
            let emitter = SignalEmitter::new();
            emitter.attach(Arc::new(
                |_unit: CodeUnitId, _point: SequencePoint| -> Result<(), ListenerError> {
                    Err(ListenerError::Rejected("nope".into()))
                },
            ));
            emitter.emit(CodeUnitId::new(), SequencePoint(0));
            emitter.emit(CodeUnitId::new(), SequencePoint(1));
        });

        assert_eq!(recorder.counter(LISTENER_FAILURES_TOTAL), 2);
        assert_eq!(recorder.counter(SESSIONS_TOTAL), 0);
    }

    #[test]
    fn test_unused_collector_records_nothing() {
        let recorder = MemoryRecorder::default();
        metrics::with_local_recorder(&recorder, || {
            let emitter = SignalEmitter::new();
            let collector = TraceCollector::new(&emitter);
            drop(collector);
        });
        assert_eq!(recorder.counter(SESSIONS_TOTAL), 0);
    }
}
