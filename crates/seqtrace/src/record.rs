//! Trace records and the buffer handed to reporting code.

use std::slice;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use seqtrace_signal::{CodeUnitId, SequencePoint};

/// One captured signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceRecord {
    timestamp: DateTime<Utc>,
    unit: CodeUnitId,
    point: SequencePoint,
}

impl TraceRecord {
    pub(crate) const fn new(
        timestamp: DateTime<Utc>,
        unit: CodeUnitId,
        point: SequencePoint,
    ) -> Self {
        Self {
            timestamp,
            unit,
            point,
        }
    }

    /// Wall-clock time the signal was captured.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Code unit that emitted the signal.
    #[must_use]
    pub const fn unit(&self) -> CodeUnitId {
        self.unit
    }

    /// Sequence point that was reached.
    #[must_use]
    pub const fn point(&self) -> SequencePoint {
        self.point
    }
}

/// Records of one finished session, in capture order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceBuffer {
    records: Vec<TraceRecord>,
    dropped: u64,
}

impl TraceBuffer {
    pub(crate) const fn new(records: Vec<TraceRecord>, dropped: u64) -> Self {
        Self { records, dropped }
    }

    /// Number of records kept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Signals that arrived after the record cap was reached.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Whether any signal was dropped because of the record cap.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.dropped != 0
    }

    #[must_use]
    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    pub fn iter(&self) -> slice::Iter<'_, TraceRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn into_records(self) -> Vec<TraceRecord> {
        self.records
    }
}

impl IntoIterator for TraceBuffer {
    type Item = TraceRecord;
    type IntoIter = std::vec::IntoIter<TraceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a TraceBuffer {
    type Item = &'a TraceRecord;
    type IntoIter = slice::Iter<'a, TraceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Wall clock anchored once per session and advanced by a monotonic clock.
///
/// Timestamps from one clock never go backwards, even if the system time is
/// adjusted while the session runs.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SessionClock {
    wall: DateTime<Utc>,
    start: Instant,
}

impl SessionClock {
    pub(crate) fn start() -> Self {
        Self {
            wall: Utc::now(),
            start: Instant::now(),
        }
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        TimeDelta::from_std(self.start.elapsed())
            .ok()
            .and_then(|delta| self.wall.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
