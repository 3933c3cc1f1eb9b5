use std::collections::HashMap;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};

use seqtrace::{CodeUnitId, TraceBuffer};
use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness. Filter with `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("seqtrace=debug")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Timestamps never decrease across the whole buffer.
pub fn assert_timestamps_ordered(trace: &TraceBuffer) {
    for pair in trace.records().windows(2) {
        assert!(
            pair[0].timestamp() <= pair[1].timestamp(),
            "timestamps out of order: {} then {}",
            pair[0].timestamp(),
            pair[1].timestamp()
        );
    }
}

/// Sequence points grouped by code unit, in buffer order.
pub fn points_by_unit(trace: &TraceBuffer) -> HashMap<CodeUnitId, Vec<u32>> {
    let mut by_unit: HashMap<CodeUnitId, Vec<u32>> = HashMap::new();
    for record in trace {
        by_unit.entry(record.unit()).or_default().push(record.point().0);
    }
    by_unit
}

/// Raises a stop flag when dropped, including during unwinding.
pub struct StopOnDrop<'a>(pub &'a AtomicBool);

impl Drop for StopOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}
