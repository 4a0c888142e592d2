use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

/// Counters for analyze triggers over the session lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub refused: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_dispatched(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.dispatched += 1;
        }
    }

    pub fn record_succeeded(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.succeeded += 1;
        }
    }

    pub fn record_failed(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.failed += 1;
        }
    }

    pub fn record_refused(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.refused += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = MetricsRecorder::new();
        metrics.record_dispatched();
        metrics.record_dispatched();
        metrics.record_succeeded();
        metrics.record_refused();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.dispatched, 2);
        assert_eq!(snapshot.succeeded, 1);
        assert_eq!(snapshot.refused, 1);
        assert_eq!(snapshot.failed, 0);
    }
}
