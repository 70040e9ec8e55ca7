use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tracing::warn;

static METRICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_metrics_lock_poison_once(operation: &'static str) {
    if METRICS_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "metrics lock poisoned; recovered inner value");
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub events_per_second: f32,
    pub frame_time_ms: f32,
    pub frames_total: u64,
}

/// Shared read handle for the latest loop metrics; cheap to clone across
/// threads.
#[derive(Clone, Debug)]
pub struct MetricsHandle {
    snapshot: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl Default for MetricsHandle {
    fn default() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(LoopMetricsSnapshot::default())),
        }
    }
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        match self.snapshot.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("write");
                let mut guard = poisoned.into_inner();
                *guard = snapshot;
            }
        }
    }
}

/// Counts frames and delivered events over a host-clock interval.
#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: f64,
    interval_seconds: f64,
    frames: u32,
    events: u32,
    frame_time_sum: f64,
    frames_total: u64,
}

impl MetricsAccumulator {
    pub(crate) fn new(start_seconds: f64, interval_seconds: f64) -> Self {
        Self {
            interval_start: start_seconds,
            interval_seconds: interval_seconds.max(f64::EPSILON),
            frames: 0,
            events: 0,
            frame_time_sum: 0.0,
            frames_total: 0,
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt_seconds: f64) {
        self.frames = self.frames.saturating_add(1);
        self.frames_total = self.frames_total.saturating_add(1);
        self.frame_time_sum += frame_dt_seconds.max(0.0);
    }

    pub(crate) fn record_events(&mut self, count: usize) {
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        self.events = self.events.saturating_add(count);
    }

    pub(crate) fn maybe_snapshot(&mut self, now_seconds: f64) -> Option<LoopMetricsSnapshot> {
        let elapsed = now_seconds - self.interval_start;
        if elapsed < self.interval_seconds {
            return None;
        }

        let elapsed = elapsed.max(f64::EPSILON);
        let frame_time_ms = if self.frames == 0 {
            0.0
        } else {
            (self.frame_time_sum / self.frames as f64) * 1000.0
        };

        let snapshot = LoopMetricsSnapshot {
            fps: (self.frames as f64 / elapsed) as f32,
            events_per_second: (self.events as f64 / elapsed) as f32,
            frame_time_ms: frame_time_ms as f32,
            frames_total: self.frames_total,
        };

        self.interval_start = now_seconds;
        self.frames = 0;
        self.events = 0;
        self.frame_time_sum = 0.0;

        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn poison_lock(lock: &RwLock<LoopMetricsSnapshot>) {
        thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = lock.write().expect("write guard");
                    panic!("poison metrics lock");
                })
                .join();
        });
    }

    #[test]
    fn snapshot_computes_expected_values() {
        let mut accumulator = MetricsAccumulator::new(10.0, 1.0);
        accumulator.record_frame(0.016);
        accumulator.record_frame(0.016);
        accumulator.record_events(3);
        accumulator.record_events(1);

        let snapshot = accumulator
            .maybe_snapshot(11.0)
            .expect("snapshot should be emitted");

        assert!((snapshot.fps - 2.0).abs() < 0.001);
        assert!((snapshot.events_per_second - 4.0).abs() < 0.001);
        assert!((snapshot.frame_time_ms - 16.0).abs() < 0.001);
        assert_eq!(snapshot.frames_total, 2);
    }

    #[test]
    fn snapshot_not_emitted_before_interval() {
        let mut accumulator = MetricsAccumulator::new(0.0, 1.0);
        accumulator.record_frame(0.016);
        assert!(accumulator.maybe_snapshot(0.5).is_none());
    }

    #[test]
    fn interval_counters_reset_but_total_keeps_counting() {
        let mut accumulator = MetricsAccumulator::new(0.0, 1.0);
        accumulator.record_frame(0.5);
        accumulator.maybe_snapshot(1.0).expect("first");
        accumulator.record_frame(0.5);
        let second = accumulator.maybe_snapshot(2.0).expect("second");
        assert!((second.fps - 1.0).abs() < 0.001);
        assert_eq!(second.frames_total, 2);
    }

    #[test]
    fn publish_recovers_after_poison_without_panic() {
        let handle = MetricsHandle::default();
        poison_lock(handle.snapshot.as_ref());

        let expected = LoopMetricsSnapshot {
            fps: 72.0,
            events_per_second: 144.0,
            frame_time_ms: 13.9,
            frames_total: 720,
        };
        handle.publish(expected);
        assert_eq!(handle.snapshot(), expected);
    }
}
