use std::time::{Duration, Instant};

/// Loop health over one reporting interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    pub peak_actor_count: usize,
    pub dropped_ticks: u32,
}

/// Counts frames, ticks and dropped backlog until the interval elapses, then reports and
/// starts over.
#[derive(Debug)]
pub(crate) struct LoopMetrics {
    window_start: Instant,
    interval: Duration,
    frames: u32,
    ticks: u32,
    dropped_ticks: u32,
    peak_actor_count: usize,
    frame_time_total: Duration,
}

impl LoopMetrics {
    pub(crate) fn new(interval: Duration) -> Self {
        Self::starting_at(Instant::now(), interval)
    }

    fn starting_at(window_start: Instant, interval: Duration) -> Self {
        Self {
            window_start,
            interval,
            frames: 0,
            ticks: 0,
            dropped_ticks: 0,
            peak_actor_count: 0,
            frame_time_total: Duration::ZERO,
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time_total = self.frame_time_total.saturating_add(frame_dt);
    }

    pub(crate) fn record_tick(&mut self, actor_count: usize) {
        self.ticks = self.ticks.saturating_add(1);
        self.peak_actor_count = self.peak_actor_count.max(actor_count);
    }

    /// Backlog thrown away by the tick planner, counted in whole fixed steps.
    pub(crate) fn record_dropped(&mut self, dropped_backlog: Duration, fixed_dt: Duration) {
        let steps = dropped_backlog.as_nanos() / fixed_dt.as_nanos().max(1);
        let steps = u32::try_from(steps).unwrap_or(u32::MAX);
        self.dropped_ticks = self.dropped_ticks.saturating_add(steps);
    }

    pub(crate) fn take_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval {
            return None;
        }
        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = match self.frames {
            0 => 0.0,
            frames => self.frame_time_total.as_secs_f32() * 1000.0 / frames as f32,
        };
        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / seconds,
            tps: self.ticks as f32 / seconds,
            frame_time_ms,
            peak_actor_count: self.peak_actor_count,
            dropped_ticks: self.dropped_ticks,
        };
        *self = Self::starting_at(now, self.interval);
        Some(snapshot)
    }
}
