/// Frame pacing and time measurement.
///
/// One clock per game loop. `wait_for_next_frame` sleeps until a period has
/// passed since the previous frame and records the real gap, which is what
/// the simulation then sees as `elapsed_frame_time` (clamped, so a stall
/// cannot produce one giant step). A rate of 0 means unpaced.

use std::thread;
use std::time::{Duration, Instant};

pub struct FrameClock {
    start: Instant,
    period_ms: u64,
    max_delta_ms: u64,
    prev_frame_ms: u64,
    elapsed_frame_ms: u64,
    frame_count: u64,
}

impl FrameClock {
    pub fn new(fps: u32, max_delta_ms: u64) -> Self {
        FrameClock {
            start: Instant::now(),
            period_ms: if fps == 0 { 0 } else { 1000 / fps as u64 },
            max_delta_ms,
            prev_frame_ms: 0,
            elapsed_frame_ms: 0,
            frame_count: 0,
        }
    }

    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Block until the next frame is due, then record it.
    pub fn wait_for_next_frame(&mut self) {
        let due = self.prev_frame_ms + self.period_ms;
        while self.now_ms() < due {
            thread::sleep(Duration::from_millis(1));
        }
        let now = self.now_ms();
        self.record_frame_at(now);
    }

    /// Record a frame boundary at `now_ms` since the clock started.
    pub fn record_frame_at(&mut self, now_ms: u64) {
        self.elapsed_frame_ms = now_ms.saturating_sub(self.prev_frame_ms);
        self.prev_frame_ms = now_ms;
        self.frame_count += 1;
    }

    /// Milliseconds covered by the last frame, clamped to the configured max.
    pub fn elapsed_frame_time(&self) -> u64 {
        if self.max_delta_ms > 0 {
            self.elapsed_frame_ms.min(self.max_delta_ms)
        } else {
            self.elapsed_frame_ms
        }
    }

    /// Milliseconds since the clock started, as of the last frame.
    pub fn elapsed_total_time(&self) -> u64 {
        self.prev_frame_ms
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Average rate over the whole run.
    pub fn current_fps(&self) -> f64 {
        if self.prev_frame_ms == 0 {
            return 0.0;
        }
        self.frame_count as f64 * 1000.0 / self.prev_frame_ms as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_delta_is_clamped_but_total_is_not() {
        let mut clock = FrameClock::new(30, 100);
        clock.record_frame_at(33);
        assert_eq!(clock.elapsed_frame_time(), 33);
        clock.record_frame_at(1033);
        assert_eq!(clock.elapsed_frame_time(), 100);
        assert_eq!(clock.elapsed_total_time(), 1033);
        assert_eq!(clock.frame_count(), 2);
    }

    #[test]
    fn zero_max_delta_means_unclamped() {
        let mut clock = FrameClock::new(30, 0);
        clock.record_frame_at(5000);
        assert_eq!(clock.elapsed_frame_time(), 5000);
    }

    #[test]
    fn fps_is_average_over_run() {
        let mut clock = FrameClock::new(0, 0);
        assert_eq!(clock.current_fps(), 0.0);
        for i in 1..=20 {
            clock.record_frame_at(i * 50);
        }
        assert!((clock.current_fps() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn waiting_paces_to_the_period() {
        let mut clock = FrameClock::new(100, 0);
        clock.wait_for_next_frame();
        clock.wait_for_next_frame();
        assert!(clock.elapsed_total_time() >= 10);
        assert_eq!(clock.frame_count(), 2);
    }
}
