//! Monotonic elapsed-time accounting with pause/seek offsets.
//!
//! Grounded on `src/ops/playback_clock.c` in the original source: a
//! monotonic `start` instant plus a running `seek_elapsed`/
//! `seek_accumulated` offset and a `total_pause` subtraction, recomputed on
//! each `tick`.

use std::time::{Duration, Instant};

/// Playback timing state for the currently-loaded song.
///
/// `tick` is driven by the control thread at roughly 10 Hz; `flush_seek` is
/// called at decoder-safe points (i.e. when the engine is about to honour a
/// seek on the next callback entry).
#[derive(Debug)]
pub struct Clock {
    start: Instant,
    pause_start: Instant,
    total_pause_seconds: f64,
    pause_seconds: f64,
    seek_accumulated_seconds: f64,
    seek_elapsed: f64,
    elapsed_seconds: f64,
    stopped: bool,
    paused: bool,
}

impl Clock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            pause_start: now,
            total_pause_seconds: 0.0,
            pause_seconds: 0.0,
            seek_accumulated_seconds: 0.0,
            seek_elapsed: 0.0,
            elapsed_seconds: 0.0,
            stopped: true,
            paused: false,
        }
    }

    /// Zero elapsed, pause totals and seek-elapsed; stamp `start = now`.
    /// Called on every new song.
    pub fn reset(&mut self) {
        self.elapsed_seconds = 0.0;
        self.pause_seconds = 0.0;
        self.total_pause_seconds = 0.0;
        self.seek_elapsed = 0.0;
        self.seek_accumulated_seconds = 0.0;
        self.start = Instant::now();
        self.stopped = false;
        self.paused = false;
    }

    pub fn set_stopped(&mut self, stopped: bool) {
        self.stopped = stopped;
    }

    pub fn stopped(&self) -> bool {
        self.stopped
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    /// Enter the paused state; records `pause_start`.
    pub fn pause(&mut self) {
        self.pause_start = Instant::now();
        self.paused = true;
    }

    /// Leave the paused state, folding accumulated pause time into the total.
    pub fn resume(&mut self) {
        self.total_pause_seconds += self.pause_seconds;
        self.pause_seconds = 0.0;
        self.paused = false;
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    pub fn add_to_accumulated(&mut self, value: f64) {
        self.seek_accumulated_seconds += value;
    }

    pub fn seek_accumulated_seconds(&self) -> f64 {
        self.seek_accumulated_seconds
    }

    /// `tick(duration)`: advance the elapsed-time estimate. No-op while
    /// stopped. Clamped to `[0, duration]`.
    pub fn tick(&mut self, duration_seconds: f64) {
        if self.stopped {
            return;
        }

        if !self.paused {
            let mut elapsed = self.start.elapsed().as_secs_f64();
            let mut seek_elapsed = self.seek_elapsed;
            let diff =
                elapsed + (seek_elapsed + self.seek_accumulated_seconds - self.total_pause_seconds);
            if diff < 0.0 {
                seek_elapsed -= diff;
            }
            elapsed += seek_elapsed + self.seek_accumulated_seconds - self.total_pause_seconds;

            if elapsed > duration_seconds {
                elapsed = duration_seconds;
            }
            if elapsed < 0.0 {
                elapsed = 0.0;
            }

            self.seek_elapsed = seek_elapsed;
            self.elapsed_seconds = elapsed;
        } else {
            self.pause_seconds = self.pause_start.elapsed().as_secs_f64();
        }
    }

    /// Compute a signed delta (in seconds) between `absolute` and the
    /// current elapsed estimate, and route it through the seek accumulator.
    /// Returns `false` (no state change) when paused.
    pub fn set_position(&mut self, absolute: Duration) -> bool {
        if self.paused {
            return false;
        }
        let step = absolute.as_secs_f64() - self.elapsed_seconds;
        self.seek_accumulated_seconds += step;
        true
    }

    /// Add `offset` (positive or negative) to the seek accumulator. Returns
    /// `false` (no state change) when paused.
    pub fn seek(&mut self, offset_seconds: f64) -> bool {
        if self.paused {
            return false;
        }
        self.seek_accumulated_seconds += offset_seconds;
        true
    }

    /// Fold `seek_accumulated_seconds` into `seek_elapsed`, recompute
    /// elapsed, and return the resulting percentage in `[0, 100]` for the
    /// engine to hand to the decoder as `seek_percent`. Returns `None` if
    /// there was nothing to flush, or seeking is refused (raw AAC; the
    /// caller passes `seekable = false` in that case).
    pub fn flush_seek(&mut self, duration_seconds: f64, seekable: bool) -> Option<f32> {
        if self.seek_accumulated_seconds == 0.0 {
            return None;
        }
        if !seekable {
            self.seek_accumulated_seconds = 0.0;
            return None;
        }

        self.seek_elapsed += self.seek_accumulated_seconds;
        self.seek_accumulated_seconds = 0.0;
        self.tick(duration_seconds);

        let mut percentage = if duration_seconds > 0.0 {
            (self.elapsed_seconds / duration_seconds * 100.0) as f32
        } else {
            0.0
        };

        if percentage < 0.0 {
            self.seek_elapsed = 0.0;
            percentage = 0.0;
        }

        Some(percentage)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn reset_zeroes_elapsed() {
        let mut clock = Clock::new();
        clock.reset();
        clock.tick(180.0);
        assert_eq!(clock.elapsed_seconds(), 0.0);
    }

    #[test]
    fn tick_is_noop_when_stopped() {
        let mut clock = Clock::new();
        clock.set_stopped(true);
        clock.tick(180.0);
        assert_eq!(clock.elapsed_seconds(), 0.0);
    }

    #[test]
    fn tick_clamps_to_duration() {
        let mut clock = Clock::new();
        clock.reset();
        clock.add_to_accumulated(10_000.0);
        clock.flush_seek(180.0, true);
        clock.tick(180.0);
        assert!(clock.elapsed_seconds() <= 180.0);
        assert!(clock.elapsed_seconds() >= 0.0);
    }

    #[test]
    fn pause_resume_accumulates_pause_seconds() {
        let mut clock = Clock::new();
        clock.reset();
        clock.tick(180.0);
        clock.pause();
        sleep(Duration::from_millis(5));
        clock.tick(180.0);
        let before = clock.elapsed_seconds();
        clock.resume();
        clock.tick(180.0);
        // Elapsed should not have jumped backwards across the pause.
        assert!(clock.elapsed_seconds() >= before - 0.001);
    }

    #[test]
    fn seek_rejected_while_paused() {
        let mut clock = Clock::new();
        clock.reset();
        clock.pause();
        assert!(!clock.seek(5.0));
        assert_eq!(clock.seek_accumulated_seconds(), 0.0);
    }

    #[test]
    fn flush_seek_returns_none_for_raw_aac() {
        let mut clock = Clock::new();
        clock.reset();
        clock.add_to_accumulated(5.0);
        assert_eq!(clock.flush_seek(180.0, false), None);
        assert_eq!(clock.seek_accumulated_seconds(), 0.0);
    }

    #[test]
    fn flush_seek_computes_percentage() {
        let mut clock = Clock::new();
        clock.reset();
        clock.add_to_accumulated(90.0);
        let pct = clock.flush_seek(180.0, true).unwrap();
        assert!((pct - 50.0).abs() < 1.0);
    }
}
