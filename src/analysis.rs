//! Shared audio analysis buffer feeding the spectrum visualizer.
//!
//! Single producer (the real-time audio callback) / single consumer (the
//! visualiser). Grounded on `src/sound/audiobuffer.c` (the mono-mix ring
//! with sliding-window overlap) and `src/visuals.c` (window function,
//! 1/3-octave banding, dB mapping, attack/decay smoothing) in the original
//! source.

use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rustfft::{num_complex::Complex32, Fft, FftPlanner};

/// Ring capacity. Matches `MAX_BUFFER_SIZE` in the original source.
pub const MAX_BUFFER_SIZE: usize = 32_768;

const FFT_WINDOW_MILLISECONDS: f32 = 45.0;
const HOP_FRACTION: f32 = 0.25;

pub fn closest_power_of_two(x: usize) -> usize {
    let mut n = 1usize;
    while n < x {
        n <<= 1;
    }
    n
}

/// Chooses window/hop sizes for a given sample rate, per spec.md §3:
/// `window = pow2_at_most(sample_rate * 45ms)`, `hop = window / 4` rounded
/// to a power of two, with `window <= MAX_BUFFER_SIZE` and `hop < window`.
pub fn window_and_hop(sample_rate: u32) -> (usize, usize) {
    let wanted_window = (FFT_WINDOW_MILLISECONDS * sample_rate as f32 / 1000.0) as usize;
    let mut window = closest_power_of_two(wanted_window.max(1));
    if window > MAX_BUFFER_SIZE {
        window = MAX_BUFFER_SIZE;
    }
    let wanted_hop = (window as f32 * HOP_FRACTION) as usize;
    let mut hop = closest_power_of_two(wanted_hop.max(1));
    if hop >= window {
        hop = window / 2;
    }
    (window, hop)
}

/// Single-producer/single-consumer mono mix-down ring, fed once per audio
/// callback invocation.
pub struct AnalysisBuffer {
    samples: Vec<f32>,
    write_head: usize,
    window: usize,
    hop: usize,
    ready: Arc<AtomicBool>,
}

impl AnalysisBuffer {
    pub fn new(sample_rate: u32) -> Self {
        let (window, hop) = window_and_hop(sample_rate);
        Self {
            samples: vec![0.0; MAX_BUFFER_SIZE],
            write_head: 0,
            window,
            hop,
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn reconfigure(&mut self, sample_rate: u32) {
        let (window, hop) = window_and_hop(sample_rate);
        self.window = window;
        self.hop = hop;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.samples.iter_mut().for_each(|s| *s = 0.0);
        self.write_head = 0;
        self.ready.store(false, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Mixes each frame of `frame`-interleaved `channels`-wide audio to
    /// mono and appends it to the ring. Called from the real-time audio
    /// callback: never allocates.
    pub fn push_frames(&mut self, interleaved: &[f32], channels: usize) {
        if channels == 0 {
            return;
        }
        let mut frame_idx = 0usize;
        let num_frames = interleaved.len() / channels;

        while frame_idx < num_frames {
            if self.write_head >= self.window {
                break;
            }
            let frames_left = num_frames - frame_idx;
            let space_left = self.window - self.write_head;
            let frames_to_copy = frames_left.min(space_left);

            for i in 0..frames_to_copy {
                let base = (frame_idx + i) * channels;
                let sum: f32 = interleaved[base..base + channels].iter().sum();
                self.samples[self.write_head] = sum / channels as f32;
                self.write_head += 1;
            }
            frame_idx += frames_to_copy;

            while self.write_head >= self.window {
                self.ready.store(true, Ordering::Release);
                let keep = self.window - self.hop;
                self.samples.copy_within(self.hop..self.window, 0);
                self.write_head -= self.hop;
                let _ = keep;
            }
        }
    }

    /// Snapshot of the current window contents for the consumer. Clears the
    /// `ready` flag.
    pub fn take_window(&self) -> Vec<f32> {
        self.ready.store(false, Ordering::Release);
        self.samples[..self.window].to_vec()
    }
}

/// 4-term Blackman-Harris window, as used by the original visualiser.
fn apply_blackman_harris(buf: &mut [f32]) {
    const A0: f32 = 0.35875;
    const A1: f32 = 0.48829;
    const A2: f32 = 0.14128;
    const A3: f32 = 0.01168;
    let n = buf.len();
    if n <= 1 {
        return;
    }
    for (i, sample) in buf.iter_mut().enumerate() {
        let x = i as f32 / (n - 1) as f32;
        let window = A0 - A1 * (2.0 * PI * x).cos() + A2 * (4.0 * PI * x).cos()
            - A3 * (6.0 * PI * x).cos();
        *sample *= window;
    }
}

/// A single ⅓-octave band bar produced by the analyzer.
#[derive(Debug, Clone, Copy)]
pub struct Bar {
    pub center_freq: f32,
    pub height: f32,
}

/// Consumes windows from an [`AnalysisBuffer`], runs the FFT, and maps
/// magnitudes to smoothed bar heights. Caches its FFT plan by window size
/// (REDESIGN FLAGS, spec.md §9) instead of rebuilding it per call.
pub struct SpectrumAnalyzer {
    planner: FftPlanner<f32>,
    plan_cache: Option<(usize, Arc<dyn Fft<f32>>)>,
    display_magnitudes: Vec<f32>,
    db_floor: f32,
    db_ceil: f32,
    emphasis: f32,
    gate: f32,
    fast_attack: f32,
    slow_attack: f32,
    decay: f32,
    min_freq: f32,
    max_freq: f32,
}

impl SpectrumAnalyzer {
    pub fn new(sample_rate: u32) -> Self {
        let max_freq = 10_000.0_f32.min(sample_rate as f32 / 2.0);
        Self {
            planner: FftPlanner::new(),
            plan_cache: None,
            display_magnitudes: Vec::new(),
            db_floor: -60.0,
            db_ceil: -18.0,
            emphasis: 1.3,
            gate: 0.10,
            fast_attack: 0.6,
            slow_attack: 0.15,
            decay: 0.14,
            min_freq: 25.0,
            max_freq,
        }
    }

    fn plan(&mut self, window: usize) -> Arc<dyn Fft<f32>> {
        if let Some((size, plan)) = &self.plan_cache {
            if *size == window {
                return plan.clone();
            }
        }
        let plan = self.planner.plan_fft_forward(window);
        self.plan_cache = Some((window, plan.clone()));
        plan
    }

    /// Number of ⅓-octave bands between `min_freq` and `max_freq`.
    fn band_count(&self) -> usize {
        let octave_fraction = 1.0 / 3.0;
        (((self.max_freq / self.min_freq).log2() / octave_fraction).floor() as usize) + 1
    }

    fn band_center(&self, index: usize) -> f32 {
        let factor = 2f32.powf(1.0 / 3.0);
        self.min_freq * factor.powi(index as i32)
    }

    /// Runs one analysis pass over `window_samples` (already mono-mixed,
    /// length == the analyzer's configured window) and returns smoothed bar
    /// heights in `[0, 1]`.
    pub fn analyze(&mut self, window_samples: &[f32], sample_rate: u32) -> Vec<Bar> {
        let n = window_samples.len();
        let mut buf: Vec<f32> = window_samples.to_vec();
        apply_blackman_harris(&mut buf);

        let mut spectrum: Vec<Complex32> = buf.iter().map(|s| Complex32::new(*s, 0.0)).collect();
        let fft = self.plan(n);
        fft.process(&mut spectrum);

        let bin_spacing = sample_rate as f32 / n as f32;
        let bands = self.band_count();
        if self.display_magnitudes.len() != bands {
            self.display_magnitudes = vec![0.0; bands];
        }

        let width = 2f32.powf(1.0 / 6.0); // +/- 1/6 octave half-width
        let reference_freq = 1_000.0;
        let correction_per_octave = 3.0;

        let mut bars = Vec::with_capacity(bands);
        for i in 0..bands {
            let center = self.band_center(i);
            let lo = center / width;
            let hi = center * width;
            let bin_lo = (lo / bin_spacing).ceil() as usize;
            let bin_hi = ((hi / bin_spacing).floor() as usize).min(n / 2);

            let mut power = 0.0f32;
            for bin in bin_lo..=bin_hi.max(bin_lo) {
                if bin >= spectrum.len() / 2 {
                    break;
                }
                power += spectrum[bin].norm_sqr();
            }

            let mut db = 10.0 * (power + 1e-12).log10();

            let octaves_above_ref = (center.min(self.max_freq) / reference_freq).log2().max(0.0);
            db += octaves_above_ref * correction_per_octave;

            if db < self.db_floor {
                db = self.db_floor;
            }
            if db > self.db_ceil {
                db = self.db_ceil;
            }

            let ratio = (db - self.db_floor) / (self.db_ceil - self.db_floor);
            let mut height = ratio.powf(self.emphasis);
            if height < self.gate {
                height = 0.0;
            }

            let prev = self.display_magnitudes[i];
            let delta = height - prev;
            let rate = if delta > 0.20 {
                self.fast_attack
            } else if delta > 0.0 {
                self.slow_attack
            } else {
                self.decay
            };
            self.display_magnitudes[i] = prev + delta * rate;

            bars.push(Bar {
                center_freq: center,
                height: self.display_magnitudes[i],
            });
        }

        bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_hop_relationship() {
        let (window, hop) = window_and_hop(44_100);
        assert!(window <= MAX_BUFFER_SIZE);
        assert!(hop < window);
        assert_eq!(window.count_ones(), 1, "window should be a power of two");
        assert_eq!(hop.count_ones(), 1, "hop should be a power of two");
    }

    #[test]
    fn ready_flag_set_exactly_at_window() {
        let mut buf = AnalysisBuffer::new(8_000);
        let window = buf.window();
        let mono = vec![0.5f32; window];
        buf.push_frames(&mono, 1);
        assert!(buf.is_ready());
    }

    #[test]
    fn ready_flag_not_set_below_window() {
        let mut buf = AnalysisBuffer::new(8_000);
        let window = buf.window();
        let mono = vec![0.5f32; window - 1];
        buf.push_frames(&mono, 1);
        assert!(!buf.is_ready());
    }

    #[test]
    fn take_window_clears_ready() {
        let mut buf = AnalysisBuffer::new(8_000);
        let window = buf.window();
        buf.push_frames(&vec![0.1f32; window], 1);
        assert!(buf.is_ready());
        let _ = buf.take_window();
        assert!(!buf.is_ready());
    }

    #[test]
    fn analyzer_produces_bars_in_unit_range() {
        let mut buf = AnalysisBuffer::new(44_100);
        let window = buf.window();
        let samples: Vec<f32> = (0..window)
            .map(|i| (i as f32 * 0.1).sin())
            .collect();
        buf.push_frames(&samples, 1);
        let snapshot = buf.take_window();

        let mut analyzer = SpectrumAnalyzer::new(44_100);
        let bars = analyzer.analyze(&snapshot, 44_100);
        assert!(!bars.is_empty());
        for bar in bars {
            assert!(bar.height >= 0.0 && bar.height <= 1.0);
        }
    }
}
