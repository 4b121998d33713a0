//! Owns the `cpal` output device and stream, one per currently-active
//! [`Family`]. Grounded on `player.rs`'s `init_cpal`/`create_stream`/
//! `write_audio` trio, generalised from a single hardcoded sample type to
//! whatever the negotiated [`AudioFormat`] and the device's native sample
//! format require.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat as CpalSampleFormat, SizedSample, StreamConfig};

use crate::error::{PlaybackError, Result};
use crate::format::AudioFormat;

/// Invoked once per device buffer request. Writes up to `out.len() /
/// channels` interleaved F32 frames into `out`, returning the number of
/// frames actually produced (the rest is filled with silence by the
/// caller). Must never allocate or block — this runs on the real-time
/// audio thread.
pub type AudioCallback = Box<dyn FnMut(&mut [f32]) -> usize + Send>;

/// Owns the live output stream. `cleanup` guarantees no callback is mid-flight
/// when it returns, per spec.md §4.3.
pub struct DeviceHost {
    stream: Option<cpal::Stream>,
    format: Option<AudioFormat>,
    master_volume: Arc<AtomicU32>,
    replaygain_gain: Arc<AtomicU32>,
    in_flight: Arc<AtomicUsize>,
    running: Arc<AtomicBool>,
}

impl Default for DeviceHost {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceHost {
    pub fn new() -> Self {
        Self {
            stream: None,
            format: None,
            master_volume: Arc::new(AtomicU32::new(1.0f32.to_bits())),
            replaygain_gain: Arc::new(AtomicU32::new(1.0f32.to_bits())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Tears down any existing stream and opens a new one matching `format`
    /// as closely as the default output device supports, wiring `callback`
    /// as the frame producer.
    pub fn init(&mut self, format: AudioFormat, callback: AudioCallback) -> Result<()> {
        self.cleanup();

        let device = cpal::default_host()
            .default_output_device()
            .ok_or_else(|| PlaybackError::device("no output device available"))?;

        let supported = device
            .supported_output_configs()
            .map_err(|e| PlaybackError::device(format!("error querying output configs: {e}")))?
            .find(|range| {
                range.channels() == format.channels
                    && range.min_sample_rate().0 <= format.sample_rate_hz
                    && range.max_sample_rate().0 >= format.sample_rate_hz
            })
            .ok_or_else(|| PlaybackError::device("no matching output config"))?
            .with_sample_rate(cpal::SampleRate(format.sample_rate_hz));

        let sample_format = supported.sample_format();
        let stream_config: StreamConfig = supported.into();

        let in_flight = self.in_flight.clone();
        let master_volume = self.master_volume.clone();
        let replaygain_gain = self.replaygain_gain.clone();

        let stream = match sample_format {
            CpalSampleFormat::I16 => build_stream::<i16>(
                &device,
                &stream_config,
                callback,
                in_flight,
                master_volume,
                replaygain_gain,
            )?,
            CpalSampleFormat::I32 => build_stream::<i32>(
                &device,
                &stream_config,
                callback,
                in_flight,
                master_volume,
                replaygain_gain,
            )?,
            CpalSampleFormat::F32 => build_stream::<f32>(
                &device,
                &stream_config,
                callback,
                in_flight,
                master_volume,
                replaygain_gain,
            )?,
            other => {
                return Err(PlaybackError::device(format!(
                    "unsupported device sample format: {other:?}"
                )))
            }
        };

        self.stream = Some(stream);
        self.format = Some(format);
        log::debug!(
            "device initialised: {} ch @ {} Hz",
            format.channels,
            format.sample_rate_hz
        );
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        if let Some(stream) = &self.stream {
            stream
                .play()
                .map_err(|e| PlaybackError::device(format!("failed to start stream: {e}")))?;
            self.running.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        if let Some(stream) = &self.stream {
            stream
                .pause()
                .map_err(|e| PlaybackError::device(format!("failed to stop stream: {e}")))?;
            self.running.store(false, Ordering::SeqCst);
        }
        Ok(())
    }

    /// Drops the stream (blocking until `cpal` joins its internal thread)
    /// and then spins briefly to let any last in-flight callback finish
    /// touching its captured state.
    pub fn cleanup(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.stream = None;
        self.format = None;

        let deadline = Instant::now() + Duration::from_millis(500);
        while self.in_flight.load(Ordering::SeqCst) > 0 && Instant::now() < deadline {
            std::thread::yield_now();
        }
    }

    pub fn set_master_volume(&self, percent: u8) {
        let clamped = percent.min(100) as f32 / 100.0;
        self.master_volume
            .store(clamped.to_bits(), Ordering::Relaxed);
    }

    pub fn master_volume_fraction(&self) -> f32 {
        f32::from_bits(self.master_volume.load(Ordering::Relaxed))
    }

    /// Sets the linear ReplayGain multiplier applied underneath the user's
    /// master volume, e.g. `10f32.powf(gain_db / 20.0)`.
    pub fn set_replaygain_gain(&self, linear_gain: f32) {
        self.replaygain_gain
            .store(linear_gain.max(0.0).to_bits(), Ordering::Relaxed);
    }

    pub fn replaygain_gain(&self) -> f32 {
        f32::from_bits(self.replaygain_gain.load(Ordering::Relaxed))
    }

    pub fn current_format(&self) -> Option<AudioFormat> {
        self.format
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    stream_config: &StreamConfig,
    mut callback: AudioCallback,
    in_flight: Arc<AtomicUsize>,
    master_volume: Arc<AtomicU32>,
    replaygain_gain: Arc<AtomicU32>,
) -> Result<cpal::Stream>
where
    T: SizedSample + cpal::FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();
    let err_fn = |err| log::error!("audio stream error: {err}");

    let cpal_callback = move |data: &mut [T], _info: &cpal::OutputCallbackInfo| {
        in_flight.fetch_add(1, Ordering::SeqCst);
        if scratch.len() < data.len() {
            scratch.resize(data.len(), 0.0);
        }
        for s in scratch[..data.len()].iter_mut() {
            *s = 0.0;
        }
        // Frames the callback didn't fill are left at the zero fill above,
        // i.e. silence.
        let _produced = callback(&mut scratch[..data.len()]);
        let volume = f32::from_bits(master_volume.load(Ordering::Relaxed))
            * f32::from_bits(replaygain_gain.load(Ordering::Relaxed));
        for (d, s) in data.iter_mut().zip(scratch[..data.len()].iter()) {
            *d = T::from_sample(s * volume);
        }
        in_flight.fetch_sub(1, Ordering::SeqCst);
    };

    device
        .build_output_stream(stream_config, cpal_callback, err_fn, None)
        .map_err(|e| PlaybackError::device(format!("failed to build output stream: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_round_trips_through_bit_storage() {
        let host = DeviceHost::new();
        host.set_master_volume(50);
        assert!((host.master_volume_fraction() - 0.5).abs() < 1e-6);
        host.set_master_volume(255);
        assert!((host.master_volume_fraction() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn new_host_has_no_format() {
        let host = DeviceHost::new();
        assert!(host.current_format().is_none());
        assert!(!host.is_running());
    }
}
