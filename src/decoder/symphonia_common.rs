//! Shared plumbing over `symphonia`'s `FormatReader`/`Decoder` traits, used
//! by the Builtin, Vorbis and M4a families (WebM and Opus wrap it with
//! extra pre-skip/chaining bookkeeping of their own).

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::{CodecRegistry, Decoder as SymphoniaCodec, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::Time;

use crate::error::{PlaybackError, Result};
use crate::format::{AudioFormat, SampleFormat};

/// A probed reader + codec decoder pair, plus the bookkeeping every family
/// built on symphonia needs: a leftover-sample deque (inner codecs produce
/// whole packets, callers ask for arbitrary frame counts), a frame cursor,
/// and a cached total-frame count.
pub struct SymphoniaSource {
    pub reader: Box<dyn FormatReader>,
    pub codec: Box<dyn SymphoniaCodec>,
    pub track_id: u32,
    pub spec: SignalSpec,
    pub bits_per_sample: Option<u32>,
    pub total_frames: u64,
    pub cursor: u64,
    leftover: Vec<f32>,
}

/// Builds a codec registry containing every codec symphonia enables by
/// default plus the libopus adapter, for the Opus and WebM families.
pub fn registry_with_libopus() -> CodecRegistry {
    let mut registry = CodecRegistry::new();
    symphonia::default::register_enabled_codecs(&mut registry);
    registry.register_all::<symphonia_adapter_libopus::OpusDecoder>();
    registry
}

pub fn open_reader(path: &Path, extension_hint: Option<&str>) -> Result<Box<dyn FormatReader>> {
    let file = File::open(path).map_err(|e| PlaybackError::io(path, e))?;
    let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension_hint {
        hint.with_extension(ext);
    } else if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let format_opts = FormatOptions {
        enable_gapless: true,
        ..Default::default()
    };
    let metadata_opts = MetadataOptions::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .map_err(|e| PlaybackError::decode(format!("probe failed: {e}")))?;

    Ok(probed.format)
}

impl SymphoniaSource {
    pub fn open(path: &Path, extension_hint: Option<&str>) -> Result<Self> {
        let reader = open_reader(path, extension_hint)?;
        Self::from_reader(reader, symphonia::default::get_codecs())
    }

    /// Like [`Self::open`] but resolves the codec from a caller-supplied
    /// registry. Used by the Opus and WebM/Opus families, whose codec
    /// (`symphonia-adapter-libopus`) is not in symphonia's default
    /// registry and must be registered explicitly.
    pub fn open_with_registry(
        path: &Path,
        extension_hint: Option<&str>,
        registry: &CodecRegistry,
    ) -> Result<Self> {
        let reader = open_reader(path, extension_hint)?;
        Self::from_reader(reader, registry)
    }

    pub fn from_reader(reader: Box<dyn FormatReader>, registry: &CodecRegistry) -> Result<Self> {
        let mut reader = reader;
        let track = reader
            .default_track()
            .ok_or_else(|| PlaybackError::decode("no default track"))?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let sample_rate = params
            .sample_rate
            .ok_or_else(|| PlaybackError::decode("missing sample rate"))?;
        let channels = params
            .channels
            .ok_or_else(|| PlaybackError::decode("missing channel layout"))?;
        let spec = SignalSpec::new(sample_rate, channels);
        let total_frames = params.n_frames.unwrap_or(0);
        let bits_per_sample = params.bits_per_sample;

        let codec = registry
            .make(&params, &DecoderOptions::default())
            .map_err(|e| PlaybackError::decode(format!("no codec for track: {e}")))?;

        let _ = &mut reader;
        Ok(Self {
            reader,
            codec,
            track_id,
            spec,
            bits_per_sample,
            total_frames,
            cursor: 0,
            leftover: Vec::new(),
        })
    }

    pub fn channels(&self) -> usize {
        self.spec.channels.count()
    }

    pub fn sample_format(&self) -> SampleFormat {
        match self.bits_per_sample {
            Some(8) => SampleFormat::U8,
            Some(16) => SampleFormat::S16,
            Some(24) => SampleFormat::S24,
            Some(32) => SampleFormat::S32,
            _ => SampleFormat::F32,
        }
    }

    pub fn audio_format(&self) -> AudioFormat {
        AudioFormat::new(
            self.sample_format(),
            self.channels() as u16,
            self.spec.rate,
        )
    }

    /// Reads up to `frame_count` interleaved frames into `out`, pulling
    /// more packets as needed and stashing any partial remainder for the
    /// next call (the leftover-frame buffer spec.md §4.2 calls for on the
    /// WebM family, generalised here since any packet-based codec can
    /// over-produce relative to the caller's request).
    pub fn read_frames(&mut self, out: &mut [f32], frame_count: usize) -> (usize, bool) {
        let channels = self.channels();
        let mut written_frames = 0usize;
        let mut hit_end = false;

        while written_frames < frame_count {
            if !self.leftover.is_empty() {
                let want = (frame_count - written_frames) * channels;
                let take = want.min(self.leftover.len());
                let base = written_frames * channels;
                out[base..base + take].copy_from_slice(&self.leftover[..take]);
                self.leftover.drain(..take);
                written_frames += take / channels;
                continue;
            }

            match self.reader.next_packet() {
                Ok(packet) => {
                    if packet.track_id() != self.track_id {
                        continue;
                    }
                    match self.codec.decode(&packet) {
                        Ok(decoded) => {
                            let spec = *decoded.spec();
                            let duration = decoded.capacity() as u64;
                            let mut sample_buf = SampleBuffer::<f32>::new(duration, spec);
                            sample_buf.copy_interleaved_ref(decoded);
                            self.leftover.extend_from_slice(sample_buf.samples());
                        }
                        Err(SymphoniaError::DecodeError(_)) => {
                            // Skip malformed packets rather than aborting the stream.
                            continue;
                        }
                        Err(_) => {
                            hit_end = true;
                            break;
                        }
                    }
                }
                Err(SymphoniaError::IoError(_)) | Err(SymphoniaError::ResetRequired) => {
                    hit_end = true;
                    break;
                }
                Err(_) => {
                    hit_end = true;
                    break;
                }
            }
        }

        self.cursor += written_frames as u64;
        (written_frames, hit_end)
    }

    pub fn seek_to_frame(&mut self, target: u64) -> Result<()> {
        let clamped = if self.total_frames > 0 {
            target.min(self.total_frames - 1)
        } else {
            target
        };
        let time = Time::from(clamped as f64 / self.spec.rate as f64);
        self.reader
            .seek(
                SeekMode::Accurate,
                SeekTo::Time {
                    time,
                    track_id: Some(self.track_id),
                },
            )
            .map_err(|e| PlaybackError::decode(format!("seek failed: {e}")))?;
        self.codec.reset();
        self.leftover.clear();
        self.cursor = clamped;
        Ok(())
    }
}
