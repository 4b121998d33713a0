//! WebM (Matroska/EBML) container decoder, demuxing to an inner Opus or
//! Vorbis codec.
//!
//! Grounded on `src/sound/webm.h` in the original source: container state
//! (active track, current packet, leftover-frame buffer) plus, for the
//! Opus case, an `opusPreSkip`/`preSkipLeft` pair and an 80 ms (3840
//! sample @ 48 kHz) preroll applied on seek.

use std::path::Path;
use std::sync::OnceLock;

use symphonia::core::codecs::CodecRegistry;

use crate::error::Result;
use crate::format::{AudioFormat, Family};

use super::symphonia_common::{registry_with_libopus, SymphoniaSource};
use super::{Decoder, ReadStatus};

fn codecs() -> &'static CodecRegistry {
    static REGISTRY: OnceLock<CodecRegistry> = OnceLock::new();
    REGISTRY.get_or_init(registry_with_libopus)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InnerCodec {
    Opus,
    Vorbis,
    Other,
}

pub struct WebmDecoder {
    source: SymphoniaSource,
    inner: InnerCodec,
    /// `OpusHead` pre-skip sample count, read from the track's codec
    /// private data (bytes 10..12, little-endian) when present.
    pre_skip: u64,
    /// Remaining pre-skip samples still to be discarded from the current
    /// decode position.
    pre_skip_left: u64,
    /// Frames still to discard between a preroll seek's landing point and
    /// the originally requested absolute frame.
    seek_target_pcm_frame: Option<u64>,
    discard_scratch: Vec<f32>,
}

fn parse_opus_pre_skip(extra_data: &[u8]) -> u64 {
    if extra_data.len() >= 12 && &extra_data[0..8] == b"OpusHead" {
        u16::from_le_bytes([extra_data[10], extra_data[11]]) as u64
    } else {
        0
    }
}

impl WebmDecoder {
    pub fn open(path: &Path) -> Result<Self> {
        let source = SymphoniaSource::open_with_registry(path, Some("webm"), codecs())?;

        let track = source
            .reader
            .tracks()
            .iter()
            .find(|t| t.id == source.track_id)
            .expect("source was built from this track");

        let codec_short_name = symphonia::default::get_codecs()
            .get_codec(track.codec_params.codec)
            .map(|d| d.short_name)
            .unwrap_or("");

        let (inner, pre_skip) = if codec_short_name.contains("opus") {
            let pre_skip = track
                .codec_params
                .extra_data
                .as_deref()
                .map(parse_opus_pre_skip)
                .unwrap_or(0);
            (InnerCodec::Opus, pre_skip)
        } else if codec_short_name.contains("vorbis") {
            (InnerCodec::Vorbis, 0)
        } else {
            (InnerCodec::Other, 0)
        };

        Ok(Self {
            pre_skip_left: pre_skip,
            source,
            inner,
            pre_skip,
            seek_target_pcm_frame: None,
            discard_scratch: Vec::new(),
        })
    }

    /// Discards exactly `n` frames from the decode stream by reading them
    /// into a scratch buffer. Returns `true` if end-of-stream was hit
    /// before `n` frames could be discarded.
    fn discard_frames(&mut self, mut n: u64) -> bool {
        let channels = self.source.channels().max(1);
        const CHUNK_FRAMES: usize = 1024;
        if self.discard_scratch.len() < CHUNK_FRAMES * channels {
            self.discard_scratch.resize(CHUNK_FRAMES * channels, 0.0);
        }

        while n > 0 {
            let chunk = (n as usize).min(CHUNK_FRAMES);
            let (written, hit_end) = self
                .source
                .read_frames(&mut self.discard_scratch, chunk);
            if written == 0 {
                return hit_end;
            }
            n -= written as u64;
        }
        false
    }
}

impl Decoder for WebmDecoder {
    fn read_frames(&mut self, out: &mut [f32], frame_count: usize) -> (usize, ReadStatus) {
        if self.pre_skip_left > 0 {
            let to_discard = self.pre_skip_left;
            self.pre_skip_left = 0;
            if self.discard_frames(to_discard) {
                return (0, ReadStatus::AtEnd);
            }
        }
        if let Some(remaining) = self.seek_target_pcm_frame.take() {
            if remaining > 0 && self.discard_frames(remaining) {
                return (0, ReadStatus::AtEnd);
            }
        }

        let (written, hit_end) = self.source.read_frames(out, frame_count);
        let status = if hit_end && written == 0 {
            ReadStatus::AtEnd
        } else {
            ReadStatus::Ok
        };
        (written, status)
    }

    fn seek_to_frame(&mut self, target: u64) -> Result<()> {
        if self.inner != InnerCodec::Opus {
            return self.source.seek_to_frame(target);
        }

        let preroll_frames = (self.source.spec.rate as u64 * 80 / 1000).min(target);
        let landing = target - preroll_frames;
        self.source.seek_to_frame(landing)?;
        self.pre_skip_left = self.pre_skip;
        self.seek_target_pcm_frame = Some(target.saturating_sub(landing));
        Ok(())
    }

    fn cursor_frames(&self) -> u64 {
        self.source.cursor
    }

    fn length_frames(&self) -> u64 {
        self.source.total_frames
    }

    fn format(&self) -> AudioFormat {
        self.source.audio_format()
    }

    fn family(&self) -> Family {
        Family::Webm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pre_skip_from_opus_head() {
        let mut header = b"OpusHead".to_vec();
        header.push(1); // version
        header.push(2); // channel count
        header.extend_from_slice(&312u16.to_le_bytes()); // pre-skip
        header.extend_from_slice(&[0; 8]);
        assert_eq!(parse_opus_pre_skip(&header), 312);
    }

    #[test]
    fn non_opus_head_yields_zero_pre_skip() {
        assert_eq!(parse_opus_pre_skip(b"VorbisHeaderish"), 0);
    }
}
