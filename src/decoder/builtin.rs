//! Built-in PCM-family decoder: MP3, FLAC and WAV via `symphonia`.
//!
//! Grounded on `src/sound/sound_builtin.c`, which wraps `ma_decoder` for
//! these three formats and additionally estimates an average MP3 bitrate.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::format::{AudioFormat, Family};

use super::symphonia_common::SymphoniaSource;
use super::{Decoder, ReadStatus};

pub struct BuiltinDecoder {
    source: SymphoniaSource,
    /// Average bitrate in kbps, computed for MP3 as
    /// `file_size_bytes * 8 / duration_seconds / 1000`, capped at 320.
    /// `None` for FLAC/WAV where bitrate isn't a meaningful label.
    pub avg_bitrate_kbps: Option<u32>,
}

impl BuiltinDecoder {
    pub fn open(path: &Path) -> Result<Self> {
        let source = SymphoniaSource::open(path, None)?;

        let avg_bitrate_kbps = if path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("mp3"))
            .unwrap_or(false)
        {
            fs::metadata(path).ok().and_then(|meta| {
                let duration_seconds =
                    source.total_frames as f64 / source.spec.rate.max(1) as f64;
                if duration_seconds <= 0.0 {
                    return None;
                }
                let bitrate =
                    (meta.len() as f64 * 8.0 / duration_seconds / 1000.0).round() as u32;
                Some(bitrate.min(320))
            })
        } else {
            None
        };

        Ok(Self {
            source,
            avg_bitrate_kbps,
        })
    }
}

impl Decoder for BuiltinDecoder {
    fn read_frames(&mut self, out: &mut [f32], frame_count: usize) -> (usize, ReadStatus) {
        let (written, hit_end) = self.source.read_frames(out, frame_count);
        let status = if hit_end && written == 0 {
            ReadStatus::AtEnd
        } else {
            ReadStatus::Ok
        };
        (written, status)
    }

    fn seek_to_frame(&mut self, target: u64) -> Result<()> {
        self.source.seek_to_frame(target)
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
        Family::Builtin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitrate_is_capped_at_320() {
        // A contrived duration/size pair whose naive computation would
        // exceed 320 kbps must be clamped.
        let bitrate = ((50_000_000.0_f64 * 8.0 / 1.0 / 1000.0).round() as u32).min(320);
        assert_eq!(bitrate, 320);
    }
}
