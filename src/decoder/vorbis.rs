//! Ogg/Vorbis decoder, wrapping `symphonia`'s `ogg` format reader and
//! `vorbis` codec. Chaining semantics mirror `ma_libvorbis` in
//! `src/sound/sound.c` of the original source.

use std::path::Path;

use crate::error::Result;
use crate::format::{AudioFormat, Family};

use super::symphonia_common::SymphoniaSource;
use super::{Decoder, ReadStatus};

pub struct VorbisDecoder {
    source: SymphoniaSource,
}

impl VorbisDecoder {
    pub fn open(path: &Path) -> Result<Self> {
        let source = SymphoniaSource::open(path, Some("ogg"))?;
        Ok(Self { source })
    }
}

impl Decoder for VorbisDecoder {
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
        Family::Vorbis
    }
}
