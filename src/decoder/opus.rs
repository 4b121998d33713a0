//! Ogg/Opus decoder. Wraps `symphonia`'s `ogg` format reader with the
//! `symphonia-adapter-libopus` codec (a libopus binding), matching the
//! original source's `ma_libopus` dependency in `src/sound/sound.c`.

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

pub struct OpusDecoder {
    source: SymphoniaSource,
}

impl OpusDecoder {
    pub fn open(path: &Path) -> Result<Self> {
        let source = SymphoniaSource::open_with_registry(path, Some("ogg"), codecs())?;
        Ok(Self { source })
    }
}

impl Decoder for OpusDecoder {
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
        Family::Opus
    }
}
