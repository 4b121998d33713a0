//! The decoder abstraction: a tagged variant over format families, each
//! exposing a uniform `{read_frames, seek_to_frame, cursor_frames,
//! length_frames, format}` capability set (spec.md §4.2).

pub mod builtin;
pub mod m4a;
pub mod opus;
mod symphonia_common;
pub mod vorbis;
pub mod webm;

use crate::error::Result;
use crate::format::{AudioFormat, Family, M4aFileType};

/// Outcome of a single `read_frames` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    Ok,
    AtEnd,
    Error,
}

/// Capability contract shared by every decoder family.
///
/// Implementors must always advance `cursor_frames()` by exactly the number
/// of frames reported as read, per spec.md §8's testable property
/// `sum(frames_read) == cursor_after - cursor_before`.
pub trait Decoder: Send {
    /// Reads up to `frame_count` frames of interleaved PCM (mixed down to
    /// `format().channels` channels, stored as `f32` regardless of the
    /// source's native sample format) into `out`. Returns the number of
    /// frames actually written and the outcome.
    fn read_frames(&mut self, out: &mut [f32], frame_count: usize) -> (usize, ReadStatus);

    /// Seeks to PCM frame `target`, clamped to `[0, length_frames() - 1]`.
    /// Resets any codec-internal state. Raw-AAC decoders return
    /// `PlaybackError::InvalidArgument` without mutating state.
    fn seek_to_frame(&mut self, target: u64) -> Result<()>;

    fn cursor_frames(&self) -> u64;

    fn length_frames(&self) -> u64;

    fn format(&self) -> AudioFormat;

    fn family(&self) -> Family;

    /// `Some` only for the M4a family; used by the decoder-chain policy to
    /// additionally require identical file type before chaining.
    fn m4a_file_type(&self) -> Option<M4aFileType> {
        None
    }

    /// Whether this decoder instance supports seeking at all (false for raw
    /// ADTS AAC streams).
    fn is_seekable(&self) -> bool {
        true
    }
}

/// Enum dispatch over the five concrete decoder implementations. Boxed
/// trait objects would also work; this enum avoids a vtable indirection on
/// the real-time read path and matches the "tagged variant" language of
/// spec.md §3.
pub enum AnyDecoder {
    Builtin(builtin::BuiltinDecoder),
    Vorbis(vorbis::VorbisDecoder),
    Opus(opus::OpusDecoder),
    Webm(webm::WebmDecoder),
    M4a(m4a::M4aDecoder),
}

impl Decoder for AnyDecoder {
    fn read_frames(&mut self, out: &mut [f32], frame_count: usize) -> (usize, ReadStatus) {
        match self {
            AnyDecoder::Builtin(d) => d.read_frames(out, frame_count),
            AnyDecoder::Vorbis(d) => d.read_frames(out, frame_count),
            AnyDecoder::Opus(d) => d.read_frames(out, frame_count),
            AnyDecoder::Webm(d) => d.read_frames(out, frame_count),
            AnyDecoder::M4a(d) => d.read_frames(out, frame_count),
        }
    }

    fn seek_to_frame(&mut self, target: u64) -> Result<()> {
        match self {
            AnyDecoder::Builtin(d) => d.seek_to_frame(target),
            AnyDecoder::Vorbis(d) => d.seek_to_frame(target),
            AnyDecoder::Opus(d) => d.seek_to_frame(target),
            AnyDecoder::Webm(d) => d.seek_to_frame(target),
            AnyDecoder::M4a(d) => d.seek_to_frame(target),
        }
    }

    fn cursor_frames(&self) -> u64 {
        match self {
            AnyDecoder::Builtin(d) => d.cursor_frames(),
            AnyDecoder::Vorbis(d) => d.cursor_frames(),
            AnyDecoder::Opus(d) => d.cursor_frames(),
            AnyDecoder::Webm(d) => d.cursor_frames(),
            AnyDecoder::M4a(d) => d.cursor_frames(),
        }
    }

    fn length_frames(&self) -> u64 {
        match self {
            AnyDecoder::Builtin(d) => d.length_frames(),
            AnyDecoder::Vorbis(d) => d.length_frames(),
            AnyDecoder::Opus(d) => d.length_frames(),
            AnyDecoder::Webm(d) => d.length_frames(),
            AnyDecoder::M4a(d) => d.length_frames(),
        }
    }

    fn format(&self) -> AudioFormat {
        match self {
            AnyDecoder::Builtin(d) => d.format(),
            AnyDecoder::Vorbis(d) => d.format(),
            AnyDecoder::Opus(d) => d.format(),
            AnyDecoder::Webm(d) => d.format(),
            AnyDecoder::M4a(d) => d.format(),
        }
    }

    fn family(&self) -> Family {
        match self {
            AnyDecoder::Builtin(_) => Family::Builtin,
            AnyDecoder::Vorbis(_) => Family::Vorbis,
            AnyDecoder::Opus(_) => Family::Opus,
            AnyDecoder::Webm(_) => Family::Webm,
            AnyDecoder::M4a(_) => Family::M4a,
        }
    }

    fn m4a_file_type(&self) -> Option<M4aFileType> {
        match self {
            AnyDecoder::M4a(d) => d.m4a_file_type(),
            _ => None,
        }
    }

    fn is_seekable(&self) -> bool {
        match self {
            AnyDecoder::M4a(d) => d.is_seekable(),
            _ => true,
        }
    }
}

/// Opens a decoder for `path`, dispatching on [`Family`]. Used by
/// [`crate::loader::LoaderThread`] when preparing a song into the inactive
/// [`crate::slot::DecoderSlot`].
pub fn open(path: &std::path::Path, family: Family) -> Result<AnyDecoder> {
    match family {
        Family::Builtin => builtin::BuiltinDecoder::open(path).map(AnyDecoder::Builtin),
        Family::Vorbis => vorbis::VorbisDecoder::open(path).map(AnyDecoder::Vorbis),
        Family::Opus => opus::OpusDecoder::open(path).map(AnyDecoder::Opus),
        Family::Webm => webm::WebmDecoder::open(path).map(AnyDecoder::Webm),
        Family::M4a => m4a::M4aDecoder::open(path).map(AnyDecoder::M4a),
    }
}
