//! The two-slot (A/B) decoder registry the audio callback rotates between to
//! hide decoder-construction latency, one instance per [`Family`].
//!
//! Grounded on `src/sound/sound.c`'s `data_source_a`/`data_source_b` pair and
//! sentinel `current` index (spec.md §3, §4.3); the sentinel is kept as an
//! `i8` here only to match the spec's `{-1,0,1}` vocabulary in debug output,
//! the rotate/retire logic itself never branches on its numeric value.

use crate::decoder::AnyDecoder;
use crate::error::{PlaybackError, Result};
use crate::format::Family;

/// `current` sentinel values: no decoder has ever been promoted to `first`,
/// or `first` was last filled from `slots[0]`/`slots[1]`.
const NONE: i8 = -1;
const FIRST_FROM_A: i8 = 0;
const FIRST_FROM_B: i8 = 1;

/// One family's A/B decoder slot. `first` is what the audio callback reads
/// from; `slots` holds a prepared-but-not-yet-active decoder. Rotation is
/// the only operation allowed to touch both fields, and must happen under
/// `data_source_mutex` (see `engine.rs`).
pub struct DecoderSlot {
    first: Option<AnyDecoder>,
    slots: [Option<AnyDecoder>; 2],
    current: i8,
}

impl Default for DecoderSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderSlot {
    pub fn new() -> Self {
        Self {
            first: None,
            slots: [None, None],
            current: NONE,
        }
    }

    /// Publishes a freshly-opened decoder into the inactive staging slot
    /// (the one that is not the source of the last `first`). Called by the
    /// loader thread; overwrites whatever was previously staged there.
    pub fn prepare_next(&mut self, decoder: AnyDecoder) -> Result<()> {
        let staging = match self.current {
            FIRST_FROM_A => 1,
            _ => 0,
        };
        self.slots[staging] = Some(decoder);
        Ok(())
    }

    /// Retires the prior `first`, promotes the staged decoder, and flips
    /// `current`. No-op (returns an error) if nothing is staged.
    pub fn rotate(&mut self) -> Result<()> {
        let staging = match self.current {
            FIRST_FROM_A => 1,
            _ => 0,
        };
        if self.slots[staging].is_none() {
            return Err(PlaybackError::invalid_argument(
                "no decoder staged to rotate into",
            ));
        }
        self.first = self.slots[staging].take();
        self.current = if staging == 0 { FIRST_FROM_A } else { FIRST_FROM_B };
        Ok(())
    }

    pub fn current(&self) -> Option<&AnyDecoder> {
        self.first.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut AnyDecoder> {
        self.first.as_mut()
    }

    pub fn first(&self) -> Option<&AnyDecoder> {
        self.first.as_ref()
    }

    pub fn first_mut(&mut self) -> Option<&mut AnyDecoder> {
        self.first.as_mut()
    }

    pub fn has_staged(&self) -> bool {
        let staging = match self.current {
            FIRST_FROM_A => 1,
            _ => 0,
        };
        self.slots[staging].is_some()
    }

    pub fn reset(&mut self) {
        self.first = None;
        self.slots = [None, None];
        self.current = NONE;
    }
}

/// One [`DecoderSlot`] per family, addressed by [`Family`]. The engine owns
/// exactly one of these; only one family's slot is ever "active" (its
/// `first` feeds the device) at a time.
pub struct SlotRegistry {
    builtin: DecoderSlot,
    vorbis: DecoderSlot,
    opus: DecoderSlot,
    webm: DecoderSlot,
    m4a: DecoderSlot,
}

impl Default for SlotRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self {
            builtin: DecoderSlot::new(),
            vorbis: DecoderSlot::new(),
            opus: DecoderSlot::new(),
            webm: DecoderSlot::new(),
            m4a: DecoderSlot::new(),
        }
    }

    pub fn get(&self, family: Family) -> &DecoderSlot {
        match family {
            Family::Builtin => &self.builtin,
            Family::Vorbis => &self.vorbis,
            Family::Opus => &self.opus,
            Family::Webm => &self.webm,
            Family::M4a => &self.m4a,
        }
    }

    pub fn get_mut(&mut self, family: Family) -> &mut DecoderSlot {
        match family {
            Family::Builtin => &mut self.builtin,
            Family::Vorbis => &mut self.vorbis,
            Family::Opus => &mut self.opus,
            Family::Webm => &mut self.webm,
            Family::M4a => &mut self.m4a,
        }
    }

    /// Resets every family's slot, e.g. on `stop()` or a cross-format
    /// device teardown.
    pub fn reset_all(&mut self) {
        self.builtin.reset();
        self.vorbis.reset();
        self.opus.reset();
        self.webm.reset();
        self.m4a.reset();
    }

    /// Resets every family's slot except `keep`. Used when switching to a
    /// new family that already has a decoder staged: the old family's
    /// decoders are released without disturbing what was just staged.
    pub fn reset_except(&mut self, keep: Family) {
        for family in [
            Family::Builtin,
            Family::Vorbis,
            Family::Opus,
            Family::Webm,
            Family::M4a,
        ] {
            if family != keep {
                self.get_mut(family).reset();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_slot_has_no_current_and_nothing_staged() {
        let slot = DecoderSlot::new();
        assert!(slot.current().is_none());
        assert!(!slot.has_staged());
    }

    #[test]
    fn rotate_without_staging_errs() {
        let mut slot = DecoderSlot::new();
        assert!(slot.rotate().is_err());
    }

    #[test]
    fn reset_clears_everything() {
        let mut slot = DecoderSlot::new();
        slot.reset();
        assert!(slot.current().is_none());
        assert!(!slot.has_staged());
    }

    #[test]
    fn registry_routes_by_family() {
        let registry = SlotRegistry::new();
        assert!(registry.get(Family::Builtin).current().is_none());
        assert!(registry.get(Family::M4a).current().is_none());
    }
}
