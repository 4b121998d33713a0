//! The playback state machine: orchestrates the gapless switch protocol,
//! drives the clock, and exposes the transport operations the UI layer
//! calls into.
//!
//! Grounded on `src/playerops.c` (the operation entry points: play, pause,
//! seek, skip, repeat/shuffle toggles) and `src/sound/sound.c` (the
//! callback-driven switch protocol: `switchFiles`/`activateSwitch`/
//! `executeSwitch`/`eofReached`/`switchReached`) in the original source.
//! The REDESIGN FLAGS (spec.md §9) replace the original's process-global
//! mutable state with state owned by this one struct.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::decoder::{Decoder, ReadStatus};
use crate::device::{AudioCallback, DeviceHost};
use crate::error::{PlaybackError, Result};
use crate::events::{Event, EventBus, PlaybackStatus};
use crate::format::{AudioFormat, Family, M4aFileType};
use crate::loader::{LoadResult, LoaderThread};
use crate::playlist::{NodeId, Playlist};
use crate::slot::SlotRegistry;

use crate::analysis::AnalysisBuffer;

const SKIP_COOLDOWN: Duration = Duration::from_millis(500);
const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(100);
const LOAD_POLL_ATTEMPTS: u32 = 50;

/// Perceptual volume curve exponent, carried over from the teacher's
/// `Player::set_volume` (`player.rs`).
const VOLUME_CURVE_B: f32 = 6.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatMode {
    Off,
    Track,
    List,
}

impl RepeatMode {
    pub fn cycle(self) -> RepeatMode {
        match self {
            RepeatMode::Off => RepeatMode::Track,
            RepeatMode::Track => RepeatMode::List,
            RepeatMode::List => RepeatMode::Off,
        }
    }
}

/// Everything the real-time callback and the control thread both touch,
/// behind one mutex — this is `data_source_mutex` from spec.md §5. The
/// callback only ever `try_lock`s it.
struct EngineState {
    slots: SlotRegistry,
    current_impl: Option<Family>,
    current_format: Option<AudioFormat>,
    current_m4a_file_type: Option<M4aFileType>,
    current_file_index: u8,
    switch_files: bool,
    total_frames: u64,
    current_pcm_frame: u64,
    seek_requested: bool,
    seek_percent: f32,
    skip_to_next: bool,
    repeat: RepeatMode,
    paused: bool,
    stopped: bool,
}

impl EngineState {
    fn new() -> Self {
        Self {
            slots: SlotRegistry::new(),
            current_impl: None,
            current_format: None,
            current_m4a_file_type: None,
            current_file_index: 0,
            switch_files: false,
            total_frames: 0,
            current_pcm_frame: 0,
            seek_requested: false,
            seek_percent: 0.0,
            skip_to_next: false,
            repeat: RepeatMode::Off,
            paused: false,
            stopped: true,
        }
    }
}

/// Whether the last `activate_switch` decided to repeat the current track
/// in place or hand off to the staged decoder.
enum SwitchDecision {
    RepeatInPlace,
    HandOff,
}

fn activate_switch(state: &mut EngineState) -> SwitchDecision {
    state.skip_to_next = false;
    if state.repeat == RepeatMode::Track {
        SwitchDecision::RepeatInPlace
    } else {
        state.current_file_index ^= 1;
        state.switch_files = true;
        SwitchDecision::HandOff
    }
}

/// Attempts to rotate the staged decoder into `first` if a switch is
/// pending. Returns `false` if a switch is pending but nothing is staged
/// yet (the loader hasn't published one); the caller should produce
/// silence for the remainder of the buffer in that case.
fn try_execute_pending_switch(state: &mut EngineState, family: Family) -> bool {
    if !state.switch_files {
        return true;
    }
    let slot = state.slots.get_mut(family);
    if !slot.has_staged() {
        return false;
    }
    let _ = slot.rotate();
    state.total_frames = 0;
    state.current_pcm_frame = 0;
    state.switch_files = false;
    true
}

/// Runs the gapless switch protocol for one device buffer request.
/// Returns the number of interleaved samples (not frames) actually
/// written into `out`; the caller fills the remainder with silence.
fn run_callback(
    state: &Mutex<EngineState>,
    eof_reached: &AtomicBool,
    switch_reached: &AtomicBool,
    analysis: &Mutex<AnalysisBuffer>,
    family: Family,
    channels: usize,
    out: &mut [f32],
) -> usize {
    let Ok(mut st) = state.try_lock() else {
        return 0;
    };

    // Step 1: a cross-format teardown is in flight; produce silence until
    // the new device is up.
    if switch_reached.load(Ordering::Acquire) {
        return 0;
    }

    if st.paused || st.stopped {
        return 0;
    }

    let frame_count = out.len() / channels.max(1);
    let mut written_frames = 0usize;

    loop {
        if !try_execute_pending_switch(&mut st, family) {
            eof_reached.store(true, Ordering::Release);
            break;
        }

        let remaining = frame_count - written_frames;
        if remaining == 0 {
            break;
        }

        let Some(decoder) = st.slots.get_mut(family).current_mut() else {
            break;
        };

        // Step 4: learn total_frames on the first call after a new decoder.
        if st.total_frames == 0 {
            st.total_frames = decoder.length_frames();
        }

        // Step 5: honour a pending seek.
        if st.seek_requested {
            let total = st.total_frames;
            let target = if total > 0 {
                ((total - 1) as f64 * st.seek_percent as f64 / 100.0) as u64
            } else {
                0
            };
            if decoder.seek_to_frame(target).is_ok() {
                st.current_pcm_frame = target;
            }
            st.seek_requested = false;
        }

        let base = written_frames * channels;
        let end = (written_frames + remaining) * channels;
        let (written, status) = decoder.read_frames(&mut out[base..end], remaining);
        st.current_pcm_frame += written as u64;
        written_frames += written;

        let hit_boundary = (st.total_frames > 0 && st.current_pcm_frame >= st.total_frames)
            || written == 0
            || st.skip_to_next
            || matches!(status, ReadStatus::Error);

        if !hit_boundary {
            continue;
        }
        if eof_reached.load(Ordering::Acquire) {
            break;
        }

        match activate_switch(&mut st) {
            SwitchDecision::RepeatInPlace => {
                if let Some(decoder) = st.slots.get_mut(family).current_mut() {
                    let _ = decoder.seek_to_frame(0);
                }
                st.current_pcm_frame = 0;
                continue;
            }
            SwitchDecision::HandOff => {
                eof_reached.store(true, Ordering::Release);
                continue;
            }
        }
    }

    if written_frames > 0 {
        if let Ok(mut buf) = analysis.try_lock() {
            buf.push_frames(&out[..written_frames * channels], channels);
        }
    }

    written_frames * channels
}

/// Maps a `0..=100` volume percentage through the perceptual curve the
/// teacher's `Player::set_volume` applies, for use as the device's linear
/// master-volume input.
pub fn perceptual_volume(percent: u8) -> f32 {
    let v = (percent.min(100) as f32) / 100.0;
    if v <= 0.0 {
        0.0
    } else if v >= 1.0 {
        1.0
    } else {
        ((v * VOLUME_CURVE_B).exp() - 1.0) / (VOLUME_CURVE_B.exp() - 1.0)
    }
}

pub struct PlaybackEngine {
    state: Arc<Mutex<EngineState>>,
    eof_reached: Arc<AtomicBool>,
    switch_reached: Arc<AtomicBool>,
    loaded_next_song: Arc<AtomicBool>,
    analysis: Arc<Mutex<AnalysisBuffer>>,
    device: DeviceHost,
    clock: Clock,
    unshuffled: Playlist,
    active: Playlist,
    favorites: Playlist,
    current_song: Option<NodeId>,
    events: EventBus,
    volume_percent: u8,
    shuffle_enabled: bool,
    last_error: Option<String>,
    last_skip_at: Option<Instant>,
    pending_load: Option<mpsc::Receiver<LoadResult>>,
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackEngine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(EngineState::new())),
            eof_reached: Arc::new(AtomicBool::new(false)),
            switch_reached: Arc::new(AtomicBool::new(false)),
            loaded_next_song: Arc::new(AtomicBool::new(false)),
            analysis: Arc::new(Mutex::new(AnalysisBuffer::new(44_100))),
            device: DeviceHost::new(),
            clock: Clock::new(),
            unshuffled: Playlist::new(),
            active: Playlist::new(),
            favorites: Playlist::new(),
            current_song: None,
            events: EventBus::new(),
            volume_percent: 100,
            shuffle_enabled: false,
            last_error: None,
            last_skip_at: None,
            pending_load: None,
        }
    }

    pub fn events(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn unshuffled(&mut self) -> &mut Playlist {
        &mut self.unshuffled
    }

    pub fn active(&mut self) -> &mut Playlist {
        &mut self.active
    }

    pub fn favorites(&mut self) -> &mut Playlist {
        &mut self.favorites
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The node actually playing, which may be past the one last passed to
    /// `play()` if intervening songs were force-skipped for failing to load.
    pub fn current_song(&self) -> Option<NodeId> {
        self.current_song
    }

    fn record_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.events.emit(Event::Error(message.clone()));
        self.last_error = Some(message);
    }

    /// **play(node)**: resets the clock, asks the loader to prepare `node`
    /// into the inactive slot, waits up to ~5 s for `loaded_next_song`,
    /// then drives `switch_audio_implementation`.
    ///
    /// A song-local failure (the file won't decode, or the loader times out
    /// preparing it) marks `has_errors` and is a `force_skip`: the engine
    /// retries on `next_of(node)` rather than surfacing the error, bounded
    /// by one full pass over `active` so an all-broken playlist still
    /// terminates instead of recursing forever.
    pub fn play(&mut self, node: NodeId) -> Result<()> {
        self.play_attempt(node, 0)
    }

    fn play_attempt(&mut self, node: NodeId, attempt: usize) -> Result<()> {
        let song = self
            .active
            .find_by_id(node)
            .cloned()
            .ok_or_else(|| PlaybackError::invalid_argument("no such song in active playlist"))?;

        if song.has_errors {
            return Err(PlaybackError::invalid_argument("song previously failed to decode"));
        }

        let family = crate::format::family_for_extension(
            std::path::Path::new(&song.file_path)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or(""),
        )
        .ok_or_else(|| PlaybackError::invalid_argument("unrecognised file extension"))?;

        self.clock.reset();
        self.loaded_next_song.store(false, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel();
        self.pending_load = Some(rx);
        let path = PathBuf::from(&song.file_path);
        LoaderThread::spawn(path, family, self.loaded_next_song.clone(), tx);

        let mut waited = 0;
        while !self.loaded_next_song.load(Ordering::SeqCst) && waited < LOAD_POLL_ATTEMPTS {
            std::thread::sleep(LOAD_POLL_INTERVAL);
            waited += 1;
        }

        if !self.loaded_next_song.load(Ordering::SeqCst) {
            if let Some(s) = self.active.find_by_id_mut(node) {
                s.has_errors = true;
            }
            self.record_error("timed out preparing song");
            return self.force_skip_after_failure(
                node,
                attempt,
                PlaybackError::decode("timed out preparing song"),
            );
        }

        let outcome = match self.pending_load.take().and_then(|rx| rx.recv().ok()) {
            Some(Ok(outcome)) => outcome,
            _ => {
                if let Some(s) = self.active.find_by_id_mut(node) {
                    s.has_errors = true;
                }
                self.record_error("failed to prepare song");
                return self.force_skip_after_failure(
                    node,
                    attempt,
                    PlaybackError::decode("failed to prepare song"),
                );
            }
        };

        if let Some(s) = self.active.find_by_id_mut(node) {
            s.duration_seconds = outcome.prepared.duration_seconds;
        }
        self.current_song = Some(node);

        let format = outcome.decoder.format();
        let m4a_file_type = outcome.decoder.m4a_file_type();

        {
            let mut st = self.state.lock().unwrap();
            st.slots.get_mut(family).prepare_next(outcome.decoder)?;
        }

        self.switch_audio_implementation(family, format, m4a_file_type)?;
        self.events.emit(Event::TrackChanged {
            node_id: node.0,
            file_path: song.file_path.clone(),
        });
        self.events
            .emit(Event::PlaybackStatus(PlaybackStatus::Playing));
        Ok(())
    }

    /// Forces a skip past a song that just failed to load, per spec.md
    /// §4.1/§4.7: a song-local failure marks `has_errors` and advances to
    /// `next_of(node)` instead of aborting playback. Non-song-local errors
    /// (a bad `NodeId`, an unrecognised extension) are not retried — they
    /// indicate the call itself was wrong, not that this song is broken.
    /// `attempt` bounds the retry to one pass over `active` so a playlist
    /// where every song is broken still terminates with an error instead of
    /// recursing without end.
    fn force_skip_after_failure(
        &mut self,
        node: NodeId,
        attempt: usize,
        err: PlaybackError,
    ) -> Result<()> {
        if !err.is_song_local() {
            return Err(err);
        }
        if attempt + 1 >= self.active.count().max(1) {
            return Err(err);
        }
        match self.active.next_of(node) {
            Some(next) => self.play_attempt(next, attempt + 1),
            None => Err(err),
        }
    }

    /// Compares the newly-staged decoder's format to the currently active
    /// one. If they match (same family, format, m4a file type) the slot
    /// rotation the callback already performs is sufficient — gapless.
    /// Otherwise tears the device down and reinitialises it for the new
    /// family.
    fn switch_audio_implementation(
        &mut self,
        family: Family,
        format: AudioFormat,
        m4a_file_type: Option<M4aFileType>,
    ) -> Result<()> {
        let gapless = {
            let st = self.state.lock().unwrap();
            st.current_impl == Some(family)
                && st.current_format == Some(format)
                && st.current_m4a_file_type == m4a_file_type
        };

        if gapless {
            let mut st = self.state.lock().unwrap();
            st.switch_files = true;
            st.stopped = false;
            return Ok(());
        }

        self.switch_reached.store(true, Ordering::Release);
        self.device.cleanup();

        {
            let mut st = self.state.lock().unwrap();
            st.slots.reset_except(family);
            let _ = st.slots.get_mut(family).rotate();
            st.current_impl = Some(family);
            st.current_format = Some(format);
            st.current_m4a_file_type = m4a_file_type;
            st.current_file_index = 0;
            st.switch_files = false;
            st.total_frames = 0;
            st.current_pcm_frame = 0;
            st.stopped = false;
            st.paused = false;
        }
        self.eof_reached.store(false, Ordering::Release);

        let callback = self.make_callback(family, format.channels as usize);
        let init_result = self.device.init(format, callback);
        self.switch_reached.store(false, Ordering::Release);

        init_result.and_then(|_| self.device.start()).map_err(|e| {
            let mut st = self.state.lock().unwrap();
            st.current_impl = None;
            drop(st);
            self.eof_reached.store(true, Ordering::Release);
            e
        })
    }

    fn make_callback(&self, family: Family, channels: usize) -> AudioCallback {
        let state = self.state.clone();
        let eof_reached = self.eof_reached.clone();
        let switch_reached = self.switch_reached.clone();
        let analysis = self.analysis.clone();

        Box::new(move |out: &mut [f32]| {
            run_callback(
                &state,
                &eof_reached,
                &switch_reached,
                &analysis,
                family,
                channels,
                out,
            )
        })
    }

    /// The control thread's per-tick housekeeping: advances the clock and
    /// clears `eof_reached` once the switch it signalled has been fully
    /// serviced (gapless rotation already happened in the callback, or a
    /// device reinit already completed).
    pub fn service_tick(&mut self) {
        let duration = self
            .current_song
            .and_then(|id| self.active.find_by_id(id))
            .map(|s| s.duration_seconds)
            .unwrap_or(0.0);
        self.clock.tick(duration);

        if self.eof_reached.load(Ordering::Acquire) {
            self.eof_reached.store(false, Ordering::Release);
        }
    }

    pub fn toggle_pause(&mut self) {
        let mut st = self.state.lock().unwrap();
        if self.clock.stopped() {
            self.clock.reset();
            st.stopped = false;
        }
        if st.paused {
            st.paused = false;
            self.clock.resume();
            self.events
                .emit(Event::PlaybackStatus(PlaybackStatus::Playing));
        } else {
            st.paused = true;
            self.clock.pause();
            self.events
                .emit(Event::PlaybackStatus(PlaybackStatus::Paused));
        }
    }

    pub fn stop(&mut self) {
        let mut st = self.state.lock().unwrap();
        st.stopped = true;
        st.paused = false;
        if let Some(family) = st.current_impl {
            if let Some(decoder) = st.slots.get_mut(family).current_mut() {
                let _ = decoder.seek_to_frame(0);
            }
        }
        drop(st);
        let _ = self.device.stop();
        self.clock.set_stopped(true);
        self.events
            .emit(Event::PlaybackStatus(PlaybackStatus::Stopped));
    }

    /// Fails silently (per spec.md §4.1) when paused or when the current
    /// decoder is a non-seekable raw-AAC stream.
    pub fn seek(&mut self, delta_seconds: f64) {
        if self.clock.paused() {
            return;
        }
        if !self.current_decoder_is_seekable() {
            return;
        }
        self.clock.seek(delta_seconds);
        self.flush_seek();
    }

    pub fn set_position(&mut self, absolute: Duration) {
        if self.clock.paused() {
            return;
        }
        if !self.current_decoder_is_seekable() {
            return;
        }
        self.clock.set_position(absolute);
        self.flush_seek();
    }

    fn current_decoder_is_seekable(&self) -> bool {
        let st = self.state.lock().unwrap();
        match st.current_impl {
            Some(family) => st
                .slots
                .get(family)
                .current()
                .map(|d| d.is_seekable())
                .unwrap_or(true),
            None => true,
        }
    }

    fn flush_seek(&mut self) {
        let duration = self
            .current_song
            .and_then(|id| self.active.find_by_id(id))
            .map(|s| s.duration_seconds)
            .unwrap_or(0.0);
        let seekable = self.current_decoder_is_seekable();
        if let Some(percent) = self.clock.flush_seek(duration, seekable) {
            let mut st = self.state.lock().unwrap();
            st.seek_percent = percent;
            st.seek_requested = true;
            drop(st);
            let micros = (self.clock.elapsed_seconds() * 1_000_000.0) as i64;
            self.events.emit(Event::Seeked(micros));
        }
    }

    fn cooldown_ready(&mut self) -> bool {
        let now = Instant::now();
        let ready = match self.last_skip_at {
            Some(last) => now.duration_since(last) >= SKIP_COOLDOWN,
            None => true,
        };
        if ready {
            self.last_skip_at = Some(now);
        }
        ready
    }

    /// Per spec.md §9's resolved Open Question: an explicit skip does not
    /// clear `Repeat::Track`; it plays whichever node shuffle/list order
    /// hands it, and if the mode is still `Track` the *new* current song
    /// will repeat on its own next EOS, same as before the skip.
    pub fn skip_next(&mut self) -> Result<()> {
        if !self.cooldown_ready() {
            return Ok(());
        }
        let current = self.current_song;
        let next = current.and_then(|id| self.active.next_of(id)).or_else(|| self.active.head());
        match next {
            Some(id) => self.play(id),
            None => Ok(()),
        }
    }

    pub fn skip_prev(&mut self) -> Result<()> {
        if !self.cooldown_ready() {
            return Ok(());
        }
        let current = self.current_song;
        let prev = current.and_then(|id| self.active.prev_of(id)).or_else(|| self.active.tail());
        match prev {
            Some(id) => self.play(id),
            None => Ok(()),
        }
    }

    pub fn skip_to(&mut self, id: NodeId) -> Result<()> {
        if !self.cooldown_ready() {
            return Ok(());
        }
        self.play(id)
    }

    pub fn skip_to_number(&mut self, n: usize) -> Result<()> {
        if !self.cooldown_ready() {
            return Ok(());
        }
        let id = self
            .active
            .iter()
            .nth(n)
            .map(|s| s.id)
            .ok_or_else(|| PlaybackError::invalid_argument("no song at that position"))?;
        self.play(id)
    }

    pub fn repeat_cycle(&mut self) -> RepeatMode {
        let mut st = self.state.lock().unwrap();
        st.repeat = st.repeat.cycle();
        st.repeat
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.state.lock().unwrap().repeat
    }

    /// Enabling builds `active` as a Fisher-Yates permutation of
    /// `unshuffled` starting from the current song; disabling restores
    /// `active` as a deep copy of `unshuffled`.
    pub fn shuffle_toggle(&mut self, seed: u64) {
        self.shuffle_enabled = !self.shuffle_enabled;
        if self.shuffle_enabled {
            if let Some(current) = self.current_song {
                self.active.shuffle_from(&self.unshuffled, current, seed);
            }
        } else {
            self.active = self.unshuffled.deep_copy();
        }
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffle_enabled
    }

    pub fn volume_change(&mut self, delta_percent: i16) {
        let new_volume = (self.volume_percent as i16 + delta_percent).clamp(0, 100) as u8;
        self.volume_percent = new_volume;
        self.device
            .set_master_volume((perceptual_volume(new_volume) * 100.0) as u8);
        self.events.emit(Event::VolumeChanged(new_volume));
    }

    pub fn volume_percent(&self) -> u8 {
        self.volume_percent
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.clock.elapsed_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_cycles_off_track_list_off() {
        assert_eq!(RepeatMode::Off.cycle(), RepeatMode::Track);
        assert_eq!(RepeatMode::Track.cycle(), RepeatMode::List);
        assert_eq!(RepeatMode::List.cycle(), RepeatMode::Off);
    }

    #[test]
    fn activate_switch_repeats_track_without_flipping_index() {
        let mut state = EngineState::new();
        state.repeat = RepeatMode::Track;
        state.current_file_index = 0;
        match activate_switch(&mut state) {
            SwitchDecision::RepeatInPlace => {}
            SwitchDecision::HandOff => panic!("expected repeat-in-place"),
        }
        assert_eq!(state.current_file_index, 0);
        assert!(!state.switch_files);
    }

    #[test]
    fn activate_switch_hands_off_and_flips_index_otherwise() {
        let mut state = EngineState::new();
        state.repeat = RepeatMode::Off;
        state.current_file_index = 0;
        match activate_switch(&mut state) {
            SwitchDecision::HandOff => {}
            SwitchDecision::RepeatInPlace => panic!("expected hand-off"),
        }
        assert_eq!(state.current_file_index, 1);
        assert!(state.switch_files);
    }

    #[test]
    fn volume_curve_clamps_and_anchors_endpoints() {
        assert_eq!(perceptual_volume(0), 0.0);
        assert_eq!(perceptual_volume(100), 1.0);
        assert_eq!(perceptual_volume(255), 1.0);
        let mid = perceptual_volume(50);
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn play_force_skips_broken_songs_and_terminates_when_all_fail() {
        let mut engine = PlaybackEngine::new();
        let a = engine.active().add("/nonexistent/a.mp3");
        let b = engine.active().add("/nonexistent/b.mp3");
        let c = engine.active().add("/nonexistent/c.mp3");
        engine.unshuffled().add("/nonexistent/a.mp3");
        engine.unshuffled().add("/nonexistent/b.mp3");
        engine.unshuffled().add("/nonexistent/c.mp3");

        let result = engine.play(a);

        assert!(result.is_err());
        assert!(engine.active().find_by_id(a).unwrap().has_errors);
        assert!(engine.active().find_by_id(b).unwrap().has_errors);
        assert!(engine.active().find_by_id(c).unwrap().has_errors);
    }

    #[test]
    fn cooldown_blocks_rapid_skips() {
        let mut engine = PlaybackEngine::new();
        assert!(engine.cooldown_ready());
        assert!(!engine.cooldown_ready());
    }

    #[test]
    fn volume_change_clamps_to_0_100() {
        let mut engine = PlaybackEngine::new();
        engine.volume_change(-1000);
        assert_eq!(engine.volume_percent(), 0);
        engine.volume_change(1000);
        assert_eq!(engine.volume_percent(), 100);
    }
}
