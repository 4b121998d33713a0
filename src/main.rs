//! Minimal command-line driver for the playback core: takes a list of
//! audio files, enqueues them in order and plays through the list once,
//! logging transport events as they arrive. There is no terminal UI, no
//! key handling and no library scan here — those are UI-layer concerns
//! that sit on top of this crate.

use std::path::PathBuf;
use std::time::Duration;

use amuseing::config::Settings;
use amuseing::events::Event;
use amuseing::{pidfile, PlaybackEngine};

const TICK_INTERVAL: Duration = Duration::from_millis(100);

fn main() {
    env_logger::init();

    let paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        eprintln!("usage: amuseing <file> [file...]");
        std::process::exit(1);
    }

    let lock_path = pidfile::pid_file_path();
    if let Err(pid) = pidfile::acquire(&lock_path) {
        eprintln!("amuseing is already running (pid {pid})");
        std::process::exit(1);
    }

    let settings = Settings::default();
    log::info!(
        "starting with replaygain mode {:?}, buffer hint {} frames",
        settings.replaygain_mode,
        settings.preferred_buffer_frames
    );

    let mut engine = PlaybackEngine::new();
    let rx = engine.events().subscribe();
    for path in &paths {
        engine.unshuffled().add(path.to_string_lossy().into_owned());
        engine.active().add(path.to_string_lossy().into_owned());
    }

    let Some(first) = engine.active().head() else {
        pidfile::release(&lock_path);
        return;
    };

    if let Err(e) = engine.play(first) {
        log::error!("no playable song in the list: {e}");
        pidfile::release(&lock_path);
        std::process::exit(1);
    }

    // `play()` force-skips past songs it can't decode, so the song actually
    // playing may already be ahead of `first` — always read it back from the
    // engine rather than assuming it matches what was last requested.
    let mut current = engine.current_song();
    while let Some(node) = current {
        std::thread::sleep(TICK_INTERVAL);
        engine.service_tick();

        while let Ok(event) = rx.try_recv() {
            match event {
                Event::TrackChanged { file_path, .. } => log::info!("now playing {file_path}"),
                Event::PlaybackStatus(status) => log::info!("status: {status:?}"),
                Event::Seeked(micros) => log::debug!("seeked to {micros}us"),
                Event::VolumeChanged(v) => log::info!("volume: {v}%"),
                Event::Error(message) => log::error!("{message}"),
            }
        }

        let duration = engine
            .active()
            .find_by_id(node)
            .map(|s| s.duration_seconds)
            .unwrap_or(0.0);
        if duration > 0.0 && engine.elapsed_seconds() >= duration {
            match engine.active().next_of(node) {
                Some(next) => {
                    if let Err(e) = engine.play(next) {
                        log::error!("failed to advance playback: {e}");
                        engine.stop();
                        current = None;
                        continue;
                    }
                    current = engine.current_song();
                }
                None => {
                    engine.stop();
                    current = None;
                }
            }
        }
    }

    pidfile::release(&lock_path);
}
