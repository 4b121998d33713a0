//! Off-thread song preparation: opens a file, builds its decoder into the
//! inactive slot, and reports back duration/bitrate without blocking the
//! control thread on file I/O.
//!
//! Grounded on `src/playerops.c`'s background "load next song" worker in
//! the original source, which does exactly this sequence (open, probe
//! duration, publish into the inactive data source, signal done).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use crate::decoder::{self, AnyDecoder, Decoder};
use crate::error::Result;
use crate::format::Family;

/// What the loader learns about a song once its decoder is open.
#[derive(Debug, Clone)]
pub struct PreparedSong {
    pub duration_seconds: f64,
    pub avg_bitrate_kbps: Option<u32>,
}

/// A freshly-opened decoder plus what the loader learned about it. The
/// decoder itself travels back to the control thread rather than being
/// staged by the loader thread, so the only lock this module ever takes
/// is none at all — staging into a `SlotRegistry` happens under whatever
/// mutex the caller already holds for `EngineState`.
pub struct LoadOutcome {
    pub decoder: AnyDecoder,
    pub prepared: PreparedSong,
}

pub type LoadResult = Result<LoadOutcome>;

/// Runs [`LoaderThread::prepare`] on a detached worker, publishing its
/// result through `result_tx` and flipping `loaded_next_song` last so a
/// poller only ever observes a result that is already there.
pub struct LoaderThread;

impl LoaderThread {
    pub fn spawn(
        path: PathBuf,
        family: Family,
        loaded_next_song: Arc<AtomicBool>,
        result_tx: mpsc::Sender<LoadResult>,
    ) -> JoinHandle<()> {
        thread::spawn(move || {
            loaded_next_song.store(false, Ordering::SeqCst);
            let outcome = Self::prepare(&path, family);
            let _ = result_tx.send(outcome);
            loaded_next_song.store(true, Ordering::SeqCst);
        })
    }

    fn prepare(path: &Path, family: Family) -> LoadResult {
        let decoder = decoder::open(path, family)?;

        let length_frames = decoder.length_frames();
        let sample_rate = decoder.format().sample_rate_hz;
        let duration_seconds = if sample_rate > 0 {
            length_frames as f64 / sample_rate as f64
        } else {
            0.0
        };
        let avg_bitrate_kbps = match &decoder {
            AnyDecoder::Builtin(b) => b.avg_bitrate_kbps,
            _ => None,
        };

        Ok(LoadOutcome {
            decoder,
            prepared: PreparedSong {
                duration_seconds,
                avg_bitrate_kbps,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn missing_file_reports_error_and_still_signals_done() {
        let loaded = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();

        let handle = LoaderThread::spawn(
            PathBuf::from("/nonexistent/path/for/tests.mp3"),
            Family::Builtin,
            loaded.clone(),
            tx,
        );
        handle.join().unwrap();

        assert!(loaded.load(Ordering::SeqCst));
        let outcome = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert!(outcome.is_err());
    }
}
