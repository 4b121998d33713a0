//! M3U persistence for the favorites playlist.
//!
//! Grounded on spec.md §6: `#EXTM3U` header, one path per line, relative
//! paths resolved from the favorites file's directory, `#EXTINF` duration
//! annotations preserved across a read-then-write round trip.

use std::path::{Path, PathBuf};

/// One playable entry in an M3U file: the resolved path plus whatever
/// `#EXTINF` annotation preceded it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct M3uEntry {
    pub path: PathBuf,
    pub duration_seconds: Option<i64>,
    pub title: Option<String>,
}

/// Parses M3U text. `base_dir` is the directory the favorites file lives
/// in; relative paths are resolved against it, absolute paths pass through
/// unchanged. Lines starting with `#` other than `#EXTINF` are ignored
/// (including `#EXTM3U` itself).
pub fn parse(data: &str, base_dir: &Path) -> Vec<M3uEntry> {
    let mut entries = Vec::new();
    let mut pending: Option<(Option<i64>, Option<String>)> = None;

    for line in data.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix("#EXTINF:") {
            let (duration_part, title_part) = match rest.split_once(',') {
                Some((d, t)) => (d, Some(t.to_string())),
                None => (rest, None),
            };
            let duration = duration_part.trim().parse::<i64>().ok();
            pending = Some((duration, title_part));
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let (duration_seconds, title) = pending.take().unwrap_or((None, None));
        let raw_path = Path::new(line);
        let path = if raw_path.is_absolute() {
            raw_path.to_path_buf()
        } else {
            base_dir.join(raw_path)
        };
        entries.push(M3uEntry {
            path,
            duration_seconds,
            title,
        });
    }

    entries
}

/// Serialises `entries` back to M3U text with the `#EXTM3U` header. Paths
/// are written exactly as stored on the entry (callers wanting relative
/// paths back out should have kept them relative going in).
pub fn write(entries: &[M3uEntry]) -> String {
    let mut out = String::from("#EXTM3U\n");
    for entry in entries {
        if entry.duration_seconds.is_some() || entry.title.is_some() {
            out.push_str("#EXTINF:");
            out.push_str(&entry.duration_seconds.unwrap_or(-1).to_string());
            out.push(',');
            if let Some(title) = &entry.title {
                out.push_str(title);
            }
            out.push('\n');
        }
        out.push_str(&entry.path.to_string_lossy());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_resolve_against_base_dir() {
        let base = Path::new("/home/user/music");
        let data = "#EXTM3U\nsongs/a.mp3\n";
        let entries = parse(data, base);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, PathBuf::from("/home/user/music/songs/a.mp3"));
    }

    #[test]
    fn absolute_paths_pass_through() {
        let base = Path::new("/home/user/music");
        let data = "/tmp/b.flac\n";
        let entries = parse(data, base);
        assert_eq!(entries[0].path, PathBuf::from("/tmp/b.flac"));
    }

    #[test]
    fn extinf_duration_and_title_are_captured() {
        let base = Path::new("/music");
        let data = "#EXTM3U\n#EXTINF:215,Artist - Title\na.mp3\n";
        let entries = parse(data, base);
        assert_eq!(entries[0].duration_seconds, Some(215));
        assert_eq!(entries[0].title.as_deref(), Some("Artist - Title"));
    }

    #[test]
    fn read_then_write_round_trip_preserves_paths_and_durations() {
        let base = Path::new("/music");
        let data = "#EXTM3U\n#EXTINF:120,One\na.mp3\n#EXTINF:90,Two\nb.mp3\n";
        let entries = parse(data, base);
        let rewritten = write(&entries);
        let reparsed = parse(&rewritten, base);
        assert_eq!(entries, reparsed);
    }
}
