//! Persisted settings for the playback core: library roots, ReplayGain
//! mode, whether the library cache is trusted, and the preferred output
//! buffer size. Deliberately thin — theming, keybindings and window layout
//! are a UI-layer concern and live outside this crate.
//!
//! Grounded on the teacher's `Config`/`ConfigInner` pair: same
//! `toml` + `serde` round-trip, same `~/.config/amuseing/config.toml`
//! resolution, same `Deref`-to-inner ergonomics.

use std::{
    fs,
    ops::{Deref, DerefMut},
    path::PathBuf,
};

use serde::{Deserialize, Serialize};

/// How ReplayGain-tagged loudness metadata is applied, if at all. Grounded
/// on `src/sound/volume.c`'s replaygain-mode field in the original source.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplayGainMode {
    Off,
    Track,
    Album,
}

impl Default for ReplayGainMode {
    fn default() -> Self {
        ReplayGainMode::Off
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SettingsInner {
    /// Root directories scanned to build the library tree.
    #[serde(default)]
    pub library_roots: Vec<PathBuf>,
    #[serde(default)]
    pub replaygain_mode: ReplayGainMode,
    /// Whether a previously-written library TSV cache is trusted on
    /// startup instead of rescanning `library_roots`.
    #[serde(default = "default_true")]
    pub use_library_cache: bool,
    /// Preferred output buffer size, in frames; `DeviceHost::init` treats
    /// this as a hint, not a hard requirement (the negotiated device config
    /// wins if it can't honour it exactly).
    #[serde(default = "default_buffer_size")]
    pub preferred_buffer_frames: usize,
}

fn default_true() -> bool {
    true
}

fn default_buffer_size() -> usize {
    2048
}

impl Default for SettingsInner {
    fn default() -> Self {
        Self {
            library_roots: default_music_dir().into_iter().collect(),
            replaygain_mode: ReplayGainMode::default(),
            use_library_cache: default_true(),
            preferred_buffer_frames: default_buffer_size(),
        }
    }
}

fn default_music_dir() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").ok()?;
        let mut path = PathBuf::from(home);
        path.push("Music");
        Some(path)
    }
    #[cfg(target_os = "windows")]
    {
        let home = std::env::var("USERPROFILE").ok()?;
        let mut path = PathBuf::from(home);
        path.push("Music");
        Some(path)
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

fn config_file_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    let config_dir = std::env::var("HOME").expect("$HOME should exist on linux");
    #[cfg(target_os = "windows")]
    let config_dir = std::env::var("APPDATA").expect("%APPDATA% should exist on windows");
    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    let config_dir = std::env::var("HOME").unwrap_or_default();

    let mut path = PathBuf::from(config_dir);
    #[cfg(target_os = "linux")]
    path.push(".config");
    path.push("amuseing");
    path.push("config.toml");
    path
}

/// Owns the on-disk path alongside the deserialized settings so `write()`
/// can round-trip without the caller threading a path through every call.
pub struct Settings {
    path: PathBuf,
    inner: SettingsInner,
}

impl Deref for Settings {
    type Target = SettingsInner;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for Settings {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl Settings {
    /// Loads settings from `path`, creating it with defaults if absent.
    pub fn load(path: PathBuf) -> Self {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                let _ = fs::create_dir_all(parent);
            }
        }
        let inner = if path.exists() {
            fs::read_to_string(&path)
                .ok()
                .and_then(|s| toml::from_str(&s).ok())
                .unwrap_or_default()
        } else {
            let settings = SettingsInner::default();
            let _ = fs::write(&path, toml::to_string_pretty(&settings).unwrap_or_default());
            settings
        };
        Self { path, inner }
    }

    pub fn write(&self) {
        if let Ok(toml_str) = toml::to_string_pretty(&self.inner) {
            let _ = fs::write(&self.path, toml_str);
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::load(config_file_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_buffer_frames_is_positive() {
        let settings = SettingsInner::default();
        assert!(settings.preferred_buffer_frames > 0);
    }

    #[test]
    fn replaygain_defaults_to_off() {
        assert_eq!(ReplayGainMode::default(), ReplayGainMode::Off);
    }

    #[test]
    fn load_creates_file_when_missing() {
        let dir = std::env::temp_dir().join(format!(
            "amuseing-config-test-{:?}",
            std::thread::current().id()
        ));
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("config.toml");
        let settings = Settings::load(path.clone());
        assert!(path.exists());
        assert!(settings.use_library_cache);
        let _ = fs::remove_dir_all(&dir);
    }
}
