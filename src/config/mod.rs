use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::alignment::AlignmentRequest;
use crate::playback::FrameRange;
use crate::selection::DEFAULT_PROXIMITY;
use crate::source::SourceDescriptor;

const APP_DIR: &str = "cropview";
const SESSION_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot locate {}: neither XDG_CONFIG_HOME nor HOME is set", .relative.display())]
    NoConfigRoot { relative: PathBuf },
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Session settings from `config.json`; every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub mod_x: i32,
    pub mod_y: i32,
    pub respect_x_subsampling: bool,
    pub respect_y_subsampling: bool,
    pub ignore_subsampling: bool,
    pub proximity: i32,
    /// `[first, end)` of the first source; out-of-range values fall back to the full length.
    pub frames: Option<[i64; 2]>,
    /// Milliseconds between frames; derived from the first source's frame rate when absent.
    pub delay_ms: Option<i64>,
    pub img_dir: Option<PathBuf>,
    pub play: bool,
    pub slider: bool,
    pub fullscreen: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let alignment = AlignmentRequest::default();
        Self {
            mod_x: alignment.mod_x,
            mod_y: alignment.mod_y,
            respect_x_subsampling: alignment.respect_x_subsampling,
            respect_y_subsampling: alignment.respect_y_subsampling,
            ignore_subsampling: alignment.ignore_subsampling,
            proximity: DEFAULT_PROXIMITY,
            frames: None,
            delay_ms: None,
            img_dir: None,
            play: false,
            slider: false,
            fullscreen: false,
        }
    }
}

impl SessionConfig {
    pub fn alignment_request(&self) -> AlignmentRequest {
        AlignmentRequest {
            mod_x: self.mod_x,
            mod_y: self.mod_y,
            respect_x_subsampling: self.respect_x_subsampling,
            respect_y_subsampling: self.respect_y_subsampling,
            ignore_subsampling: self.ignore_subsampling,
        }
    }

    pub fn proximity(&self) -> i32 {
        self.proximity.max(1)
    }

    pub fn frame_range(&self, first_source: &SourceDescriptor) -> FrameRange {
        let full = FrameRange::full(first_source.frame_count);
        let Some([first, end]) = self.frames else {
            return full;
        };
        let range = u64::try_from(first)
            .ok()
            .zip(u64::try_from(end).ok())
            .and_then(|(first, end)| FrameRange::new(first, end))
            .filter(|range| range.end <= first_source.frame_count);
        range.unwrap_or_else(|| {
            tracing::warn!(
                first,
                end,
                length = first_source.frame_count,
                "frames must be two integers within the first clip's range; using the full length"
            );
            full
        })
    }

    pub fn frame_delay(&self, first_source: &SourceDescriptor) -> Duration {
        match self.delay_ms {
            Some(delay_ms) => Duration::from_millis(delay_ms.unsigned_abs()),
            None if first_source.fps_num > 0 => Duration::from_secs_f64(
                first_source.fps_den as f64 / first_source.fps_num as f64,
            ),
            None => {
                tracing::warn!("source reports no frame rate; playing without delay");
                Duration::ZERO
            }
        }
    }
}

pub fn load_session_config() -> SessionConfig {
    let xdg_config_home = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);
    let home = std::env::var_os("HOME").map(PathBuf::from);
    load_session_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_session_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> SessionConfig {
    let path = match session_config_path(xdg_config_home, home) {
        Ok(path) => path,
        Err(err) => {
            tracing::debug!(%err, "no session config location; using defaults");
            return SessionConfig::default();
        }
    };
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no session config file; using defaults");
        return SessionConfig::default();
    }
    read_session_config(&path).unwrap_or_else(|err| {
        tracing::warn!(%err, "using default session config");
        SessionConfig::default()
    })
}

pub fn read_session_config(path: &Path) -> ConfigResult<SessionConfig> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// `<root>/cropview/config.json`, where the root is `$XDG_CONFIG_HOME` when set and
/// non-empty, else `$HOME/.config`.
pub fn session_config_path(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> ConfigResult<PathBuf> {
    let relative = Path::new(APP_DIR).join(SESSION_CONFIG_FILE);
    let root = xdg_config_home
        .filter(|path| !path.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .or_else(|| home.map(|home| home.join(".config")));
    match root {
        Some(root) => Ok(root.join(relative)),
        None => Err(ConfigError::NoConfigRoot { relative }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::Subsampling;

    fn descriptor(frame_count: u64) -> SourceDescriptor {
        SourceDescriptor {
            format_name: "YUV420P8".to_string(),
            width: 1920,
            height: 1080,
            subsampling: Subsampling::new(2, 2),
            frame_count,
            fps_num: 24_000,
            fps_den: 1_001,
        }
    }

    #[test]
    fn session_config_path_prefers_xdg_config_home() {
        let path = session_config_path(
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/config-root/cropview/config.json"));
    }

    #[test]
    fn empty_xdg_config_home_falls_back_to_home_dot_config() {
        let path = session_config_path(Some(Path::new("")), Some(Path::new("/tmp/home")))
            .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/home/.config/cropview/config.json"));
    }

    #[test]
    fn missing_config_root_names_the_wanted_file() {
        let error = session_config_path(None, None).expect_err("no root should be available");
        assert!(matches!(error, ConfigError::NoConfigRoot { .. }));
        assert_eq!(
            error.to_string(),
            "cannot locate cropview/config.json: neither XDG_CONFIG_HOME nor HOME is set"
        );
        assert_eq!(load_session_config_with(None, None), SessionConfig::default());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"mod_x": 4, "play": true}"#).expect("config should parse");
        assert_eq!(config.mod_x, 4);
        assert_eq!(config.mod_y, 2);
        assert!(config.play);
        assert!(config.respect_y_subsampling);
        assert_eq!(config.proximity, DEFAULT_PROXIMITY);
    }

    #[test]
    fn unreadable_config_falls_back_to_defaults() {
        let root = std::env::temp_dir().join("cropview-config-broken");
        let dir = root.join("cropview");
        std::fs::create_dir_all(&dir).expect("config dir should be creatable");
        std::fs::write(dir.join("config.json"), "{ not json").expect("config should be writable");

        let config = load_session_config_with(Some(root.as_path()), None);
        assert_eq!(config, SessionConfig::default());
        assert!(matches!(
            read_session_config(&dir.join("config.json")),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn frame_range_outside_clip_falls_back_to_full_length() {
        let source = descriptor(100);
        let config = SessionConfig {
            frames: Some([10, 50]),
            ..SessionConfig::default()
        };
        assert_eq!(config.frame_range(&source), FrameRange { first: 10, end: 50 });

        for frames in [[10, 101], [-1, 20], [30, 30]] {
            let config = SessionConfig {
                frames: Some(frames),
                ..SessionConfig::default()
            };
            assert_eq!(config.frame_range(&source), FrameRange::full(100), "{frames:?}");
        }
    }

    #[test]
    fn delay_defaults_to_frame_duration_and_uses_absolute_value() {
        let source = descriptor(10);
        let derived = SessionConfig::default().frame_delay(&source);
        assert_eq!(derived.as_micros(), 41_708);

        let config = SessionConfig {
            delay_ms: Some(-40),
            ..SessionConfig::default()
        };
        assert_eq!(config.frame_delay(&source), Duration::from_millis(40));
    }
}
