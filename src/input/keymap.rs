//! Per-platform key-code tables. Hosts resolve raw codes here; the session only sees
//! [`Command`]s.

use super::command::{Command, WriteMode};
use crate::selection::NudgeDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    Darwin,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::Darwin
        } else {
            Self::Linux
        }
    }
}

const KEY_ENTER: u32 = 13;
const KEY_ESCAPE: u32 = 27;
const WINDOWS_HOME: u32 = 2_359_296;
const WINDOWS_END: u32 = 2_293_760;
const X11_HOME: u32 = 65_360;
const X11_END: u32 = 65_367;

/// Digits select sources in keyboard order: `1`..`9` then `0`.
const SOURCE_KEYS: [char; 10] = ['1', '2', '3', '4', '5', '6', '7', '8', '9', '0'];

fn resolve_navigation_key(platform: Platform, code: u32) -> Option<Command> {
    let (home, end) = match platform {
        Platform::Windows => (WINDOWS_HOME, WINDOWS_END),
        Platform::Linux | Platform::Darwin => (X11_HOME, X11_END),
    };
    match code {
        KEY_ENTER => Some(Command::CommitCrop),
        KEY_ESCAPE => Some(Command::CancelZoom),
        _ if code == home => Some(Command::GoFirst),
        _ if code == end => Some(Command::GoLast),
        _ => None,
    }
}

fn resolve_character_key(key: char) -> Option<Command> {
    match key {
        ' ' => Some(Command::PlayPause),
        ',' => Some(Command::StepBack),
        '.' => Some(Command::StepForward),
        'y' => Some(Command::Nudge(NudgeDirection::Up)),
        'n' => Some(Command::Nudge(NudgeDirection::Down)),
        'g' => Some(Command::Nudge(NudgeDirection::Left)),
        'j' => Some(Command::Nudge(NudgeDirection::Right)),
        'p' => Some(Command::RequestFrameProps),
        'z' => Some(Command::ZoomInQuick),
        'i' => Some(Command::RequestPixelInfo),
        'r' => Some(Command::ResetAll),
        'e' => Some(Command::WriteImage(WriteMode::Scaled)),
        'w' => Some(Command::WriteImage(WriteMode::Exact)),
        'q' => Some(Command::Close),
        's' => Some(Command::ToggleSlider),
        'f' => Some(Command::ToggleFullscreen),
        'h' => Some(Command::RequestHelp),
        _ => SOURCE_KEYS
            .iter()
            .position(|digit| *digit == key)
            .map(Command::PickSource),
    }
}

/// Maps a raw key code as reported by the window system to a command.
pub fn resolve_key(platform: Platform, code: u32) -> Option<Command> {
    resolve_navigation_key(platform, code).or_else(|| {
        char::from_u32(code)
            .filter(char::is_ascii)
            .and_then(resolve_character_key)
    })
}

/// Commands reachable on `platform`, paired with their key code.
pub fn bindings(platform: Platform) -> Vec<(u32, Command)> {
    let mut codes = vec![KEY_ENTER, KEY_ESCAPE];
    codes.extend(match platform {
        Platform::Windows => [WINDOWS_HOME, WINDOWS_END],
        Platform::Linux | Platform::Darwin => [X11_HOME, X11_END],
    });
    codes.extend((0x20_u32..0x7f).filter(|code| *code != KEY_ENTER && *code != KEY_ESCAPE));
    codes
        .into_iter()
        .filter_map(|code| resolve_key(platform, code).map(|command| (code, command)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_and_end_codes_differ_per_platform() {
        assert_eq!(
            resolve_key(Platform::Windows, 2_359_296),
            Some(Command::GoFirst)
        );
        assert_eq!(resolve_key(Platform::Linux, 65_367), Some(Command::GoLast));
        assert_eq!(resolve_key(Platform::Darwin, 65_360), Some(Command::GoFirst));
        assert_eq!(resolve_key(Platform::Windows, 65_360), None);
    }

    #[test]
    fn character_keys_map_to_commands() {
        assert_eq!(
            resolve_key(Platform::Linux, u32::from(' ')),
            Some(Command::PlayPause)
        );
        assert_eq!(
            resolve_key(Platform::Linux, u32::from('j')),
            Some(Command::Nudge(NudgeDirection::Right))
        );
        assert_eq!(
            resolve_key(Platform::Linux, u32::from('w')),
            Some(Command::WriteImage(WriteMode::Exact))
        );
        assert_eq!(resolve_key(Platform::Linux, 13), Some(Command::CommitCrop));
        assert_eq!(resolve_key(Platform::Linux, 27), Some(Command::CancelZoom));
        assert_eq!(resolve_key(Platform::Linux, u32::from('x')), None);
    }

    #[test]
    fn digits_pick_sources_with_zero_last() {
        assert_eq!(
            resolve_key(Platform::Windows, u32::from('1')),
            Some(Command::PickSource(0))
        );
        assert_eq!(
            resolve_key(Platform::Windows, u32::from('0')),
            Some(Command::PickSource(9))
        );
    }

    #[test]
    fn bindings_cover_every_table_entry_once() {
        let bindings = bindings(Platform::Linux);
        assert_eq!(bindings.len(), 4 + 17 + 10);
        assert!(bindings.contains(&(X11_HOME, Command::GoFirst)));
    }
}
