//! Seams between the session loop and the window system hosting it.

use std::time::Duration;

use image::RgbaImage;

use super::error::SessionResult;
use crate::input::Command;
use crate::selection::PointerEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Pointer(PointerEvent),
    Command(Command),
}

impl From<PointerEvent> for SessionEvent {
    fn from(event: PointerEvent) -> Self {
        Self::Pointer(event)
    }
}

impl From<Command> for SessionEvent {
    fn from(command: Command) -> Self {
        Self::Command(command)
    }
}

pub trait EventSource {
    /// Blocks for at most `timeout` (forever when `None`); `None` means nothing arrived.
    fn next_event(&mut self, timeout: Option<Duration>) -> Option<SessionEvent>;
}

pub trait Presenter {
    fn present(&mut self, frame: &RgbaImage) -> SessionResult<()>;

    /// Size the host draws the frame at; scaled image writes use it.
    fn viewport(&self) -> (u32, u32);

    fn is_open(&self) -> bool {
        true
    }
}

/// Work the host does on the session's behalf; help and frame-property text live there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRequest {
    Help,
    FrameProps { source: usize, frame: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewFlags {
    pub slider: bool,
    pub fullscreen: bool,
}
