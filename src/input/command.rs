use crate::selection::NudgeDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Resized to the host viewport, nearest neighbour.
    Scaled,
    /// Displayed pixels 1:1.
    Exact,
}

/// Logical actions the session consumes, already resolved from host key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PlayPause,
    StepBack,
    StepForward,
    GoFirst,
    GoLast,
    CommitCrop,
    CancelZoom,
    ZoomInQuick,
    PickSource(usize),
    ResetAll,
    ToggleSlider,
    ToggleFullscreen,
    RequestHelp,
    RequestFrameProps,
    RequestPixelInfo,
    WriteImage(WriteMode),
    Nudge(NudgeDirection),
    Close,
}

impl Command {
    /// Stable name used by replay scripts and help listings.
    pub const fn name(self) -> &'static str {
        match self {
            Self::PlayPause => "playPause",
            Self::StepBack => "stepBack",
            Self::StepForward => "stepForward",
            Self::GoFirst => "goFirst",
            Self::GoLast => "goLast",
            Self::CommitCrop => "commitCrop",
            Self::CancelZoom => "cancelZoom",
            Self::ZoomInQuick => "zoomInQuick",
            Self::PickSource(_) => "pickSource",
            Self::ResetAll => "resetAll",
            Self::ToggleSlider => "toggleSlider",
            Self::ToggleFullscreen => "toggleFullscreen",
            Self::RequestHelp => "requestHelp",
            Self::RequestFrameProps => "requestFrameProps",
            Self::RequestPixelInfo => "requestPixelInfo",
            Self::WriteImage(WriteMode::Scaled) => "writeImage",
            Self::WriteImage(WriteMode::Exact) => "writeImageExact",
            Self::Nudge(NudgeDirection::Up) => "nudgeUp",
            Self::Nudge(NudgeDirection::Down) => "nudgeDown",
            Self::Nudge(NudgeDirection::Left) => "nudgeLeft",
            Self::Nudge(NudgeDirection::Right) => "nudgeRight",
            Self::Close => "close",
        }
    }

    /// Inverse of [`Command::name`]; `pickSource` needs its index separately.
    pub fn from_name(name: &str, source: Option<usize>) -> Option<Self> {
        let command = match name {
            "playPause" => Self::PlayPause,
            "stepBack" => Self::StepBack,
            "stepForward" => Self::StepForward,
            "goFirst" => Self::GoFirst,
            "goLast" => Self::GoLast,
            "commitCrop" => Self::CommitCrop,
            "cancelZoom" => Self::CancelZoom,
            "zoomInQuick" => Self::ZoomInQuick,
            "pickSource" => Self::PickSource(source?),
            "resetAll" => Self::ResetAll,
            "toggleSlider" => Self::ToggleSlider,
            "toggleFullscreen" => Self::ToggleFullscreen,
            "requestHelp" => Self::RequestHelp,
            "requestFrameProps" => Self::RequestFrameProps,
            "requestPixelInfo" => Self::RequestPixelInfo,
            "writeImage" => Self::WriteImage(WriteMode::Scaled),
            "writeImageExact" => Self::WriteImage(WriteMode::Exact),
            "nudgeUp" => Self::Nudge(NudgeDirection::Up),
            "nudgeDown" => Self::Nudge(NudgeDirection::Down),
            "nudgeLeft" => Self::Nudge(NudgeDirection::Left),
            "nudgeRight" => Self::Nudge(NudgeDirection::Right),
            "close" => Self::Close,
            _ => return None,
        };
        Some(command)
    }
}
