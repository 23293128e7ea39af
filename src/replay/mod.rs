//! Headless driver: synthetic gradient sources, a scripted event queue and a recording
//! presenter, so a whole session can run from a JSON file.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use image::{Rgba, RgbaImage};
use serde::Deserialize;

use crate::alignment::Subsampling;
use crate::config::{load_session_config, ConfigError, ConfigResult, SessionConfig};
use crate::error::AppResult;
use crate::history::CropRecord;
use crate::input::Command;
use crate::playback::{Clock, SystemClock};
use crate::selection::{PointerEvent, PointerKind};
use crate::session::{EventSource, Presenter, Session, SessionEvent, SessionResult};
use crate::source::{
    CropTarget, FrameProvider, MediaBackend, SourceDescriptor, SourceError, SourceResult,
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyntheticSource {
    pub width: u32,
    pub height: u32,
    pub subsampling: [u32; 2],
    pub frames: u64,
    pub fps: [u64; 2],
    pub format: Option<String>,
    /// The source reports a load failure and becomes a placeholder.
    pub fail_load: bool,
    /// Crops applied to this source are rejected.
    pub fail_crop: bool,
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            subsampling: [2, 2],
            frames: 100,
            fps: [25, 1],
            format: None,
            fail_load: false,
            fail_crop: false,
        }
    }
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    fn descriptor(&self) -> SourceDescriptor {
        let subsampling = Subsampling::new(self.subsampling[0], self.subsampling[1]);
        let format_name = self.format.clone().unwrap_or_else(|| {
            match (subsampling.x, subsampling.y) {
                (1, 1) => "YUV444P8",
                (2, 1) => "YUV422P8",
                (2, 2) => "YUV420P8",
                _ => "YUVP8",
            }
            .to_string()
        });
        SourceDescriptor {
            format_name,
            width: self.width,
            height: self.height,
            subsampling,
            frame_count: self.frames,
            fps_num: self.fps[0],
            fps_den: self.fps[1],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointerAction {
    Down,
    Up,
    Move,
    DoubleClick,
    SecondaryDown,
}

impl From<PointerAction> for PointerKind {
    fn from(action: PointerAction) -> Self {
        match action {
            PointerAction::Down => Self::Down,
            PointerAction::Up => Self::Up,
            PointerAction::Move => Self::Move,
            PointerAction::DoubleClick => Self::DoubleClick,
            PointerAction::SecondaryDown => Self::SecondaryDown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ScriptEvent {
    Pointer {
        pointer: PointerAction,
        x: i32,
        y: i32,
        #[serde(default)]
        shift: bool,
    },
    Command {
        command: String,
        #[serde(default)]
        source: Option<usize>,
    },
    /// The event wait times out `idle` times in a row.
    Idle { idle: u32 },
}

impl ScriptEvent {
    /// What the event source yields for this entry; `None` is a timed-out wait.
    fn steps(&self) -> Vec<Option<SessionEvent>> {
        match self {
            Self::Idle { idle } => vec![None; usize::try_from(*idle).unwrap_or(0)],
            _ => self.to_session_event().map(Some).into_iter().collect(),
        }
    }

    fn to_session_event(&self) -> Option<SessionEvent> {
        match self {
            Self::Pointer {
                pointer,
                x,
                y,
                shift,
            } => {
                let mut event = PointerEvent::new((*pointer).into(), *x, *y);
                if *shift {
                    event = event.with_shift();
                }
                Some(SessionEvent::Pointer(event))
            }
            Self::Command { command, source } => {
                let resolved = Command::from_name(command, *source);
                if resolved.is_none() {
                    tracing::warn!(command = %command, "unknown command in script; skipped");
                }
                resolved.map(SessionEvent::from)
            }
            Self::Idle { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplayScript {
    /// Falls back to the user's `config.json` when absent.
    #[serde(default)]
    pub config: Option<SessionConfig>,
    pub sources: Vec<SyntheticSource>,
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
    /// Where to write the last presented frame as PNG.
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub viewport: Option<[u32; 2]>,
}

pub fn read_replay_script(path: &Path) -> ConfigResult<ReplayScript> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Sources that render a gradient of their absolute coordinates, so crops are visible
/// in the output.
#[derive(Debug, Clone)]
pub struct SyntheticBackend {
    sources: Vec<SyntheticSource>,
    crops: Vec<CropRecord>,
    applied: Vec<(usize, CropRecord)>,
}

impl SyntheticBackend {
    pub fn new(sources: Vec<SyntheticSource>) -> Self {
        let crops = sources
            .iter()
            .map(|source| CropRecord::full_frame(source.width, source.height))
            .collect();
        Self {
            sources,
            crops,
            applied: Vec::new(),
        }
    }

    pub fn crop(&self, index: usize) -> Option<CropRecord> {
        self.crops.get(index).copied()
    }

    /// Every successful `apply_crop`, in call order.
    pub fn applied(&self) -> &[(usize, CropRecord)] {
        &self.applied
    }
}

fn gradient(position: u32, extent: u32) -> u8 {
    let scaled = u64::from(position) * 255 / u64::from(extent.max(1));
    u8::try_from(scaled).unwrap_or(u8::MAX)
}

impl FrameProvider for SyntheticBackend {
    fn frame(&mut self, index: usize, frame: u64) -> SourceResult<RgbaImage> {
        let source = self
            .sources
            .get(index)
            .ok_or_else(|| SourceError::frame_fetch(index, frame, "no such source"))?;
        if frame >= source.frames {
            return Err(SourceError::frame_fetch(index, frame, "frame out of range"));
        }
        let crop = self.crops[index];
        let blue = u8::try_from(frame % 256).unwrap_or(0);
        Ok(RgbaImage::from_fn(crop.width.max(1), crop.height.max(1), |x, y| {
            Rgba([
                gradient(crop.left + x, source.width),
                gradient(crop.top + y, source.height),
                blue,
                255,
            ])
        }))
    }
}

impl CropTarget for SyntheticBackend {
    fn source_count(&self) -> usize {
        self.sources.len()
    }

    fn apply_crop(&mut self, index: usize, record: CropRecord) -> SourceResult<()> {
        let source = self
            .sources
            .get(index)
            .ok_or_else(|| SourceError::crop_apply(index, record, "no such source"))?;
        if source.fail_crop {
            return Err(SourceError::crop_apply(index, record, "source unavailable"));
        }
        let fits = u64::from(record.left) + u64::from(record.width) <= u64::from(source.width)
            && u64::from(record.top) + u64::from(record.height) <= u64::from(source.height);
        if !fits || record.width == 0 || record.height == 0 {
            return Err(SourceError::crop_apply(index, record, "crop outside the frame"));
        }
        self.crops[index] = record;
        self.applied.push((index, record));
        Ok(())
    }
}

impl MediaBackend for SyntheticBackend {
    fn descriptors(&self) -> Vec<SourceDescriptor> {
        self.sources.iter().map(SyntheticSource::descriptor).collect()
    }

    fn prepare(&mut self, index: usize) -> SourceResult<()> {
        match self.sources.get(index) {
            Some(source) if !source.fail_load => Ok(()),
            Some(_) => Err(SourceError::load(index, "conversion to RGB failed")),
            None => Err(SourceError::load(index, "no such source")),
        }
    }
}

/// Replays queued events; once drained it asks the session to close.
#[derive(Debug, Default)]
pub struct ScriptedEvents {
    queue: VecDeque<Option<SessionEvent>>,
}

impl ScriptedEvents {
    pub fn new(events: impl IntoIterator<Item = SessionEvent>) -> Self {
        Self::from_steps(events.into_iter().map(Some))
    }

    /// `None` entries stand for waits that time out with nothing to deliver.
    pub fn from_steps(steps: impl IntoIterator<Item = Option<SessionEvent>>) -> Self {
        Self {
            queue: steps.into_iter().collect(),
        }
    }
}

impl EventSource for ScriptedEvents {
    fn next_event(&mut self, _timeout: Option<Duration>) -> Option<SessionEvent> {
        self.queue
            .pop_front()
            .unwrap_or(Some(SessionEvent::Command(Command::Close)))
    }
}

#[derive(Debug, Default)]
pub struct RecordingPresenter {
    viewport: (u32, u32),
    presented: usize,
    last: Option<RgbaImage>,
}

impl RecordingPresenter {
    pub fn new(viewport: (u32, u32)) -> Self {
        Self {
            viewport,
            presented: 0,
            last: None,
        }
    }

    pub fn presented(&self) -> usize {
        self.presented
    }

    pub fn last_frame(&self) -> Option<&RgbaImage> {
        self.last.as_ref()
    }
}

impl Presenter for RecordingPresenter {
    fn present(&mut self, frame: &RgbaImage) -> SessionResult<()> {
        self.presented += 1;
        self.last = Some(frame.clone());
        Ok(())
    }

    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }
}

#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub status: Vec<String>,
    pub history: Vec<CropRecord>,
    pub frames_presented: usize,
    pub last_frame: Option<RgbaImage>,
}

pub fn run_script(script: &ReplayScript) -> AppResult<ReplayReport> {
    run_script_with_clock(script, SystemClock::new())
}

pub fn run_script_with_clock<C: Clock>(script: &ReplayScript, clock: C) -> AppResult<ReplayReport> {
    let config = script.config.clone().unwrap_or_else(load_session_config);
    let backend = SyntheticBackend::new(script.sources.clone());
    let mut session = Session::new(backend, &config, clock)?;
    let viewport = script
        .viewport
        .map(|[width, height]| (width, height))
        .or_else(|| script.sources.first().map(|source| (source.width, source.height)))
        .unwrap_or((1, 1));
    let mut events = ScriptedEvents::from_steps(script.events.iter().flat_map(ScriptEvent::steps));
    let mut presenter = RecordingPresenter::new(viewport);

    session.run(&mut events, &mut presenter)?;
    for request in session.take_host_requests() {
        tracing::info!(?request, "host request not handled in replay");
    }

    if let (Some(path), Some(frame)) = (&script.output, presenter.last_frame()) {
        frame.save(path).map_err(crate::storage::StorageError::from)?;
        tracing::info!(path = %path.display(), "last frame written");
    }

    Ok(ReplayReport {
        status: session.status().lines().map(str::to_string).collect(),
        history: session.history().records().to_vec(),
        frames_presented: presenter.presented(),
        last_frame: presenter.last.take(),
    })
}
