//! The single-threaded preview loop: owns every piece of interaction state and routes
//! pointer events and commands to the selection, history and playback components.

mod error;
mod host;

use image::RgbaImage;

pub use error::{SessionError, SessionResult};
pub use host::{EventSource, HostRequest, Presenter, SessionEvent, ViewFlags};

use crate::alignment::{resolve_alignment, AlignmentConfig, AlignmentResolution};
use crate::config::SessionConfig;
use crate::geometry::{Color, FrameBounds, Point};
use crate::history::{CropHistory, CropRecord, HistoryChange};
use crate::input::{Command, WriteMode};
use crate::playback::{Clock, Playback, PlaybackClock};
use crate::render::{
    composite_flash, composite_selection, error_frame, Flash, BAD_COLOR, GOOD_COLOR,
};
use crate::report::{crop_command_line, crop_is_valid, CropLine, CropLineContext, StatusLog};
use crate::selection::{
    quick_zoom_rect, InteractionState, NudgeDirection, PointerEvent, SelectionContext,
    SelectionEffect,
};
use crate::source::{load_sources, LoadedSource, LoadedTargets, MediaBackend, SourceResult};
use crate::storage::{FrameSnapshot, ImageStorage, ImageWriter};

pub struct Session<B, C> {
    backend: B,
    sources: Vec<LoadedSource>,
    alignment: AlignmentResolution,
    history: CropHistory,
    interaction: InteractionState,
    proximity: i32,
    active: usize,
    playback: Playback,
    pacer: PlaybackClock<C>,
    status: StatusLog,
    flags: ViewFlags,
    requests: Vec<HostRequest>,
    flash: Option<Flash>,
    pointer: Option<Point>,
    displayed: Option<RgbaImage>,
    viewport: (u32, u32),
    storage: Box<dyn ImageStorage>,
    close: bool,
}

impl<B: MediaBackend, C: Clock> Session<B, C> {
    pub fn new(mut backend: B, config: &SessionConfig, clock: C) -> SessionResult<Self> {
        let sources = load_sources(&mut backend);
        let Some(first) = sources.iter().find(|source| !source.is_placeholder()) else {
            tracing::error!(count = sources.len(), "no usable source");
            return Err(SessionError::NoSources);
        };
        let first = first.descriptor.clone();

        let mut status = StatusLog::default();
        for source in sources.iter().filter(|source| source.is_placeholder()) {
            if let Some(err) = &source.load_error {
                status.push(err.clone());
            }
        }
        let mut resolutions: Vec<(u32, u32)> = sources
            .iter()
            .map(|source| (source.descriptor.width, source.descriptor.height))
            .collect();
        resolutions.dedup();
        if resolutions.len() > 1 {
            tracing::warn!(?resolutions, "sources differ in resolution");
            status.push("Clips DO NOT HAVE THE SAME RESOLUTIONS, expect inconsistent crops");
        }

        let inputs: Vec<_> = sources.iter().map(LoadedSource::alignment_input).collect();
        let alignment = resolve_alignment(config.alignment_request(), &inputs);
        for correction in &alignment.corrections {
            status.push(correction.to_string());
        }

        let history = CropHistory::new(first.width, first.height);
        let playback = Playback::new(config.frame_range(&first), config.play);
        let pacer = PlaybackClock::new(clock, config.frame_delay(&first));
        let writer = match &config.img_dir {
            Some(dir) => ImageWriter::new(dir),
            None => ImageWriter::with_default_dir().unwrap_or_else(|err| {
                tracing::warn!(%err, "current directory unavailable; images go to \".\"");
                ImageWriter::new(".")
            }),
        };
        tracing::info!(
            image_dir = %writer.image_dir().display(),
            sources = sources.len(),
            width = first.width,
            height = first.height,
            range = ?playback.range(),
            delay = ?pacer.delay(),
            "session ready"
        );

        let mut session = Self {
            backend,
            sources,
            alignment,
            history,
            interaction: InteractionState::idle(),
            proximity: config.proximity(),
            active: 0,
            playback,
            pacer,
            status,
            flags: ViewFlags {
                slider: config.slider,
                fullscreen: config.fullscreen,
            },
            requests: Vec::new(),
            flash: None,
            pointer: None,
            displayed: None,
            viewport: (first.width, first.height),
            storage: Box::new(writer),
            close: false,
        };
        session.report_current_crop();
        Ok(session)
    }

    pub fn with_storage(mut self, storage: Box<dyn ImageStorage>) -> Self {
        self.storage = storage;
        self
    }

    pub fn alignment(&self) -> AlignmentConfig {
        self.alignment.config
    }

    pub fn alignment_resolution(&self) -> &AlignmentResolution {
        &self.alignment
    }

    pub fn history(&self) -> &CropHistory {
        &self.history
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn status(&self) -> &StatusLog {
        &self.status
    }

    pub fn flags(&self) -> ViewFlags {
        self.flags
    }

    pub fn active_source(&self) -> usize {
        self.active
    }

    pub fn sources(&self) -> &[LoadedSource] {
        &self.sources
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_closing(&self) -> bool {
        self.close
    }

    pub fn take_host_requests(&mut self) -> Vec<HostRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn set_viewport(&mut self, viewport: (u32, u32)) {
        self.viewport = viewport;
    }

    /// Render → pace → present → wait → handle → close check → advance, until closed.
    ///
    /// Only a due tick (the wait timed out, or the frame delay has elapsed) paces and
    /// advances playback; events arriving in between are handled and re-rendered at once.
    pub fn run<E: EventSource, P: Presenter>(
        &mut self,
        events: &mut E,
        presenter: &mut P,
    ) -> SessionResult<()> {
        let mut tick_due = true;
        loop {
            let frame = self.render_frame();
            if tick_due && self.playback.is_playing() {
                self.pacer.wait();
            }
            presenter.present(&frame)?;
            self.viewport = presenter.viewport();

            let timeout = self
                .playback
                .is_playing()
                .then(|| self.pacer.remaining());
            let event = events.next_event(timeout);
            let handled = event.is_some();
            if let Some(event) = event {
                self.handle_event(event);
            }
            if self.close || !presenter.is_open() {
                tracing::info!("session closed");
                return Ok(());
            }

            tick_due = !handled || self.pacer.remaining().is_zero();
            let stop = if tick_due {
                self.playback.advance()
            } else {
                self.playback.clamp()
            };
            if let Some(stop) = stop {
                tracing::debug!(?stop, frame = self.playback.current_frame(), "playback stopped");
            }
        }
    }

    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Pointer(pointer) => self.handle_pointer(pointer),
            SessionEvent::Command(command) => self.handle_command(command),
        }
    }

    fn bounds(&self) -> FrameBounds {
        let top = self.history.top();
        FrameBounds::from_u32(top.width, top.height)
    }

    fn selection_context(&self) -> SelectionContext {
        let base = self.history.base();
        SelectionContext {
            bounds: self.bounds(),
            original: (base.width, base.height),
            alignment: self.alignment.config,
            proximity: self.proximity,
        }
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        self.pointer = Some(event.position);
        let context = self.selection_context();
        match self.interaction.on_pointer(event, &context) {
            Ok((state, effect)) => {
                self.interaction = state;
                self.apply_effect(effect);
            }
            Err(err) => {
                tracing::warn!(%err, "pointer event dropped; selection reset");
                self.interaction = InteractionState::idle();
            }
        }
    }

    fn apply_effect(&mut self, effect: SelectionEffect) {
        match effect {
            SelectionEffect::None | SelectionEffect::Cancelled => {}
            SelectionEffect::Updated {
                rect,
                aspect_infeasible,
            } => {
                if aspect_infeasible {
                    tracing::debug!(?rect, "no aligned height keeps the aspect ratio here");
                }
                self.report_current_crop();
            }
            SelectionEffect::Picked { object, rect } => {
                tracing::debug!(object = object.label(), "object picked");
                self.flash = Some(Flash { object, rect });
            }
            SelectionEffect::Commit(rect) => {
                let record = CropRecord::from_selection(rect, self.history.current_offset());
                let applied = self.push_crop(record).is_ok();
                match self.interaction.finish_commit(applied) {
                    Ok(state) => self.interaction = state,
                    Err(err) => {
                        tracing::warn!(%err, "commit could not finish; selection reset");
                        self.interaction = InteractionState::idle();
                    }
                }
                if applied {
                    self.report_current_crop();
                }
            }
            SelectionEffect::QuickZoom(point) => self.quick_zoom(Some(point)),
            SelectionEffect::EmptySelection => {
                self.status.push("selection is empty; nothing to crop");
            }
        }
    }

    pub fn handle_command(&mut self, command: Command) {
        tracing::debug!(command = command.name(), "command");
        match command {
            Command::PlayPause => {
                if self.playback.toggle() {
                    self.pacer.restart();
                }
            }
            Command::StepBack => self.playback.step(-1),
            Command::StepForward => self.playback.step(1),
            Command::GoFirst => self.playback.go_first(),
            Command::GoLast => self.playback.go_last(),
            Command::CommitCrop => match self.interaction.request_commit() {
                Ok((state, effect)) => {
                    self.interaction = state;
                    self.apply_effect(effect);
                }
                Err(err) => tracing::warn!(%err, "commit request ignored"),
            },
            Command::CancelZoom => self.zoom_out(),
            Command::ZoomInQuick => self.quick_zoom(self.pointer),
            Command::PickSource(index) => self.pick_source(index),
            Command::ResetAll => self.reset_all(),
            Command::ToggleSlider => self.flags.slider = !self.flags.slider,
            Command::ToggleFullscreen => self.flags.fullscreen = !self.flags.fullscreen,
            Command::RequestHelp => self.requests.push(HostRequest::Help),
            Command::RequestFrameProps => self.requests.push(HostRequest::FrameProps {
                source: self.active,
                frame: self.playback.current_frame(),
            }),
            Command::RequestPixelInfo => self.pixel_info(),
            Command::WriteImage(mode) => self.write_image(mode),
            Command::Nudge(direction) => self.nudge(direction),
            Command::Close => self.close = true,
        }
    }

    fn push_crop(&mut self, record: CropRecord) -> SourceResult<HistoryChange> {
        let mut targets = LoadedTargets::new(&mut self.backend, &self.sources);
        let result = self.history.push(record, &mut targets);
        if let Err(err) = &result {
            let line = format!(
                "{}: {} crop failed: {err}",
                self.line_context().label(),
                self.active + 1
            );
            self.status.push(line);
        }
        result
    }

    /// Half-size crop around `pointer`, committed at once.
    fn quick_zoom(&mut self, pointer: Option<Point>) {
        self.interaction = self.interaction.cancel();
        let rect = quick_zoom_rect(pointer, self.bounds(), self.alignment.config);
        let record = CropRecord::from_selection(rect, self.history.current_offset());
        if self.push_crop(record).is_ok() {
            self.report_current_crop();
        }
    }

    /// Pops one crop. An active selection is carried over into the previous crop's frame.
    fn zoom_out(&mut self) {
        let mut targets = LoadedTargets::new(&mut self.backend, &self.sources);
        match self.history.pop(&mut targets) {
            Ok(HistoryChange::Popped { removed, top }) => {
                if self.interaction.is_active() {
                    let dx = offset_delta(removed.left, top.left);
                    let dy = offset_delta(removed.top, top.top);
                    self.interaction = self.interaction.rebase(dx, dy);
                }
                self.report_current_crop();
            }
            Ok(_) => tracing::debug!("already at the full frame"),
            Err(err) => {
                let line = format!(
                    "{}: {} preview return failed: {err}",
                    self.line_context().label(),
                    self.active + 1
                );
                self.status.push(line);
            }
        }
    }

    fn reset_all(&mut self) {
        let mut targets = LoadedTargets::new(&mut self.backend, &self.sources);
        match self.history.reset(&mut targets) {
            Ok(change) => {
                tracing::debug!(?change, "crop history reset");
                self.interaction = self.interaction.cancel();
                self.report_current_crop();
            }
            Err(err) => {
                self.status
                    .push(format!("clip: {} preview reset failed: {err}", self.active + 1));
            }
        }
    }

    fn pick_source(&mut self, index: usize) {
        if index >= self.sources.len() || index == self.active {
            return;
        }
        self.active = index;
        tracing::info!(clip = index + 1, "active source changed");
        self.report_current_crop();
    }

    fn nudge(&mut self, direction: NudgeDirection) {
        let context = self.selection_context();
        let (state, effect) = self.interaction.nudge(direction, &context);
        self.interaction = state;
        self.apply_effect(effect);
    }

    fn line_context(&self) -> CropLineContext {
        CropLineContext {
            source: self.active,
            subsampling: self.sources[self.active].descriptor.subsampling,
            alignment: self.alignment.config,
            selecting: self.interaction.is_active(),
            history_depth: self.history.len(),
        }
    }

    /// Record the crop line describes: the live selection while selecting, else the top crop.
    fn current_record(&self) -> CropRecord {
        match self.interaction.visible_rect() {
            Some(rect) => CropRecord::from_selection(rect, self.history.current_offset()),
            None => self.history.top(),
        }
    }

    pub fn current_crop_line(&self) -> CropLine {
        crop_command_line(self.current_record(), &self.line_context())
    }

    fn report_current_crop(&mut self) {
        let line = self.current_crop_line();
        if self.status.last() != Some(line.text.as_str()) {
            self.status.push(line.text);
        }
    }

    fn pixel_info(&mut self) {
        let context = self.line_context();
        let Some(point) = self.pointer else {
            self.status.push(format!(
                "{}: {} pointer is off preview area",
                context.label(),
                self.active + 1
            ));
            return;
        };
        let (abs_x, abs_y) = self.history.absolute(point);
        let source = &self.sources[self.active].descriptor;
        let mut line = format!(
            "clip{}: Frame:{}  Pixel: {},{}   {}",
            self.active + 1,
            self.playback.current_frame(),
            abs_x,
            abs_y,
            source.format_name
        );
        let pixel = self.displayed.as_ref().and_then(|frame| {
            let x = u32::try_from(point.x).ok()?;
            let y = u32::try_from(point.y).ok()?;
            (x < frame.width() && y < frame.height()).then(|| *frame.get_pixel(x, y))
        });
        if let Some(pixel) = pixel {
            let [r, g, b, _] = pixel.0;
            line.push_str(&format!("    preview: r:{r}  g:{g}  b:{b}"));
        }
        self.status.push(line);
    }

    fn write_image(&mut self, mode: WriteMode) {
        let Some(frame) = self.displayed.as_ref() else {
            self.status.push("no frame has been shown yet; nothing to write");
            return;
        };
        let snapshot = FrameSnapshot {
            label: self.line_context().label(),
            source: self.active,
            record: self.history.top(),
            frame: self.playback.current_frame(),
            mode,
        };
        let line = match self.storage.write_frame(frame, &snapshot, self.viewport) {
            Ok(path) => format!(
                "{}: {}  writing image: {}",
                snapshot.label,
                self.active + 1,
                path.display()
            ),
            Err(err) => format!(
                "{}: {}  image not written: {err}",
                snapshot.label,
                self.active + 1
            ),
        };
        self.status.push(line);
    }

    /// Fetches the active source's frame and draws the selection or a pending flash over it.
    pub fn render_frame(&mut self) -> RgbaImage {
        let frame = self.fetch_frame();
        let output = match (self.flash.take(), self.interaction.visible_rect()) {
            (Some(flash), _) => composite_flash(&frame, flash, self.selection_color()),
            (None, Some(rect)) => composite_selection(&frame, rect, self.selection_color()),
            (None, None) => frame.clone(),
        };
        self.displayed = Some(frame);
        output
    }

    fn selection_color(&self) -> Color {
        let subsampling = self.sources[self.active].descriptor.subsampling;
        if crop_is_valid(self.current_record(), subsampling) {
            GOOD_COLOR
        } else {
            BAD_COLOR
        }
    }

    fn fetch_frame(&mut self) -> RgbaImage {
        let top = self.history.top();
        if self.sources[self.active].is_placeholder() {
            return error_frame(top.width, top.height);
        }
        let frame = self.playback.current_frame();
        match self.backend.frame(self.active, frame) {
            Ok(image) => image,
            Err(err) => {
                self.playback.pause();
                self.status.push(format!(
                    "{err}\nclip: {}  Frame: {} ,Frame could not be rendered for this clip",
                    self.active + 1,
                    frame
                ));
                error_frame(top.width, top.height)
            }
        }
    }
}

fn offset_delta(old: u32, new: u32) -> i32 {
    let delta = i64::from(old) - i64::from(new);
    i32::try_from(delta).unwrap_or(if delta < 0 { i32::MIN } else { i32::MAX })
}
