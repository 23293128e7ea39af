//! Crop-command text for pasting into scripts, and the bounded status log.

use std::collections::VecDeque;
use std::fmt;

use crate::alignment::{AlignmentConfig, Subsampling};
use crate::geometry::is_multiple;
use crate::history::CropRecord;

pub const STATUS_LOG_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropLabel {
    SelectionInClip,
    CroppedClip,
    Clip,
}

impl CropLabel {
    pub fn current(selecting: bool, history_depth: usize) -> Self {
        if selecting {
            Self::SelectionInClip
        } else if history_depth > 1 {
            Self::CroppedClip
        } else {
            Self::Clip
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SelectionInClip => "selection_in_clip",
            Self::CroppedClip => "cropped_clip",
            Self::Clip => "clip",
        }
    }
}

impl fmt::Display for CropLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a crop line depends on besides the record itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropLineContext {
    /// Zero-based index of the source being previewed.
    pub source: usize,
    /// Subsampling of that source alone.
    pub subsampling: Subsampling,
    pub alignment: AlignmentConfig,
    pub selecting: bool,
    pub history_depth: usize,
}

impl CropLineContext {
    pub fn label(&self) -> CropLabel {
        CropLabel::current(self.selecting, self.history_depth)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropLine {
    pub text: String,
    pub valid: bool,
}

/// A crop is usable downstream when its size is non-zero and both size and position
/// respect the source's subsampling.
pub fn crop_is_valid(record: CropRecord, subsampling: Subsampling) -> bool {
    record.width != 0
        && record.height != 0
        && is_multiple(i64::from(record.width), subsampling.x)
        && is_multiple(i64::from(record.height), subsampling.y)
        && is_multiple(i64::from(record.left), subsampling.x)
        && is_multiple(i64::from(record.top), subsampling.y)
}

pub fn crop_command_line(record: CropRecord, context: &CropLineContext) -> CropLine {
    let clip = context.source + 1;
    let valid = crop_is_valid(record, context.subsampling);
    let mut text = format!(
        "{label}{clip} = Crop(clip{clip}, width={w}, height={h}, left={l}, top={t})",
        label = context.label(),
        w = record.width,
        h = record.height,
        l = record.left,
        t = record.top,
    );
    if context.selecting || context.history_depth > 1 {
        let alignment = context.alignment;
        text.push_str(&format!(
            "  #mods({},{}) #subs({},{})",
            alignment.mod_x, alignment.mod_y, alignment.subs_x, alignment.subs_y
        ));
    }
    if !valid {
        text.push_str(" #fails-alignment");
    }
    CropLine { text, valid }
}

/// Status lines kept for a host status bar, most recent last; each one is also logged.
#[derive(Debug, Clone)]
pub struct StatusLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for StatusLog {
    fn default() -> Self {
        Self::with_capacity(STATUS_LOG_CAPACITY)
    }
}

impl StatusLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!(status = %line);
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}
