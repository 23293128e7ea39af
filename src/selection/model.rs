use crate::alignment::AlignmentConfig;
use crate::geometry::{FrameBounds, Point, SelectionRect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

/// Part of the selection picked by the last pointer-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveObject {
    #[default]
    None,
    Corner(Corner),
    Edge(Edge),
    All,
}

impl ActiveObject {
    pub const fn axes(self) -> AxisUse {
        match self {
            Self::Edge(Edge::Left | Edge::Right) => AxisUse::X_ONLY,
            Self::Edge(Edge::Top | Edge::Bottom) => AxisUse::Y_ONLY,
            _ => AxisUse::BOTH,
        }
    }

    pub const fn is_handle(self) -> bool {
        matches!(self, Self::Corner(_) | Self::Edge(_))
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Corner(Corner::TopLeft) => "left_top_corner",
            Self::Corner(Corner::TopRight) => "right_top_corner",
            Self::Corner(Corner::BottomLeft) => "left_bottom_corner",
            Self::Corner(Corner::BottomRight) => "right_bottom_corner",
            Self::Edge(Edge::Top) => "top_line",
            Self::Edge(Edge::Bottom) => "bottom_line",
            Self::Edge(Edge::Left) => "left_line",
            Self::Edge(Edge::Right) => "right_line",
            Self::All => "all",
        }
    }
}

/// Axes the geometry engine may move for the active object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisUse {
    pub x: bool,
    pub y: bool,
}

impl AxisUse {
    pub const BOTH: Self = Self { x: true, y: true };
    pub const X_ONLY: Self = Self { x: true, y: false };
    pub const Y_ONLY: Self = Self { x: false, y: true };
}

impl Default for AxisUse {
    fn default() -> Self {
        Self::BOTH
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPhase {
    #[default]
    Idle,
    Drawing,
    Defined,
    Editing,
    Panning,
    Committing,
}

impl SelectionPhase {
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Everything the pointer handlers read and return; owned by the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InteractionState {
    pub phase: SelectionPhase,
    pub rect: Option<SelectionRect>,
    pub anchor: Point,
    pub object: ActiveObject,
    pub axes: AxisUse,
    /// Pointer offset from the rectangle's top-left while panning.
    pub grab_offset: Point,
    /// Raw pointer-down position that started the current drawing.
    pub touch: Point,
    pub commit_armed: bool,
}

impl InteractionState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    /// Rectangle worth showing: present, and the machine is not idle.
    pub fn visible_rect(&self) -> Option<SelectionRect> {
        self.rect.filter(|_| self.is_active())
    }
}

/// Per-frame constants the handlers need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionContext {
    pub bounds: FrameBounds,
    /// Original (uncropped) source size, used for aspect-ratio locking.
    pub original: (u32, u32),
    pub alignment: AlignmentConfig,
    pub proximity: i32,
}
