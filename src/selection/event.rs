use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Up,
    Move,
    DoubleClick,
    SecondaryDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub position: Point,
    pub shift_held: bool,
}

impl PointerEvent {
    pub const fn new(kind: PointerKind, x: i32, y: i32) -> Self {
        Self {
            kind,
            position: Point::new(x, y),
            shift_held: false,
        }
    }

    pub const fn with_shift(mut self) -> Self {
        self.shift_held = true;
        self
    }
}

/// Inputs of the phase transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionTrigger {
    Press,
    PickHandle,
    PickAll,
    Release,
    Commit,
    CommitApplied,
    CommitRejected,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeDirection {
    Up,
    Down,
    Left,
    Right,
}

impl NudgeDirection {
    /// Unit displacement on each axis.
    pub const fn unit(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}
