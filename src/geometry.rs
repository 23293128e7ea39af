//! Shared geometric and color primitives used by the selection, render and session modules.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Snaps both coordinates down to the given per-axis steps.
    pub fn snapped(self, step_x: u32, step_y: u32) -> Self {
        Self::new(snap_down(self.x, step_x), snap_down(self.y, step_y))
    }
}

/// Display-space rectangle with exclusive right/bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionRect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl SelectionRect {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub const fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub const fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub const fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub const fn top_left(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    /// Last column and row covered by the rectangle, never left of `x1`/above `y1`.
    pub fn last_column(&self) -> i32 {
        self.x1.max(self.x2 - 1)
    }

    pub fn last_row(&self) -> i32 {
        self.y1.max(self.y2 - 1)
    }

    pub const fn translated(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }

    pub const fn strictly_contains(&self, point: Point) -> bool {
        point.x > self.x1 && point.x < self.x2 && point.y > self.y1 && point.y < self.y2
    }

    pub fn fits_within(&self, bounds: FrameBounds) -> bool {
        self.x1 >= 0 && self.y1 >= 0 && self.x2 <= bounds.width && self.y2 <= bounds.height
    }
}

/// Size of the currently displayed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBounds {
    pub width: i32,
    pub height: i32,
}

impl FrameBounds {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn from_u32(width: u32, height: u32) -> Self {
        Self::new(
            i32::try_from(width).unwrap_or(i32::MAX),
            i32::try_from(height).unwrap_or(i32::MAX),
        )
    }

    pub const fn center(&self) -> Point {
        Point::new(self.width / 2, self.height / 2)
    }

    pub fn contains(&self, point: Point) -> bool {
        (0..self.width).contains(&point.x) && (0..self.height).contains(&point.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn rgb(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    pub const fn rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// Rounds `value` down to a multiple of `step`, flooring for negative values.
pub fn snap_down(value: i32, step: u32) -> i32 {
    let step = i32::try_from(step.max(1)).unwrap_or(i32::MAX);
    value - value.rem_euclid(step)
}

pub fn is_multiple(value: i64, step: u32) -> bool {
    step != 0 && value.rem_euclid(i64::from(step)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_down_floors_negative_values() {
        assert_eq!(snap_down(11, 2), 10);
        assert_eq!(snap_down(12, 4), 12);
        assert_eq!(snap_down(-3, 2), -4);
        assert_eq!(snap_down(7, 0), 7);
    }

    #[test]
    fn last_column_and_row_stay_inside_degenerate_rect() {
        let rect = SelectionRect::new(10, 10, 10, 30);
        assert_eq!(rect.last_column(), 10);
        assert_eq!(rect.last_row(), 29);
        assert!(rect.is_empty());
    }

    #[test]
    fn strictly_contains_excludes_borders() {
        let rect = SelectionRect::new(0, 0, 10, 10);
        assert!(rect.strictly_contains(Point::new(5, 5)));
        assert!(!rect.strictly_contains(Point::new(0, 5)));
        assert!(!rect.strictly_contains(Point::new(5, 10)));
    }
}
