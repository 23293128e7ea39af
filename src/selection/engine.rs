//! Pure rectangle derivation: drawing from an anchor, panning, and the quick-zoom half frame.

use super::model::{AxisUse, SelectionContext};
use crate::alignment::AlignmentConfig;
use crate::geometry::{snap_down, FrameBounds, Point, SelectionRect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryOutcome {
    pub rect: SelectionRect,
    /// Aspect lock was requested but no integral, mod-aligned height fits.
    pub aspect_infeasible: bool,
}

fn step(value: u32) -> i32 {
    i32::try_from(value.max(1)).unwrap_or(i32::MAX)
}

fn floor_to(value: i32, modulus: u32) -> i32 {
    let value = value.max(0);
    value - value % step(modulus)
}

/// Ordered span between anchor and pointer on one axis, clipped to `[0, bound]`.
fn span(anchor: i32, pointer: i32, bound: i32) -> (i32, i32, bool) {
    let anchor = anchor.clamp(0, bound.max(0));
    if pointer >= anchor {
        (anchor, pointer.min(bound), true)
    } else {
        (pointer.max(0), anchor, false)
    }
}

/// Largest mod-aligned width not above `width` whose aspect-locked height is integral,
/// mod-aligned and no taller than `max_height`.
fn locked_size(
    width: i32,
    max_height: i32,
    original: (u32, u32),
    alignment: AlignmentConfig,
) -> Option<(i32, i32)> {
    let (orig_w, orig_h) = (i64::from(original.0.max(1)), i64::from(original.1.max(1)));
    let mod_x = step(alignment.mod_x);
    let mod_y = i64::from(alignment.mod_y.max(1));
    let mut candidate = width;
    while candidate > 0 {
        let scaled = i64::from(candidate) * orig_h;
        if scaled % orig_w == 0 {
            let height = scaled / orig_w;
            if height % mod_y == 0 && height <= i64::from(max_height) {
                return Some((candidate, i32::try_from(height).ok()?));
            }
        }
        candidate -= mod_x;
    }
    None
}

/// Spans the rectangle between `anchor` and `pointer` on every enabled axis; disabled
/// axes keep `current`. Sizes round down to the mods so the result never leaves `bounds`.
pub fn new_rectangle(
    pointer: Point,
    anchor: Point,
    current: SelectionRect,
    axes: AxisUse,
    context: &SelectionContext,
    lock_aspect: bool,
) -> GeometryOutcome {
    let FrameBounds { width: bound_w, height: bound_h } = context.bounds;
    let alignment = context.alignment;

    let (mut x1, mut x2, mut width) = (current.x1, current.x2, current.width());
    let mut forward_x = true;
    if axes.x {
        let (start, end, forward) = span(anchor.x, pointer.x, bound_w);
        (x1, x2, forward_x) = (start, end, forward);
        width = floor_to(end - start, alignment.mod_x);
    }

    let (mut y1, mut y2, mut height) = (current.y1, current.y2, current.height());
    let mut forward_y = true;
    if axes.y {
        let (start, end, forward) = span(anchor.y, pointer.y, bound_h);
        (y1, y2, forward_y) = (start, end, forward);
        height = floor_to(end - start, alignment.mod_y);
    }

    let mut aspect_infeasible = false;
    if lock_aspect && axes.x && axes.y {
        match locked_size(width, y2 - y1, context.original, alignment) {
            Some((locked_w, locked_h)) => {
                width = locked_w;
                height = locked_h;
            }
            None => {
                width = 0;
                aspect_infeasible = true;
            }
        }
    }

    if axes.x {
        if forward_x {
            x2 = x1 + width;
        } else {
            x1 = x2 - width;
        }
    }
    if axes.y {
        if forward_y {
            y2 = y1 + height;
        } else {
            y1 = y2 - height;
        }
    }

    GeometryOutcome {
        rect: SelectionRect::new(x1, y1, x2, y2),
        aspect_infeasible,
    }
}

/// Translates `current` so its top-left follows `pointer - grab`, snapped to the
/// subsampling steps and kept inside `bounds`. With `lock_axis` the axis with the
/// smaller displacement from `anchor` stays frozen.
pub fn move_rectangle(
    pointer: Point,
    grab: Point,
    anchor: Point,
    current: SelectionRect,
    context: &SelectionContext,
    lock_axis: bool,
) -> SelectionRect {
    let width = current.width().max(0);
    let height = current.height().max(0);
    let alignment = context.alignment;
    let max_x = (context.bounds.width - width).max(0);
    let max_y = (context.bounds.height - height).max(0);

    let mut x1 = snap_down((pointer.x - grab.x).clamp(0, max_x), alignment.subs_x);
    let mut y1 = snap_down((pointer.y - grab.y).clamp(0, max_y), alignment.subs_y);

    if lock_axis {
        if (x1 - anchor.x).abs() > (y1 - anchor.y).abs() {
            y1 = anchor.y;
        } else {
            x1 = anchor.x;
        }
    }

    SelectionRect::new(x1, y1, x1 + width, y1 + height)
}

/// Half-size rectangle centred on `pointer` (frame centre when the pointer is
/// unknown or off the frame), aligned and shifted back inside `bounds`.
pub fn quick_zoom_rect(
    pointer: Option<Point>,
    bounds: FrameBounds,
    alignment: AlignmentConfig,
) -> SelectionRect {
    let width = floor_to(bounds.width / 2, alignment.mod_x);
    let height = floor_to(bounds.height / 2, alignment.mod_y);
    let center = pointer
        .filter(|point| bounds.contains(*point))
        .unwrap_or_else(|| bounds.center());

    let mut x1 = snap_down((center.x - width / 2).max(0), alignment.subs_x);
    let mut y1 = snap_down((center.y - height / 2).max(0), alignment.subs_y);
    if x1 + width >= bounds.width {
        x1 = snap_down(bounds.width - width, alignment.subs_x);
    }
    if y1 + height >= bounds.height {
        y1 = snap_down(bounds.height - height, alignment.subs_y);
    }
    SelectionRect::new(x1, y1, x1 + width, y1 + height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(width: i32, height: i32, alignment: AlignmentConfig) -> SelectionContext {
        SelectionContext {
            bounds: FrameBounds::new(width, height),
            original: (
                u32::try_from(width).expect("positive width"),
                u32::try_from(height).expect("positive height"),
            ),
            alignment,
            proximity: 10,
        }
    }

    #[test]
    fn drag_snaps_size_down_to_mods() {
        let ctx = context(100, 100, AlignmentConfig::new(2, 2, 2, 2));
        let outcome = new_rectangle(
            Point::new(51, 73),
            Point::new(10, 10),
            SelectionRect::default(),
            AxisUse::BOTH,
            &ctx,
            false,
        );
        assert_eq!(outcome.rect, SelectionRect::new(10, 10, 50, 72));
        assert_eq!(outcome.rect.width(), 40);
        assert_eq!(outcome.rect.height(), 62);
        assert!(!outcome.aspect_infeasible);
    }

    #[test]
    fn drag_towards_origin_keeps_anchor_as_far_edge_and_clips() {
        let ctx = context(100, 100, AlignmentConfig::new(4, 4, 2, 2));
        let outcome = new_rectangle(
            Point::new(-7, 3),
            Point::new(30, 40),
            SelectionRect::default(),
            AxisUse::BOTH,
            &ctx,
            false,
        );
        assert_eq!(outcome.rect, SelectionRect::new(2, 4, 30, 40));
    }

    #[test]
    fn drag_results_are_aligned_and_inside_bounds() {
        let alignment = AlignmentConfig::new(4, 8, 2, 2);
        let ctx = context(97, 61, alignment);
        for (px, py) in [(0, 0), (200, 200), (-50, 300), (96, 1), (13, 59)] {
            for (ax, ay) in [(0, 0), (48, 30), (96, 60)] {
                let rect = new_rectangle(
                    Point::new(px, py),
                    Point::new(ax, ay),
                    SelectionRect::default(),
                    AxisUse::BOTH,
                    &ctx,
                    false,
                )
                .rect;
                assert_eq!(rect.width() % 4, 0, "{rect:?}");
                assert_eq!(rect.height() % 8, 0, "{rect:?}");
                assert!(rect.fits_within(ctx.bounds), "{rect:?}");
            }
        }
    }

    #[test]
    fn disabled_axis_keeps_current_extent() {
        let ctx = context(100, 100, AlignmentConfig::new(2, 2, 2, 2));
        let current = SelectionRect::new(10, 10, 50, 50);
        let outcome = new_rectangle(
            Point::new(70, 90),
            Point::new(10, 10),
            current,
            AxisUse::X_ONLY,
            &ctx,
            false,
        );
        assert_eq!(outcome.rect, SelectionRect::new(10, 10, 70, 50));
    }

    #[test]
    fn aspect_lock_picks_largest_integral_width() {
        let mut ctx = context(1920, 1080, AlignmentConfig::new(4, 4, 2, 2));
        ctx.original = (1920, 1080);
        let outcome = new_rectangle(
            Point::new(123, 50),
            Point::new(0, 0),
            SelectionRect::default(),
            AxisUse::BOTH,
            &ctx,
            true,
        );
        assert_eq!(outcome.rect, SelectionRect::new(0, 0, 64, 36));
        assert!(!outcome.aspect_infeasible);
    }

    #[test]
    fn aspect_lock_without_candidate_collapses_width() {
        let ctx = context(1920, 1080, AlignmentConfig::new(4, 4, 2, 2));
        let outcome = new_rectangle(
            Point::new(40, 10),
            Point::new(0, 0),
            SelectionRect::default(),
            AxisUse::BOTH,
            &ctx,
            true,
        );
        assert!(outcome.aspect_infeasible);
        assert_eq!(outcome.rect.width(), 0);
    }

    #[test]
    fn new_rectangle_is_deterministic() {
        let ctx = context(640, 360, AlignmentConfig::new(4, 4, 2, 2));
        let run = || {
            new_rectangle(
                Point::new(333, 201),
                Point::new(12, 8),
                SelectionRect::default(),
                AxisUse::BOTH,
                &ctx,
                true,
            )
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn move_keeps_size_aligns_position_and_stays_inside() {
        let ctx = context(100, 100, AlignmentConfig::new(2, 2, 4, 2));
        let current = SelectionRect::new(8, 10, 48, 72);
        for (px, py) in [(0, 0), (55, 33), (99, 99), (-40, 500), (61, 17)] {
            let moved = move_rectangle(
                Point::new(px, py),
                Point::new(5, 5),
                current.top_left(),
                current,
                &ctx,
                false,
            );
            assert_eq!(moved.width(), current.width());
            assert_eq!(moved.height(), current.height());
            assert_eq!(moved.x1 % 4, 0, "{moved:?}");
            assert_eq!(moved.y1 % 2, 0, "{moved:?}");
            assert!(moved.fits_within(ctx.bounds), "{moved:?}");
        }
    }

    #[test]
    fn move_with_axis_lock_freezes_smaller_displacement() {
        let ctx = context(200, 200, AlignmentConfig::new(2, 2, 2, 2));
        let current = SelectionRect::new(20, 20, 60, 60);
        let moved = move_rectangle(
            Point::new(90, 34),
            Point::new(10, 10),
            current.top_left(),
            current,
            &ctx,
            true,
        );
        assert_eq!(moved, SelectionRect::new(80, 20, 120, 60));

        let moved = move_rectangle(
            Point::new(34, 90),
            Point::new(10, 10),
            current.top_left(),
            current,
            &ctx,
            true,
        );
        assert_eq!(moved, SelectionRect::new(20, 80, 60, 120));
    }

    #[test]
    fn quick_zoom_centres_on_pointer_inside_bounds() {
        let rect = quick_zoom_rect(
            Some(Point::new(80, 20)),
            FrameBounds::new(200, 100),
            AlignmentConfig::new(2, 2, 2, 2),
        );
        assert_eq!(rect.width(), 100);
        assert_eq!(rect.height(), 50);
        assert_eq!(rect, SelectionRect::new(30, 0, 130, 50));
        assert!(rect.x1 + 50 <= 200 && rect.y1 + 25 <= 100);
    }

    #[test]
    fn quick_zoom_near_far_corner_shifts_back_inside() {
        let rect = quick_zoom_rect(
            Some(Point::new(199, 99)),
            FrameBounds::new(200, 100),
            AlignmentConfig::new(4, 4, 4, 4),
        );
        assert_eq!(rect, SelectionRect::new(100, 52, 200, 100));
    }

    #[test]
    fn quick_zoom_without_pointer_uses_centre() {
        let rect = quick_zoom_rect(
            None,
            FrameBounds::new(200, 100),
            AlignmentConfig::new(2, 2, 2, 2),
        );
        assert_eq!(rect, SelectionRect::new(50, 24, 150, 74));
    }
}
