//! Hit-testing of a pointer against the selection's corners, edges and interior.

use super::model::{ActiveObject, Corner, Edge};
use crate::geometry::{Point, SelectionRect};

pub const DEFAULT_PROXIMITY: i32 = 10;

fn near(value: i32, target: i32, proximity: i32) -> bool {
    value > target - proximity && value < target + proximity
}

fn within_span(value: i32, start: i32, end: i32, proximity: i32) -> bool {
    value > start - proximity && value < end + proximity
}

/// Corners are tested first, then edges, then the interior; right and bottom
/// use the last covered column and row.
pub fn pick_object(pointer: Point, rect: SelectionRect, proximity: i32) -> ActiveObject {
    let p = proximity.max(1);
    let left = rect.x1;
    let top = rect.y1;
    let right = rect.last_column();
    let bottom = rect.last_row();

    let corners = [
        (left, top, Corner::TopLeft),
        (left, bottom, Corner::BottomLeft),
        (right, top, Corner::TopRight),
        (right, bottom, Corner::BottomRight),
    ];
    for (x, y, corner) in corners {
        if near(pointer.x, x, p) && near(pointer.y, y, p) {
            return ActiveObject::Corner(corner);
        }
    }

    let spans_y = within_span(pointer.y, top, bottom, p);
    let spans_x = within_span(pointer.x, left, right, p);
    if spans_y && near(pointer.x, left, p) {
        return ActiveObject::Edge(Edge::Left);
    }
    if spans_y && near(pointer.x, right, p) {
        return ActiveObject::Edge(Edge::Right);
    }
    if spans_x && near(pointer.y, top, p) {
        return ActiveObject::Edge(Edge::Top);
    }
    if spans_x && near(pointer.y, bottom, p) {
        return ActiveObject::Edge(Edge::Bottom);
    }

    if rect.strictly_contains(pointer) {
        return ActiveObject::All;
    }
    ActiveObject::None
}

/// Fixed point for a drag of `object`: the opposite corner or edge.
pub fn anchor_for(object: ActiveObject, rect: SelectionRect) -> Point {
    let SelectionRect { x1, y1, x2, y2 } = rect;
    match object {
        ActiveObject::Corner(Corner::TopLeft) | ActiveObject::Edge(Edge::Top) => {
            Point::new(x2, y2)
        }
        ActiveObject::Corner(Corner::BottomLeft) | ActiveObject::Edge(Edge::Left) => {
            Point::new(x2, y1)
        }
        ActiveObject::Corner(Corner::TopRight) => Point::new(x1, y2),
        ActiveObject::Corner(Corner::BottomRight)
        | ActiveObject::Edge(Edge::Right | Edge::Bottom)
        | ActiveObject::All
        | ActiveObject::None => Point::new(x1, y1),
    }
}

/// Point that follows the pointer when `object` is dragged.
pub fn handle_point(object: ActiveObject, rect: SelectionRect) -> Point {
    let SelectionRect { x1, y1, x2, y2 } = rect;
    match object {
        ActiveObject::Corner(Corner::TopRight) => Point::new(x2, y1),
        ActiveObject::Corner(Corner::BottomLeft) => Point::new(x1, y2),
        ActiveObject::Corner(Corner::BottomRight)
        | ActiveObject::Edge(Edge::Right | Edge::Bottom) => Point::new(x2, y2),
        ActiveObject::Corner(Corner::TopLeft)
        | ActiveObject::Edge(Edge::Left | Edge::Top)
        | ActiveObject::All
        | ActiveObject::None => Point::new(x1, y1),
    }
}
