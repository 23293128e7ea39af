//! Overlay of the active selection and picked-object flashes onto a decoded frame.

use image::{Rgba, RgbaImage};

use crate::geometry::{Color, SelectionRect};
use crate::selection::{ActiveObject, Corner, Edge};

pub const GOOD_COLOR: Color = Color::new(0, 255, 0);
pub const BAD_COLOR: Color = Color::new(255, 0, 0);
pub const FLASH_COLOR: Color = Color::new(255, 255, 255);
pub const ERROR_FRAME_COLOR: Color = Color::new(96, 0, 0);

const FLASH_LINE_HALF_WIDTH: i32 = 2;
const FLASH_CORNER_HALF_SIZE: i32 = 5;

/// Rectangle outline with inclusive corners, as drawn by the flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outline {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Outline {
    const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Overlay requested for the next presented frame only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flash {
    pub object: ActiveObject,
    pub rect: SelectionRect,
}

/// Keeps the selection as is and inverts everything outside it, then draws the four
/// boundary lines across the whole frame in `color`.
pub fn composite_selection(frame: &RgbaImage, rect: SelectionRect, color: Color) -> RgbaImage {
    let mut output = frame.clone();
    for (x, y, pixel) in output.enumerate_pixels_mut() {
        if !inside(rect, x, y) {
            invert(pixel);
        }
    }

    let width = signed(output.width());
    let height = signed(output.height());
    let right = rect.last_column();
    let bottom = rect.last_row();
    for y in 0..height {
        put(&mut output, rect.x1, y, color);
        put(&mut output, right, y, color);
    }
    for x in 0..width {
        put(&mut output, x, rect.y1, color);
        put(&mut output, x, bottom, color);
    }
    output
}

/// Outlines flashed around a freshly picked object.
pub fn flash_outlines(
    object: ActiveObject,
    rect: SelectionRect,
    width: i32,
    height: i32,
) -> Vec<Outline> {
    let f = FLASH_LINE_HALF_WIDTH;
    let c = FLASH_CORNER_HALF_SIZE;
    let SelectionRect { x1, y1, x2, y2 } = rect;
    let right = x2 - 1;
    let bottom = y2 - 1;
    let corner = |x: i32, y: i32| Outline::new(x - c, y - c, x + c, y + c);
    match object {
        ActiveObject::None => Vec::new(),
        ActiveObject::Corner(Corner::TopLeft) => vec![corner(x1, y1)],
        ActiveObject::Corner(Corner::BottomLeft) => vec![corner(x1, bottom)],
        ActiveObject::Corner(Corner::TopRight) => vec![corner(right, y1)],
        ActiveObject::Corner(Corner::BottomRight) => vec![corner(right, bottom)],
        ActiveObject::Edge(Edge::Left) => vec![Outline::new(x1 - f, 0, x1 + f, height)],
        ActiveObject::Edge(Edge::Right) => vec![Outline::new(right - f, 0, right + f, height)],
        ActiveObject::Edge(Edge::Top) => vec![Outline::new(0, y1 - f, width, y1 + f)],
        ActiveObject::Edge(Edge::Bottom) => vec![Outline::new(0, bottom - f, width, bottom + f)],
        ActiveObject::All => vec![
            Outline::new(x1 - f, y1 - f, right + f, bottom + f),
            Outline::new(x1 + f, y1 + f, right - f, bottom - f),
        ],
    }
}

/// Composite of the selection plus the flash outlines of the picked object.
pub fn composite_flash(frame: &RgbaImage, flash: Flash, color: Color) -> RgbaImage {
    let mut output = composite_selection(frame, flash.rect, color);
    let width = signed(output.width());
    let height = signed(output.height());
    for outline in flash_outlines(flash.object, flash.rect, width, height) {
        draw_outline(&mut output, outline, FLASH_COLOR);
    }
    output
}

pub fn draw_outline(image: &mut RgbaImage, outline: Outline, color: Color) {
    let Outline {
        left,
        top,
        right,
        bottom,
    } = outline;
    for x in left..=right {
        put(image, x, top, color);
        put(image, x, bottom, color);
    }
    for y in top..=bottom {
        put(image, left, y, color);
        put(image, right, y, color);
    }
}

/// Solid frame shown in place of a frame that could not be decoded.
pub fn error_frame(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width.max(1), height.max(1), Rgba(ERROR_FRAME_COLOR.rgba()))
}

fn inside(rect: SelectionRect, x: u32, y: u32) -> bool {
    let (x, y) = (signed(x), signed(y));
    x >= rect.x1 && x < rect.x2 && y >= rect.y1 && y < rect.y2
}

fn invert(pixel: &mut Rgba<u8>) {
    let [r, g, b, a] = pixel.0;
    *pixel = Rgba([255 - r, 255 - g, 255 - b, a]);
}

fn put(image: &mut RgbaImage, x: i32, y: i32, color: Color) {
    let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
        return;
    };
    if x < image.width() && y < image.height() {
        image.put_pixel(x, y, Rgba(color.rgba()));
    }
}

fn signed(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
