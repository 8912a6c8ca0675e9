use crate::geometry::{Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Integer pixel rectangle, clipped to the viewport. `None` when nothing is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSpan {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

pub fn world_to_screen(world: Vec2, scroll: Vec2) -> (i32, i32) {
    (
        (world.x - scroll.x).round() as i32,
        (world.y - scroll.y).round() as i32,
    )
}

pub fn clip_to_viewport(rect: &Rect, scroll: Vec2, viewport: Viewport) -> Option<PixelSpan> {
    let (left, top) = world_to_screen(Vec2::new(rect.left(), rect.top()), scroll);
    let (right, bottom) = world_to_screen(Vec2::new(rect.right(), rect.bottom()), scroll);
    let x0 = left.clamp(0, viewport.width as i32);
    let y0 = top.clamp(0, viewport.height as i32);
    let x1 = right.clamp(0, viewport.width as i32);
    let y1 = bottom.clamp(0, viewport.height as i32);
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some(PixelSpan {
        x0: x0 as u32,
        y0: y0 as u32,
        x1: x1 as u32,
        y1: y1 as u32,
    })
}
