use crate::geometry::{Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const SKY: Color = Color([0x2b, 0x3a, 0x67, 0xff]);
    pub const PAUSE_DIM: Color = Color([0x10, 0x10, 0x18, 0xff]);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color([r, g, b, 0xff])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRect {
    pub rect: Rect,
    pub color: Color,
}

/// Colored rectangles for one presented frame. World rectangles are offset by `scroll`; HUD
/// rectangles are already in screen pixels and drawn last.
#[derive(Debug, Clone)]
pub struct DrawList {
    pub clear: Color,
    pub scroll: Vec2,
    pub world: Vec<DrawRect>,
    pub hud: Vec<DrawRect>,
}

impl Default for DrawList {
    fn default() -> Self {
        Self {
            clear: Color::SKY,
            scroll: Vec2::ZERO,
            world: Vec::new(),
            hud: Vec::new(),
        }
    }
}

impl DrawList {
    pub fn clear(&mut self) {
        self.clear = Color::SKY;
        self.scroll = Vec2::ZERO;
        self.world.clear();
        self.hud.clear();
    }

    pub fn world_rect(&mut self, rect: Rect, color: Color) {
        self.world.push(DrawRect { rect, color });
    }

    pub fn hud_rect(&mut self, rect: Rect, color: Color) {
        self.hud.push(DrawRect { rect, color });
    }
}
