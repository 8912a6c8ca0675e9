use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use super::draw_list::{DrawList, DrawRect};
use super::transform::{clip_to_viewport, Viewport};
use crate::geometry::Vec2;

/// Presents a [`DrawList`] through a fixed logical resolution scaled to the window.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    logical: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>, logical: Viewport) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height, logical)?;
        Ok(Self {
            window,
            pixels,
            logical,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height, self.logical)?;
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
        logical: Viewport,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(logical.width, logical.height, surface)
    }

    pub fn present(&mut self, list: &DrawList) -> Result<(), Error> {
        rasterize(self.pixels.frame_mut(), self.logical, list);
        self.pixels.render()
    }
}

/// Fills an RGBA8 frame of `viewport` size from the draw list.
pub fn rasterize(frame: &mut [u8], viewport: Viewport, list: &DrawList) {
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&list.clear.0);
    }
    for draw in &list.world {
        fill(frame, viewport, draw, list.scroll);
    }
    for draw in &list.hud {
        fill(frame, viewport, draw, Vec2::ZERO);
    }
}

fn fill(frame: &mut [u8], viewport: Viewport, draw: &DrawRect, scroll: Vec2) {
    let Some(span) = clip_to_viewport(&draw.rect, scroll, viewport) else {
        return;
    };
    let stride = viewport.width as usize * 4;
    for y in span.y0..span.y1 {
        let row = y as usize * stride;
        let start = row + span.x0 as usize * 4;
        let end = row + span.x1 as usize * 4;
        let Some(pixels) = frame.get_mut(start..end) else {
            return;
        };
        for chunk in pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&draw.color.0);
        }
    }
}
