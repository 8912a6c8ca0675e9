mod draw_list;
mod renderer;
mod transform;

pub use draw_list::{Color, DrawList, DrawRect};
pub use renderer::{rasterize, Renderer};
pub use transform::{clip_to_viewport, world_to_screen, PixelSpan, Viewport};
