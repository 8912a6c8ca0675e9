use crate::geometry::{Rect, Vec2};

pub const SCREEN_WIDTH: f32 = 384.0;
pub const SCREEN_HEIGHT: f32 = 216.0;

/// Follows a focus point and clamps its scroll to the level bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera2D {
    focus: Vec2,
    viewport: Vec2,
    bounds: Rect,
    committed_scroll: Option<Vec2>,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self::new(
            Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            Rect::new(0.0, 0.0, SCREEN_WIDTH, SCREEN_HEIGHT),
        )
    }
}

impl Camera2D {
    pub fn new(viewport: Vec2, bounds: Rect) -> Self {
        Self {
            focus: Vec2::ZERO,
            viewport,
            bounds,
            committed_scroll: None,
        }
    }

    pub fn focus(&self) -> Vec2 {
        self.focus
    }

    pub fn set_focus(&mut self, focus: Vec2) {
        self.focus = focus;
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    /// Moves the focus toward the mean of `points`, at most `max_step` per axis. With no
    /// points the focus stays where it is. Returns whether the focus moved.
    pub fn track<I>(&mut self, points: I, max_step: f32) -> bool
    where
        I: IntoIterator<Item = Vec2>,
    {
        let mut sum = Vec2::ZERO;
        let mut count = 0u32;
        for point in points {
            sum.x += point.x;
            sum.y += point.y;
            count += 1;
        }
        if count == 0 {
            return false;
        }
        let target = Vec2::new(sum.x / count as f32, sum.y / count as f32);
        let next = Vec2::new(
            step_toward(self.focus.x, target.x, max_step),
            step_toward(self.focus.y, target.y, max_step),
        );
        let moved = next != self.focus;
        self.focus = next;
        moved
    }

    pub fn scroll(&self) -> Vec2 {
        Vec2::new(
            clamp_axis(
                self.focus.x - self.viewport.x * 0.5,
                self.bounds.left(),
                self.bounds.right() - self.viewport.x,
            ),
            clamp_axis(
                self.focus.y - self.viewport.y * 0.5,
                self.bounds.top(),
                self.bounds.bottom() - self.viewport.y,
            ),
        )
    }

    pub fn view_rect(&self) -> Rect {
        let scroll = self.scroll();
        Rect::new(scroll.x, scroll.y, self.viewport.x, self.viewport.y)
    }

    /// True when the scroll differs from the last [`Camera2D::commit_scroll`] (or was never
    /// committed).
    pub fn scroll_changed(&self) -> bool {
        self.committed_scroll != Some(self.scroll())
    }

    pub fn commit_scroll(&mut self) {
        self.committed_scroll = Some(self.scroll());
    }
}

fn step_toward(current: f32, target: f32, max_step: f32) -> f32 {
    let offset = target - current;
    if offset < -max_step {
        current - max_step
    } else if offset > max_step {
        current + max_step
    } else {
        target
    }
}

fn clamp_axis(value: f32, min: f32, max: f32) -> f32 {
    if max < min {
        return min;
    }
    value.clamp(min, max)
}
