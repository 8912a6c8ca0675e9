use crate::geometry::{ContactSides, Rect, Side, Vec2};

pub const GRAVITY_Y: f32 = 600.0;

/// Arcade-style body. `x`/`y` is the top-left corner of the collision box.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub max_velocity: Option<Vec2>,
    pub allow_gravity: bool,
    pub gravity_scale: f32,
    pub enabled: bool,
    pub blocked: ContactSides,
}

impl Body {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            max_velocity: None,
            allow_gravity: true,
            gravity_scale: 1.0,
            enabled: true,
            blocked: ContactSides::default(),
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.bounds().center()
    }

    pub fn on_floor(&self) -> bool {
        self.blocked.down
    }

    pub fn on_wall(&self) -> bool {
        self.blocked.left || self.blocked.right
    }

    pub fn set_velocity(&mut self, x: f32, y: f32) {
        self.velocity = Vec2::new(x, y);
    }

    pub fn set_acceleration(&mut self, x: f32, y: f32) {
        self.acceleration = Vec2::new(x, y);
    }

    pub fn halt(&mut self) {
        self.velocity = Vec2::ZERO;
        self.acceleration = Vec2::ZERO;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    /// Index into the solids slice handed to [`move_and_collide`].
    pub solid: usize,
    /// Side of the moving body that hit the solid.
    pub side: Side,
}

pub fn integrate_velocity(body: &mut Body, dt_seconds: f32, gravity_y: f32) {
    if !body.enabled {
        return;
    }
    let gravity = if body.allow_gravity {
        gravity_y * body.gravity_scale
    } else {
        0.0
    };
    body.velocity.x += body.acceleration.x * dt_seconds;
    body.velocity.y += (body.acceleration.y + gravity) * dt_seconds;
    if let Some(max) = body.max_velocity {
        body.velocity.x = body.velocity.x.clamp(-max.x, max.x);
        body.velocity.y = body.velocity.y.clamp(-max.y, max.y);
    }
}

/// Moves the body by its velocity one axis at a time, pushing it out of every overlapped
/// solid. Blocked flags are recomputed from scratch each call.
pub fn move_and_collide(body: &mut Body, dt_seconds: f32, solids: &[Rect]) -> Vec<Contact> {
    let mut contacts = Vec::new();
    body.blocked.clear();
    if !body.enabled {
        return contacts;
    }

    let dx = body.velocity.x * dt_seconds;
    body.x += dx;
    if dx != 0.0 {
        for (index, solid) in solids.iter().enumerate() {
            if !body.bounds().overlaps(solid) {
                continue;
            }
            let side = if dx > 0.0 {
                body.x = solid.left() - body.width;
                Side::Right
            } else {
                body.x = solid.right();
                Side::Left
            };
            body.blocked.set(side);
            body.velocity.x = 0.0;
            contacts.push(Contact { solid: index, side });
        }
    }

    let dy = body.velocity.y * dt_seconds;
    body.y += dy;
    if dy != 0.0 {
        for (index, solid) in solids.iter().enumerate() {
            if !body.bounds().overlaps(solid) {
                continue;
            }
            let side = if dy > 0.0 {
                body.y = solid.top() - body.height;
                Side::Down
            } else {
                body.y = solid.bottom();
                Side::Up
            };
            body.blocked.set(side);
            body.velocity.y = 0.0;
            contacts.push(Contact { solid: index, side });
        }
    }

    contacts
}

/// Rectangle covering everything the body can touch this step, for broad-phase queries.
pub fn swept_bounds(body: &Body, dt_seconds: f32) -> Rect {
    let bounds = body.bounds();
    let dx = body.velocity.x * dt_seconds;
    let dy = body.velocity.y * dt_seconds;
    let left = bounds.left().min(bounds.left() + dx) - 1.0;
    let top = bounds.top().min(bounds.top() + dy) - 1.0;
    let right = bounds.right().max(bounds.right() + dx) + 1.0;
    let bottom = bounds.bottom().max(bounds.bottom() + dy) + 1.0;
    Rect::new(left, top, right - left, bottom - top)
}
