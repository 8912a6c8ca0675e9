use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Axis-aligned rectangle anchored at its top-left corner, y growing downward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_center(center: Vec2, width: f32, height: f32) -> Self {
        Self::new(
            center.x - width * 0.5,
            center.y - height * 0.5,
            width,
            height,
        )
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Strict overlap: rectangles that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Inclusive intersection: touching edges count. Degenerate rectangles never intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.width <= 0.0 || self.height <= 0.0 || other.width <= 0.0 || other.height <= 0.0
        {
            return false;
        }
        !(self.right() < other.x
            || self.bottom() < other.y
            || self.x > other.right()
            || self.y > other.bottom())
    }

    pub fn expanded(&self, margin_x: f32, margin_y: f32) -> Rect {
        Rect::new(
            self.x - margin_x,
            self.y - margin_y,
            self.width + margin_x * 2.0,
            self.height + margin_y * 2.0,
        )
    }

    pub fn spans_y(&self, y: f32) -> bool {
        y >= self.top() && y <= self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactSides {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl ContactSides {
    pub fn set(&mut self, side: Side) {
        match side {
            Side::Up => self.up = true,
            Side::Down => self.down = true,
            Side::Left => self.left = true,
            Side::Right => self.right = true,
        }
    }

    pub fn has(&self, side: Side) -> bool {
        match side {
            Side::Up => self.up,
            Side::Down => self.down,
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Which side of `subject` presses into `other`, picked along the axis of least penetration.
/// Returns `None` when the rectangles do not overlap.
pub fn contact_side(subject: &Rect, other: &Rect) -> Option<Side> {
    if !subject.overlaps(other) {
        return None;
    }
    let push_left = subject.right() - other.left();
    let push_right = other.right() - subject.left();
    let push_up = subject.bottom() - other.top();
    let push_down = other.bottom() - subject.top();

    let horizontal = push_left.min(push_right);
    let vertical = push_up.min(push_down);
    if horizontal < vertical {
        if push_left < push_right {
            Some(Side::Right)
        } else {
            Some(Side::Left)
        }
    } else if push_up < push_down {
        Some(Side::Down)
    } else {
        Some(Side::Up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlaps_is_strict_on_shared_edges() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let touching = Rect::new(10.0, 0.0, 10.0, 10.0);
        let inside = Rect::new(9.0, 9.0, 4.0, 4.0);

        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&inside));
    }

    #[test]
    fn intersects_counts_touching_edges() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let touching = Rect::new(10.0, 0.0, 10.0, 10.0);
        let far = Rect::new(11.0, 0.0, 10.0, 10.0);

        assert!(a.intersects(&touching));
        assert!(!a.intersects(&far));
        assert!(!a.intersects(&Rect::new(2.0, 2.0, 0.0, 4.0)));
    }

    #[test]
    fn contact_side_picks_least_penetration_axis() {
        let wall = Rect::new(20.0, 0.0, 16.0, 64.0);
        let from_left = Rect::new(6.0, 10.0, 16.0, 30.0);
        let floor = Rect::new(0.0, 40.0, 64.0, 16.0);
        let standing = Rect::new(10.0, 11.0, 16.0, 30.0);

        assert_eq!(contact_side(&from_left, &wall), Some(Side::Right));
        assert_eq!(contact_side(&standing, &floor), Some(Side::Down));
        assert_eq!(contact_side(&standing, &Rect::new(100.0, 0.0, 1.0, 1.0)), None);
    }

    #[test]
    fn from_center_round_trips_center() {
        let rect = Rect::from_center(Vec2::new(50.0, 20.0), 24.0, 32.0);
        assert_eq!(rect.center(), Vec2::new(50.0, 20.0));
        assert_eq!(rect.left(), 38.0);
        assert_eq!(rect.bottom(), 36.0);
    }
}
