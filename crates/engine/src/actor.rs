use crate::geometry::{Rect, Vec2};
use crate::physics::Body;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u64);

#[derive(Debug, Default)]
pub struct ActorIdAllocator {
    next: u64,
}

impl ActorIdAllocator {
    /// Allocator whose first id is `first`; ids below it stay free for the caller.
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    pub fn allocate(&mut self) -> ActorId {
        let id = ActorId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn opposite(self) -> Facing {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }

    /// Facing for a signed direction; zero keeps `fallback`.
    pub fn from_sign(value: f32, fallback: Facing) -> Facing {
        if value > 0.0 {
            Facing::Right
        } else if value < 0.0 {
            Facing::Left
        } else {
            fallback
        }
    }
}

/// Result of routing a hit through [`ActorCore::apply_damage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// The actor was already defeated or invincible; nothing changed.
    Absorbed,
    Damaged { defeated: bool },
}

/// Hit point value meaning "cannot be damaged".
pub const HP_INVINCIBLE: i32 = -1;

/// State shared by every actor: its physics body, facing, hit points and the sprite frame
/// the body is laid out against.
#[derive(Debug, Clone)]
pub struct ActorCore {
    pub id: ActorId,
    pub body: Body,
    pub hp: i32,
    pub max_hp: i32,
    pub variant: Option<u8>,
    pub visible: bool,
    frame_width: f32,
    frame_height: f32,
    offset: Vec2,
    facing: Facing,
    custom_hitbox: Option<Rect>,
}

impl ActorCore {
    /// Body starts at frame size with no offset, centered on `center`, facing right.
    pub fn new(id: ActorId, frame_width: f32, frame_height: f32, center: Vec2) -> Self {
        let body = Body::new(
            center.x - frame_width * 0.5,
            center.y - frame_height * 0.5,
            frame_width,
            frame_height,
        );
        Self {
            id,
            body,
            hp: 1,
            max_hp: 1,
            variant: None,
            visible: true,
            frame_width,
            frame_height,
            offset: Vec2::ZERO,
            facing: Facing::Right,
            custom_hitbox: None,
        }
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn is_flipped(&self) -> bool {
        self.facing == Facing::Left
    }

    pub fn frame_size(&self) -> (f32, f32) {
        (self.frame_width, self.frame_height)
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn custom_hitbox(&self) -> Option<Rect> {
        self.custom_hitbox
    }

    /// Sprite position (frame center).
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.body.x - self.offset.x + self.frame_width * 0.5,
            self.body.y - self.offset.y + self.frame_height * 0.5,
        )
    }

    pub fn place_center(&mut self, center: Vec2) {
        self.body.x = center.x - self.frame_width * 0.5 + self.offset.x;
        self.body.y = center.y - self.frame_height * 0.5 + self.offset.y;
    }

    pub fn bounds(&self) -> Rect {
        self.body.bounds()
    }

    /// Full sprite frame around the center, independent of the hitbox.
    pub fn frame_bounds(&self) -> Rect {
        Rect::from_center(self.center(), self.frame_width, self.frame_height)
    }

    pub fn turn(&mut self, facing: Facing) {
        self.facing = facing;
        self.recalc_offset();
    }

    /// Hitbox given in frame coordinates for an actor facing right.
    pub fn set_custom_hitbox(&mut self, hitbox: Rect) {
        self.custom_hitbox = Some(hitbox);
        let center = self.center();
        self.body.width = hitbox.width;
        self.body.height = hitbox.height;
        self.apply_offset(center, self.offset_for(hitbox));
    }

    pub fn apply_damage(&mut self, strength: i32) -> DamageOutcome {
        if self.hp <= 0 {
            return DamageOutcome::Absorbed;
        }
        self.hp = (self.hp - strength).max(0);
        DamageOutcome::Damaged {
            defeated: self.hp <= 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    fn recalc_offset(&mut self) {
        let Some(hitbox) = self.custom_hitbox else {
            return;
        };
        let center = self.center();
        self.apply_offset(center, self.offset_for(hitbox));
    }

    fn offset_for(&self, hitbox: Rect) -> Vec2 {
        let x = match self.facing {
            Facing::Right => hitbox.x,
            Facing::Left => self.frame_width - (hitbox.x + hitbox.width),
        };
        Vec2::new(x, hitbox.y)
    }

    fn apply_offset(&mut self, center: Vec2, offset: Vec2) {
        self.offset = offset;
        self.place_center(center);
    }
}
