use crate::actor::Facing;
use crate::geometry::Rect;

/// Highest player slot a sensor can track (one bit per slot).
pub const MAX_TRACKED_PLAYERS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorX {
    /// Starts at the owner's back and spans `2 * radius_x` toward its front.
    Back,
    #[default]
    Center,
    /// Starts at the owner's front and spans `2 * radius_x` toward its back.
    Front,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorY {
    /// Starts at the owner's top and spans `2 * radius_y` downward.
    Top,
    #[default]
    Middle,
    /// Starts at the owner's bottom and spans `2 * radius_y` upward.
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorEvent {
    PlayerIn { slot: usize, num_in: u32 },
    PlayerOut { slot: usize, num_in: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProximitySensor {
    radius_x: f32,
    radius_y: f32,
    anchor_x: AnchorX,
    anchor_y: AnchorY,
    players_in: u8,
}

impl ProximitySensor {
    pub fn new(radius_x: f32, radius_y: f32, anchor_x: AnchorX, anchor_y: AnchorY) -> Self {
        Self {
            radius_x,
            radius_y,
            anchor_x,
            anchor_y,
            players_in: 0,
        }
    }

    pub fn centered(radius: f32) -> Self {
        Self::new(radius, radius, AnchorX::Center, AnchorY::Middle)
    }

    pub fn zone(&self, owner: &Rect, facing: Facing) -> Rect {
        let width = self.radius_x * 2.0;
        let height = self.radius_y * 2.0;
        let x = match (self.anchor_x, facing) {
            (AnchorX::Center, _) => owner.center().x - self.radius_x,
            (AnchorX::Back, Facing::Right) | (AnchorX::Front, Facing::Left) => owner.left(),
            (AnchorX::Back, Facing::Left) | (AnchorX::Front, Facing::Right) => {
                owner.right() - width
            }
        };
        let y = match self.anchor_y {
            AnchorY::Middle => owner.center().y - self.radius_y,
            AnchorY::Top => owner.top(),
            AnchorY::Bottom => owner.bottom() - height,
        };
        Rect::new(x, y, width, height)
    }

    /// Recomputes the zone from the owner's current box and edge-triggers one event per
    /// player whose inside/outside status changed. Players missing from `players` count
    /// as outside. Events come in slot order; `num_in` is the running count after each.
    pub fn update<I>(&mut self, owner: &Rect, facing: Facing, players: I) -> Vec<SensorEvent>
    where
        I: IntoIterator<Item = (usize, Rect)>,
    {
        let zone = self.zone(owner, facing);
        let mut now_in = 0u8;
        for (slot, bounds) in players {
            if slot < MAX_TRACKED_PLAYERS && zone.intersects(&bounds) {
                now_in |= 1 << slot;
            }
        }

        let mut events = Vec::new();
        let changed = now_in ^ self.players_in;
        for slot in 0..MAX_TRACKED_PLAYERS {
            let bit = 1u8 << slot;
            if changed & bit == 0 {
                continue;
            }
            self.players_in ^= bit;
            let num_in = self.num_in();
            if now_in & bit != 0 {
                events.push(SensorEvent::PlayerIn { slot, num_in });
            } else {
                events.push(SensorEvent::PlayerOut { slot, num_in });
            }
        }
        events
    }

    pub fn num_in(&self) -> u32 {
        self.players_in.count_ones()
    }

    pub fn is_in(&self, slot: usize) -> bool {
        slot < MAX_TRACKED_PLAYERS && self.players_in & (1 << slot) != 0
    }

    pub fn reset(&mut self) {
        self.players_in = 0;
    }
}
