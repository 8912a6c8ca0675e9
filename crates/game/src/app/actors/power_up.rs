use ninja_engine::{ActorCore, ActorId, FixedClock, StateGate, StateMachine, Stateful, Vec2};

const FRAME_SIZE: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum PowerUpVariant {
    Mana,
    Sword,
    Star,
    BlastUp,
    Wheel,
    BlastDown,
    SliceUpDown,
    MaxMana,
    OneUp,
    HpUp,
}

impl PowerUpVariant {
    /// Tile index within the `PowerUp` tileset.
    pub(crate) fn from_index(index: u32) -> Option<Self> {
        let variant = match index {
            0 => Self::Mana,
            1 => Self::Sword,
            2 => Self::Star,
            3 => Self::BlastUp,
            4 => Self::Wheel,
            5 => Self::BlastDown,
            6 => Self::SliceUpDown,
            7 => Self::MaxMana,
            8 => Self::OneUp,
            9 => Self::HpUp,
            _ => return None,
        };
        Some(variant)
    }

    pub(crate) fn index(self) -> u8 {
        self as u8
    }

    /// Variants that replace the player's special power when collected.
    pub(crate) fn is_special_power(self) -> bool {
        matches!(
            self,
            Self::Star | Self::BlastUp | Self::Wheel | Self::BlastDown | Self::SliceUpDown
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PowerUpState {
    /// Floating in place; a sword hit knocks it loose.
    Glow,
    /// Falling under gravity; collectable on touch.
    Fall,
}

#[derive(Debug, Clone)]
pub(crate) struct PowerUp {
    core: ActorCore,
    machine: StateMachine<PowerUpState>,
    variant: PowerUpVariant,
}

impl PowerUp {
    pub(crate) fn new(id: ActorId, center: Vec2, variant: PowerUpVariant, now_ms: u64) -> Self {
        let mut core = ActorCore::new(id, FRAME_SIZE, FRAME_SIZE, center);
        core.variant = Some(variant.index());
        core.body.allow_gravity = false;
        Self {
            core,
            machine: StateMachine::new(PowerUpState::Glow, now_ms),
            variant,
        }
    }

    pub(crate) fn core(&self) -> &ActorCore {
        &self.core
    }

    pub(crate) fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }

    pub(crate) fn variant(&self) -> PowerUpVariant {
        self.variant
    }

    pub(crate) fn state(&self) -> PowerUpState {
        self.machine.current()
    }

    /// Sword contact. Returns true when the pickup was knocked loose.
    pub(crate) fn knock_loose(&mut self, now_ms: u64) -> bool {
        self.machine.current() == PowerUpState::Glow
            && self.set_state(&mut FixedClock(now_ms), PowerUpState::Fall)
    }

    pub(crate) fn is_collectable(&self) -> bool {
        self.core.body.enabled && self.machine.current() == PowerUpState::Fall
    }

    /// Takes the pickup out of the world; returns its variant once.
    pub(crate) fn collect(&mut self) -> Option<PowerUpVariant> {
        if !self.is_collectable() {
            return None;
        }
        self.core.body.enabled = false;
        self.core.visible = false;
        Some(self.variant)
    }

    pub(crate) fn is_collected(&self) -> bool {
        !self.core.body.enabled
    }
}

impl Stateful<FixedClock> for PowerUp {
    type State = PowerUpState;

    fn state_machine(&self) -> &StateMachine<PowerUpState> {
        &self.machine
    }

    fn state_machine_mut(&mut self) -> &mut StateMachine<PowerUpState> {
        &mut self.machine
    }

    fn on_begin_state(&mut self, _cx: &mut FixedClock, _previous: PowerUpState, next: PowerUpState) {
        if next == PowerUpState::Fall {
            self.core.body.allow_gravity = true;
        }
    }
}
