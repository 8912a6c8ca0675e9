use ninja_engine::{ActorCore, ActorId, Facing, Rect, StateMachine, Stateful, Vec2};

use super::common::{
    probe_ahead, ActorError, EnemyContext, HasHealth, Hovering, TargetsNearestPlayer,
};

const FRAME_WIDTH: f32 = 24.0;
const FRAME_HEIGHT: f32 = 31.0;
const WALKING_SPEED: f32 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SoldierState {
    Walk,
}

/// What a ground patroller knows about its surroundings this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PatrolFacts {
    pub(crate) on_wall: bool,
    pub(crate) on_floor: bool,
    pub(crate) ground_ahead: bool,
}

pub(crate) fn patrol_should_turn(facts: PatrolFacts) -> bool {
    facts.on_wall || (facts.on_floor && !facts.ground_ahead)
}

#[derive(Debug, Clone)]
pub(crate) struct Soldier {
    core: ActorCore,
    machine: StateMachine<SoldierState>,
}

impl Soldier {
    pub(crate) fn new(id: ActorId, center: Vec2, now_ms: u64) -> Self {
        let mut core = ActorCore::new(id, FRAME_WIDTH, FRAME_HEIGHT, center);
        core.set_custom_hitbox(Rect::new(0.0, 0.0, 16.0, 30.0));
        core.turn(Facing::Left);
        let mut soldier = Self {
            core,
            machine: StateMachine::new(SoldierState::Walk, now_ms),
        };
        soldier.walk();
        soldier
    }

    pub(crate) fn state(&self) -> SoldierState {
        self.machine.current()
    }

    pub(crate) fn update(&mut self, cx: &mut EnemyContext<'_>) -> Result<(), ActorError> {
        match self.machine.current() {
            SoldierState::Walk => {
                let body = &self.core.body;
                let ahead = probe_ahead(&body.bounds(), self.core.facing(), 1.0, -1.0);
                let facts = PatrolFacts {
                    on_wall: body.on_wall(),
                    on_floor: body.on_floor(),
                    ground_ahead: cx.tiles.is_solid_at(ahead),
                };
                if patrol_should_turn(facts) {
                    self.core.turn(self.core.facing().opposite());
                }
                self.walk();
            }
        }
        Ok(())
    }

    fn walk(&mut self) {
        self.core.body.velocity.x = WALKING_SPEED * self.core.facing().sign();
    }
}

impl HasHealth for Soldier {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }
}

impl TargetsNearestPlayer for Soldier {}
impl Hovering for Soldier {}

impl<'a> Stateful<EnemyContext<'a>> for Soldier {
    type State = SoldierState;

    fn state_machine(&self) -> &StateMachine<SoldierState> {
        &self.machine
    }

    fn state_machine_mut(&mut self) -> &mut StateMachine<SoldierState> {
        &mut self.machine
    }

    fn on_begin_state(
        &mut self,
        _cx: &mut EnemyContext<'a>,
        _previous: SoldierState,
        next: SoldierState,
    ) {
        match next {
            SoldierState::Walk => self.walk(),
        }
    }
}
