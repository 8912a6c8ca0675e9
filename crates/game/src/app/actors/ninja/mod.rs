use ninja_engine::{
    ActorCore, ActorId, AnimationClip, Button, Clock, ControlMethod, Facing, Rect,
    ScheduledActions, Side, StateGate, StateMachine, Stateful, Vec2,
};

use super::common::{SegmentAction, PLAYER_ATTACK_STRENGTH};
use super::power_up::PowerUpVariant;

pub(crate) const WALKING_SPEED: f32 = 96.0;
pub(crate) const LEDGE_MOVING_SPEED: f32 = 48.0;
pub(crate) const QUICKSAND_WALKING_SPEED: f32 = 32.0;
pub(crate) const QUICKSAND_FALLING_SPEED: f32 = 8.0;
/// Sinking stops once the body top reaches this height.
pub(crate) const QUICKSAND_LIMIT_Y: f32 = 140.0;
pub(crate) const MAX_HP: i32 = 16;
pub(crate) const INITIAL_RESERVE_LIVES: i32 = 2;
pub(crate) const MAX_RESERVE_LIVES: i32 = 9;
pub(crate) const INVINCIBILITY_TIME_MS: u64 = 1000;
pub(crate) const SLASH_SPEED_MS: u64 = 250;
pub(crate) const INITIAL_MANA: i32 = 10;
pub(crate) const INITIAL_MAX_MANA: i32 = 40;
pub(crate) const MANA_INCREMENT: i32 = 10;
pub(crate) const MAX_MANA_INCREMENT: i32 = 10;
pub(crate) const HP_INCREMENT: i32 = 6;
pub(crate) const JUMP_SPEED: f32 = -250.0;
pub(crate) const MAX_NUM_PLAYERS: usize = 4;
pub(crate) const SPIKE_DAMAGE: i32 = 6;

const FRAME_WIDTH: f32 = 36.0;
const FRAME_HEIGHT: f32 = 37.0;
const HITBOX: Rect = Rect::new(8.0, 0.0, 20.0, 36.0);
const SWORD_WIDTH: f32 = 35.0;
const SWORD_HEIGHT: f32 = 18.0;
const SLASH_CLIP: AnimationClip = AnimationClip::new(3, SLASH_SPEED_MS);
/// The only slash frame whose sword hitbox is live.
const SWORD_ACTIVE_FRAME: u32 = 2;
const KNOCKBACK_SPEED_Y: f32 = -50.0;
/// A climb ends this many pixels before the wall's top and bottom edges.
const WALL_TOP_GRACE: f32 = 6.0;
const WALL_BOTTOM_GRACE: f32 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum NinjaState {
    ClimbIdle,
    ClimbMove,
    CrouchIdle,
    CrouchSlash,
    GetHit,
    GrabIdle,
    GrabMove,
    JumpDescend,
    JumpReach,
    JumpSlash,
    JumpSommersault,
    Run,
    StandIdle,
    StandSlash,
}

impl NinjaState {
    /// Sword offset from the leading body edge, for the slash states.
    pub(crate) fn slash_offset(self) -> Option<Vec2> {
        match self {
            NinjaState::CrouchSlash => Some(Vec2::new(2.0, 15.0)),
            NinjaState::JumpSlash => Some(Vec2::new(1.0, 6.0)),
            NinjaState::StandSlash => Some(Vec2::new(4.0, 10.0)),
            _ => None,
        }
    }

    pub(crate) fn is_climbing(self) -> bool {
        matches!(self, NinjaState::ClimbIdle | NinjaState::ClimbMove)
    }
}

/// Reasons the player may currently be immune to damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum InvincibilitySource {
    /// Knocked back, then the timed grace after landing.
    HitGrace,
    /// Lost a life and waiting for the segment to react.
    PostKo,
    Scripted,
}

impl InvincibilitySource {
    fn bit(self) -> u8 {
        match self {
            InvincibilitySource::HitGrace => 1,
            InvincibilitySource::PostKo => 1 << 1,
            InvincibilitySource::Scripted => 1 << 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Invincibility(u8);

impl Invincibility {
    pub(crate) fn grant(&mut self, source: InvincibilitySource) {
        self.0 |= source.bit();
    }

    pub(crate) fn clear(&mut self, source: InvincibilitySource) {
        self.0 &= !source.bit();
    }

    pub(crate) fn has(&self, source: InvincibilitySource) -> bool {
        self.0 & source.bit() != 0
    }

    pub(crate) fn any(&self) -> bool {
        self.0 != 0
    }
}

/// Wall or ledge platform the player is attached to. `id` is the platform's index in the
/// segment, so identity survives the platform being copied around.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PlatformRef {
    pub(crate) id: usize,
    pub(crate) bounds: Rect,
}

impl PlatformRef {
    fn is(&self, other: Option<PlatformRef>) -> bool {
        other.is_some_and(|other| other.id == self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlayerEvent {
    Ko { slot: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LevelLimits {
    pub(crate) width: f32,
    /// Falling below this while airborne costs a life.
    pub(crate) lower_bound: Option<f32>,
}

/// What the player may touch while updating or reacting to collisions.
pub(crate) struct PlayerContext<'a> {
    pub(crate) now_ms: u64,
    pub(crate) limits: LevelLimits,
    pub(crate) schedule: &'a mut ScheduledActions<SegmentAction>,
    pub(crate) events: &'a mut Vec<PlayerEvent>,
}

impl Clock for PlayerContext<'_> {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}

/// Per-player stats carried between segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NinjaStats {
    pub(crate) hp: i32,
    pub(crate) max_hp: i32,
    pub(crate) mana: i32,
    pub(crate) max_mana: i32,
    pub(crate) lives: i32,
    pub(crate) power: PowerUpVariant,
}

#[derive(Debug, Clone)]
pub(crate) struct Ninja {
    core: ActorCore,
    machine: StateMachine<NinjaState>,
    slot: usize,
    lives: i32,
    mana: i32,
    max_mana: i32,
    sword_powered: bool,
    current_power: PowerUpVariant,
    invincibility: Invincibility,
    jumping: bool,
    quicksand: bool,
    /// Ledge the player stands on; that ledge is solid only for this player.
    ledge_top: Option<PlatformRef>,
    /// Ledge just dropped through from above; cannot be stood on until another is touched.
    ledge_top_out: Option<PlatformRef>,
    /// Ledge the player hangs from.
    ledge_bottom: Option<PlatformRef>,
    /// Ledge just let go of; cannot be grabbed again right away.
    ledge_bottom_out: Option<PlatformRef>,
    wall: Option<PlatformRef>,
    sword_drawn: bool,
}

fn fresh_core(id: ActorId, center: Vec2) -> ActorCore {
    let mut core = ActorCore::new(id, FRAME_WIDTH, FRAME_HEIGHT, center);
    core.set_custom_hitbox(HITBOX);
    core.hp = MAX_HP;
    core.max_hp = MAX_HP;
    core
}

impl Ninja {
    pub(crate) fn new(id: ActorId, slot: usize, center: Vec2, now_ms: u64) -> Self {
        Self {
            core: fresh_core(id, center),
            machine: StateMachine::new(NinjaState::StandIdle, now_ms),
            slot,
            lives: INITIAL_RESERVE_LIVES,
            mana: INITIAL_MANA,
            max_mana: INITIAL_MAX_MANA,
            sword_powered: false,
            current_power: PowerUpVariant::Star,
            invincibility: Invincibility::default(),
            jumping: false,
            quicksand: false,
            ledge_top: None,
            ledge_top_out: None,
            ledge_bottom: None,
            ledge_bottom_out: None,
            wall: None,
            sword_drawn: false,
        }
    }

    /// Puts the player back at `center` standing, with full health and starting mana.
    /// Lives are kept; a fresh body replaces the old one.
    pub(crate) fn respawn(&mut self, center: Vec2, now_ms: u64) {
        let lives = self.lives;
        *self = Self::new(self.core.id, self.slot, center, now_ms);
        self.lives = lives;
    }

    /// Segment-to-segment move: a fresh body at `center` that keeps hp, mana, the weapon
    /// tier and the current power.
    pub(crate) fn carry_over(&mut self, center: Vec2, now_ms: u64) {
        let kept = (
            self.core.hp,
            self.mana,
            self.max_mana,
            self.sword_powered,
            self.current_power,
        );
        self.respawn(center, now_ms);
        (
            self.core.hp,
            self.mana,
            self.max_mana,
            self.sword_powered,
            self.current_power,
        ) = kept;
    }

    /// Out of lives: stays in the roster, knocked out and without a body.
    pub(crate) fn retire(&mut self) {
        self.core.hp = 0;
        self.core.body.enabled = false;
        self.core.visible = false;
    }

    pub(crate) fn core(&self) -> &ActorCore {
        &self.core
    }

    pub(crate) fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }

    pub(crate) fn slot(&self) -> usize {
        self.slot
    }

    pub(crate) fn state(&self) -> NinjaState {
        self.machine.current()
    }

    pub(crate) fn lives(&self) -> i32 {
        self.lives
    }

    pub(crate) fn stats(&self) -> NinjaStats {
        NinjaStats {
            hp: self.core.hp,
            max_hp: self.core.max_hp,
            mana: self.mana,
            max_mana: self.max_mana,
            lives: self.lives,
            power: self.current_power,
        }
    }

    pub(crate) fn sword_powered(&self) -> bool {
        self.sword_powered
    }

    pub(crate) fn attack_strength(&self) -> i32 {
        PLAYER_ATTACK_STRENGTH
    }

    pub(crate) fn is_invincible(&self) -> bool {
        self.invincibility.any()
    }

    pub(crate) fn invincibility(&self) -> Invincibility {
        self.invincibility
    }

    pub(crate) fn grant_invincibility(&mut self, source: InvincibilitySource) {
        self.invincibility.grant(source);
    }

    pub(crate) fn clear_invincibility(&mut self, source: InvincibilitySource) {
        self.invincibility.clear(source);
    }

    /// Alive and still in the world.
    pub(crate) fn is_active(&self) -> bool {
        self.core.hp > 0 && self.core.body.enabled
    }

    pub(crate) fn is_knocked_out(&self) -> bool {
        self.core.hp == 0
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.lives < 0
    }

    pub(crate) fn in_quicksand(&self) -> bool {
        self.quicksand
    }

    pub(crate) fn ledge_top(&self) -> Option<PlatformRef> {
        self.ledge_top
    }

    pub(crate) fn ledge_bottom(&self) -> Option<PlatformRef> {
        self.ledge_bottom
    }

    pub(crate) fn wall(&self) -> Option<PlatformRef> {
        self.wall
    }

    pub(crate) fn is_jumping(&self) -> bool {
        self.jumping
    }

    pub(crate) fn on_floor(&self) -> bool {
        self.quicksand || self.core.body.on_floor()
    }

    /// Sword hitbox in world space while the slash is on its live frame.
    pub(crate) fn sword_hitbox(&self, now_ms: u64) -> Option<Rect> {
        if !self.sword_drawn {
            return None;
        }
        let offset = self.machine.current().slash_offset()?;
        if SLASH_CLIP.frame_at(self.machine.elapsed_ms(now_ms)) != SWORD_ACTIVE_FRAME {
            return None;
        }
        let body = self.core.bounds();
        let width = if self.sword_powered {
            SWORD_WIDTH
        } else {
            SWORD_WIDTH * 0.5
        };
        let x = match self.core.facing() {
            Facing::Right => body.right() + offset.x,
            Facing::Left => body.left() - offset.x - width,
        };
        Some(Rect::new(x, body.y + offset.y, width, SWORD_HEIGHT))
    }

    /// Climbing jump rule: away from the wall is always allowed, toward it only near the top.
    pub(crate) fn is_allowed_to_jump(&self, direction: Facing) -> bool {
        if direction == self.core.facing() {
            self.reached_wall_top()
        } else {
            true
        }
    }

    fn reached_wall_top(&self) -> bool {
        self.wall
            .is_some_and(|wall| self.core.body.bounds().bottom() < wall.bounds.top() + WALL_TOP_GRACE)
    }

    fn reached_wall_bottom(&self) -> bool {
        self.wall.is_some_and(|wall| {
            self.core.body.bounds().top() > wall.bounds.bottom() - WALL_BOTTOM_GRACE
        })
    }

    fn fell_out_of_bounds(&self, limits: &LevelLimits) -> bool {
        limits
            .lower_bound
            .is_some_and(|lower| self.core.body.y > lower)
    }

    fn still_grabbing_ledge(&self) -> bool {
        self.ledge_bottom
            .is_some_and(|ledge| self.core.bounds().intersects(&ledge.bounds))
    }

    fn run_speed(&self) -> f32 {
        if self.quicksand {
            QUICKSAND_WALKING_SPEED
        } else {
            WALKING_SPEED
        }
    }

    fn run_toward(&mut self, cx: &mut PlayerContext<'_>, facing: Facing) {
        self.set_state(cx, NinjaState::Run);
        self.core.turn(facing);
        self.core.body.velocity.x = facing.sign() * self.run_speed();
    }

    fn drop_from_ledge(&mut self, cx: &mut PlayerContext<'_>) {
        self.set_state(cx, NinjaState::JumpDescend);
        if let Some(ledge) = self.ledge_bottom.take() {
            self.ledge_bottom_out = Some(ledge);
        }
    }

    fn jump_off_ledge(&mut self, cx: &mut PlayerContext<'_>) {
        self.set_state(cx, NinjaState::JumpSommersault);
        self.ledge_bottom = None;
        self.ledge_bottom_out = None;
    }

    fn start_timed_invincibility(&mut self, cx: &mut PlayerContext<'_>) {
        self.invincibility.grant(InvincibilitySource::HitGrace);
        let fire_at = cx.now_ms.saturating_add(INVINCIBILITY_TIME_MS);
        cx.schedule.schedule(
            self.core.id,
            fire_at,
            SegmentAction::EndInvincibility(InvincibilitySource::HitGrace),
        );
    }

    /// Mid-air steering: full speed toward the facing side, half speed against it.
    fn steer_in_air(&mut self, control: &dyn ControlMethod) {
        let facing = self.core.facing();
        let pressed = if control.held(Button::Left) {
            Facing::Left
        } else if control.held(Button::Right) {
            Facing::Right
        } else {
            return;
        };
        let speed = if pressed == facing {
            WALKING_SPEED
        } else {
            WALKING_SPEED * 0.5
        };
        self.core.body.velocity.x = pressed.sign() * speed;
    }

    /// Sommersault off a wall toward the held direction, when the climbing rule allows it.
    fn try_wall_jump(&mut self, cx: &mut PlayerContext<'_>, control: &dyn ControlMethod) -> bool {
        let direction = if control.held(Button::Right) {
            Facing::Right
        } else if control.held(Button::Left) {
            Facing::Left
        } else {
            return false;
        };
        if !self.is_allowed_to_jump(direction) {
            return false;
        }
        self.set_state(cx, NinjaState::JumpSommersault);
        self.core.turn(direction);
        self.core.body.velocity.x = direction.sign() * WALKING_SPEED;
        true
    }

    pub(crate) fn update(&mut self, cx: &mut PlayerContext<'_>, control: &dyn ControlMethod) {
        if !self.is_active() {
            return;
        }
        if self.quicksand {
            self.core.body.velocity.y = if self.core.body.y < QUICKSAND_LIMIT_Y {
                QUICKSAND_FALLING_SPEED
            } else {
                0.0
            };
        }
        match self.machine.current() {
            NinjaState::ClimbIdle => self.update_climb_idle(cx, control),
            NinjaState::ClimbMove => self.update_climb_move(cx, control),
            NinjaState::CrouchIdle => self.update_crouch_idle(cx, control),
            NinjaState::CrouchSlash => self.finish_slash(cx, NinjaState::CrouchIdle),
            NinjaState::StandSlash => self.finish_slash(cx, NinjaState::StandIdle),
            NinjaState::JumpSlash => {
                if self.on_floor() {
                    self.set_state(cx, NinjaState::StandIdle);
                } else {
                    self.finish_slash(cx, NinjaState::JumpDescend);
                }
            }
            NinjaState::GetHit => {
                let landed = self.elapsed_in_state(&*cx) > 0
                    && self.core.body.velocity.y >= 0.0
                    && self.on_floor();
                if landed {
                    self.set_state(cx, NinjaState::StandIdle);
                    self.start_timed_invincibility(cx);
                }
            }
            NinjaState::GrabIdle => self.update_grab_idle(cx, control),
            NinjaState::GrabMove => self.update_grab_move(cx, control),
            NinjaState::JumpDescend | NinjaState::JumpReach => {
                if self.fell_out_of_bounds(&cx.limits) {
                    self.lose_life(cx);
                } else if self.on_floor() {
                    self.set_state(cx, NinjaState::StandIdle);
                } else if control.held(Button::B) {
                    self.set_state(cx, NinjaState::JumpSlash);
                } else {
                    self.steer_in_air(control);
                }
            }
            NinjaState::JumpSommersault => {
                let mut idle = true;
                if self.on_floor() {
                    self.set_state(cx, NinjaState::StandIdle);
                } else if control.held(Button::B) {
                    idle = false;
                    self.set_state(cx, NinjaState::JumpSlash);
                } else {
                    self.steer_in_air(control);
                }
                if idle && self.core.body.velocity.y > 0.0 {
                    self.set_state(cx, NinjaState::JumpDescend);
                }
            }
            NinjaState::Run => self.update_run(cx, control),
            NinjaState::StandIdle => self.update_stand_idle(cx, control),
        }
        self.clamp_to_level(cx.limits.width);
    }

    fn update_climb_idle(&mut self, cx: &mut PlayerContext<'_>, control: &dyn ControlMethod) {
        self.core.body.allow_gravity = false;
        if control.held(Button::A) {
            self.try_wall_jump(cx, control);
        } else if control.held(Button::Up) {
            if !self.reached_wall_top() {
                self.core.body.velocity.y = -WALKING_SPEED;
                self.set_state(cx, NinjaState::ClimbMove);
            }
        } else if control.held(Button::Down) {
            self.core.body.velocity.y = WALKING_SPEED;
            self.set_state(cx, NinjaState::ClimbMove);
        }
    }

    fn update_climb_move(&mut self, cx: &mut PlayerContext<'_>, control: &dyn ControlMethod) {
        self.core.body.allow_gravity = false;
        let vy = self.core.body.velocity.y;
        if vy < 0.0 && self.reached_wall_top() {
            self.core.body.velocity.y = 0.0;
            self.set_state(cx, NinjaState::ClimbIdle);
            return;
        }
        if vy > 0.0 {
            if self.reached_wall_bottom() {
                self.set_state(cx, NinjaState::JumpDescend);
                return;
            }
            if self.on_floor() {
                self.set_state(cx, NinjaState::StandIdle);
                return;
            }
        }
        let mut idle = true;
        if control.held(Button::A) {
            if self.try_wall_jump(cx, control) {
                idle = false;
            }
        } else if control.held(Button::Up) {
            idle = false;
            self.core.body.velocity.y = -WALKING_SPEED;
        } else if control.held(Button::Down) {
            idle = false;
            self.core.body.velocity.y = WALKING_SPEED;
        }
        if idle {
            self.set_state(cx, NinjaState::ClimbIdle);
        }
    }

    fn update_crouch_idle(&mut self, cx: &mut PlayerContext<'_>, control: &dyn ControlMethod) {
        if control.held(Button::Left) {
            self.run_toward(cx, Facing::Left);
        } else if control.held(Button::Right) {
            self.run_toward(cx, Facing::Right);
        } else if control.held(Button::B) {
            self.set_state(cx, NinjaState::CrouchSlash);
        } else if control.held(Button::A) {
            if self.ledge_top.is_some() {
                self.set_state(cx, NinjaState::JumpDescend);
            }
        } else if !control.held(Button::Down) {
            self.set_state(cx, NinjaState::StandIdle);
        }
    }

    fn finish_slash(&mut self, cx: &mut PlayerContext<'_>, next: NinjaState) {
        if SLASH_CLIP.is_complete(self.elapsed_in_state(&*cx)) {
            self.set_state(cx, next);
        }
    }

    fn update_grab_idle(&mut self, cx: &mut PlayerContext<'_>, control: &dyn ControlMethod) {
        let direction = if control.held(Button::Right) {
            Some(Facing::Right)
        } else if control.held(Button::Left) {
            Some(Facing::Left)
        } else {
            None
        };
        if let Some(direction) = direction {
            self.set_state(cx, NinjaState::GrabMove);
            self.core.turn(direction);
            self.core.body.velocity.x = direction.sign() * LEDGE_MOVING_SPEED;
        } else if control.held(Button::A) {
            if control.held(Button::Down) {
                self.drop_from_ledge(cx);
            } else {
                self.jump_off_ledge(cx);
            }
        }
    }

    fn update_grab_move(&mut self, cx: &mut PlayerContext<'_>, control: &dyn ControlMethod) {
        let mut idle = true;
        let direction = if control.held(Button::Left) {
            Some(Facing::Left)
        } else if control.held(Button::Right) {
            Some(Facing::Right)
        } else {
            None
        };
        if let Some(direction) = direction {
            idle = false;
            if self.core.facing() != direction {
                self.core.turn(direction);
                self.core.body.velocity.x = direction.sign() * LEDGE_MOVING_SPEED;
            }
        }
        if !idle && !self.still_grabbing_ledge() {
            self.drop_from_ledge(cx);
        }
        if control.held(Button::A) {
            idle = false;
            if control.held(Button::Down) {
                self.drop_from_ledge(cx);
            } else {
                self.jump_off_ledge(cx);
            }
        }
        if idle {
            self.set_state(cx, NinjaState::GrabIdle);
        }
    }

    fn update_run(&mut self, cx: &mut PlayerContext<'_>, control: &dyn ControlMethod) {
        let mut idle = true;
        let direction = if control.held(Button::Left) {
            Some(Facing::Left)
        } else if control.held(Button::Right) {
            Some(Facing::Right)
        } else {
            None
        };
        if let Some(direction) = direction {
            idle = false;
            if self.core.facing() != direction {
                self.core.turn(direction);
                self.core.body.velocity.x = direction.sign() * self.run_speed();
            }
        }
        if !idle && !self.on_floor() {
            self.set_state(cx, NinjaState::JumpDescend);
            return;
        }
        if control.held(Button::A) {
            idle = false;
            self.set_state(cx, NinjaState::JumpSommersault);
        } else if control.held(Button::B) {
            idle = false;
            self.set_state(cx, NinjaState::StandSlash);
        }
        if idle {
            self.set_state(cx, NinjaState::StandIdle);
        }
    }

    fn update_stand_idle(&mut self, cx: &mut PlayerContext<'_>, control: &dyn ControlMethod) {
        if !self.on_floor() {
            self.set_state(cx, NinjaState::JumpDescend);
        }
        if control.held(Button::Left) {
            self.run_toward(cx, Facing::Left);
        } else if control.held(Button::Right) {
            self.run_toward(cx, Facing::Right);
        } else if control.held(Button::Down) {
            self.set_state(cx, NinjaState::CrouchIdle);
        }
        if control.held(Button::A) {
            if control.held(Button::Up) {
                self.set_state(cx, NinjaState::JumpReach);
            } else if control.held(Button::Down) {
                if self.ledge_top.is_some() {
                    self.set_state(cx, NinjaState::JumpDescend);
                }
            } else {
                self.set_state(cx, NinjaState::JumpSommersault);
            }
        } else if control.held(Button::B) {
            self.set_state(cx, NinjaState::StandSlash);
        }
    }

    /// Keeps the sprite center inside `[0, width]`.
    fn clamp_to_level(&mut self, width: f32) {
        let x = self.core.center().x;
        let clamped = x.clamp(0.0, width.max(0.0));
        if clamped != x {
            self.core.body.x += clamped - x;
        }
    }

    /// Contact landed on a `Ledge` platform. Grabs it from below or stands on it from above,
    /// but only while falling.
    pub(crate) fn on_touched_ledge(&mut self, cx: &mut PlayerContext<'_>, ledge: PlatformRef) {
        if !self.jumping || self.core.body.velocity.y < 0.0 {
            return;
        }
        let bounds = self.core.bounds();
        if !ledge.is(self.ledge_bottom_out) && ledge.bounds.spans_y(bounds.top()) {
            self.set_state(cx, NinjaState::GrabIdle);
            self.ledge_bottom = Some(ledge);
            self.ledge_bottom_out = None;
        } else if !ledge.is(self.ledge_top_out) && ledge.bounds.spans_y(bounds.bottom()) {
            self.ledge_top = Some(ledge);
            self.ledge_top_out = None;
        }
    }

    /// Airborne contact with a `Wall` on the `side` the player is facing into.
    pub(crate) fn on_touched_wall(&mut self, cx: &mut PlayerContext<'_>, wall: PlatformRef, side: Facing) {
        if !self.jumping {
            return;
        }
        self.core.turn(side);
        if self.machine.is(NinjaState::GetHit) {
            self.start_timed_invincibility(cx);
        }
        self.set_state(cx, NinjaState::ClimbIdle);
        self.wall = Some(wall);
    }

    /// Applied when the overlap with quicksand changes. Ignored while climbing.
    pub(crate) fn set_quicksand(&mut self, on: bool) {
        if self.machine.current().is_climbing() || self.quicksand == on {
            return;
        }
        self.quicksand = on;
        if self.machine.is(NinjaState::Run) {
            self.core.body.velocity.x = self.core.facing().sign() * self.run_speed();
        }
        self.core.body.allow_gravity = !on;
    }

    /// Enemy contact. `side` is the side of the player that touches the enemy. Returns
    /// `true` when the hit took effect.
    pub(crate) fn got_hit(&mut self, cx: &mut PlayerContext<'_>, strength: i32, side: Option<Side>) -> bool {
        if self.is_invincible() || !self.is_active() {
            return false;
        }
        self.core.hp = (self.core.hp - strength).max(0);
        if self.core.hp > 0 {
            match side {
                Some(Side::Left) => {
                    self.core.turn(Facing::Left);
                    self.core.body.set_velocity(WALKING_SPEED, KNOCKBACK_SPEED_Y);
                }
                Some(Side::Right) => {
                    self.core.turn(Facing::Right);
                    self.core.body.set_velocity(-WALKING_SPEED, KNOCKBACK_SPEED_Y);
                }
                Some(Side::Down) => self.core.body.set_velocity(0.0, KNOCKBACK_SPEED_Y),
                Some(Side::Up) => self.core.body.set_velocity(0.0, 0.0),
                None => {}
            }
            self.set_state(cx, NinjaState::GetHit);
        } else {
            self.lose_life(cx);
        }
        true
    }

    /// Spike overlap: fixed damage and an upward knockback.
    pub(crate) fn got_hit_by_spike(&mut self, cx: &mut PlayerContext<'_>) -> bool {
        if self.is_invincible() || !self.is_active() {
            return false;
        }
        self.core.hp = (self.core.hp - SPIKE_DAMAGE).max(0);
        if self.core.hp > 0 {
            self.core.body.set_velocity(0.0, KNOCKBACK_SPEED_Y);
            self.set_state(cx, NinjaState::GetHit);
        } else {
            self.lose_life(cx);
        }
        true
    }

    /// Spends a reserve life and notifies the segment. `lives` reaching -1 means the
    /// player is out of the game.
    pub(crate) fn lose_life(&mut self, cx: &mut PlayerContext<'_>) {
        self.lives -= 1;
        self.core.hp = 0;
        self.invincibility.grant(InvincibilitySource::PostKo);
        cx.schedule.cancel_owner(self.core.id);
        cx.events.push(PlayerEvent::Ko { slot: self.slot });
    }

    pub(crate) fn pick_up_power_up(&mut self, variant: PowerUpVariant) {
        match variant {
            PowerUpVariant::Mana => {
                self.mana = (self.mana + MANA_INCREMENT).min(self.max_mana);
            }
            PowerUpVariant::Sword => self.sword_powered = true,
            PowerUpVariant::MaxMana => self.max_mana += MAX_MANA_INCREMENT,
            PowerUpVariant::OneUp => {
                self.lives = (self.lives + 1).min(MAX_RESERVE_LIVES);
            }
            PowerUpVariant::HpUp => {
                self.core.hp = (self.core.hp + HP_INCREMENT).min(MAX_HP);
            }
            special => {
                debug_assert!(special.is_special_power());
                self.current_power = special;
            }
        }
    }
}

impl<'a> Stateful<PlayerContext<'a>> for Ninja {
    type State = NinjaState;

    fn state_machine(&self) -> &StateMachine<NinjaState> {
        &self.machine
    }

    fn state_machine_mut(&mut self) -> &mut StateMachine<NinjaState> {
        &mut self.machine
    }

    fn on_end_state(&mut self, _cx: &mut PlayerContext<'a>, current: NinjaState, next: NinjaState) {
        match current {
            NinjaState::ClimbMove if next != NinjaState::ClimbIdle => self.wall = None,
            NinjaState::CrouchSlash | NinjaState::JumpSlash | NinjaState::StandSlash => {
                self.sword_drawn = false;
            }
            NinjaState::JumpDescend => self.ledge_bottom_out = None,
            _ => {}
        }
    }

    fn on_begin_state(&mut self, _cx: &mut PlayerContext<'a>, previous: NinjaState, next: NinjaState) {
        let body = &mut self.core.body;
        match next {
            NinjaState::ClimbIdle => {
                self.jumping = false;
                body.allow_gravity = false;
                body.set_velocity(0.0, 0.0);
            }
            NinjaState::CrouchIdle | NinjaState::StandIdle => {
                self.jumping = false;
                body.halt();
            }
            NinjaState::CrouchSlash | NinjaState::StandSlash => {
                self.jumping = false;
                self.sword_drawn = true;
                body.halt();
            }
            NinjaState::GetHit => {
                self.invincibility.grant(InvincibilitySource::HitGrace);
                self.jumping = true;
                body.allow_gravity = true;
                self.ledge_top = None;
            }
            NinjaState::GrabIdle => {
                body.allow_gravity = false;
                body.halt();
                self.jumping = false;
            }
            NinjaState::GrabMove | NinjaState::ClimbMove | NinjaState::Run => {}
            NinjaState::JumpDescend => {
                self.jumping = true;
                body.allow_gravity = true;
                self.ledge_top_out = self.ledge_top.take();
            }
            NinjaState::JumpReach => {
                self.jumping = true;
                body.allow_gravity = true;
                body.velocity.y = JUMP_SPEED;
                self.ledge_top = None;
            }
            NinjaState::JumpSlash => {
                self.jumping = true;
                self.sword_drawn = true;
                body.allow_gravity = true;
                self.ledge_top = None;
            }
            NinjaState::JumpSommersault => {
                self.jumping = true;
                body.allow_gravity = true;
                body.velocity.y = if previous.is_climbing() {
                    JUMP_SPEED * 0.5
                } else {
                    JUMP_SPEED
                };
                self.ledge_top = None;
            }
        }
    }
}
