use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    A,
    B,
    Up,
    Down,
    Left,
    Right,
    Start,
}

const BUTTON_COUNT: usize = 7;

impl Button {
    pub const ALL: [Button; BUTTON_COUNT] = [
        Button::A,
        Button::B,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::Start,
    ];

    const fn index(self) -> usize {
        match self {
            Button::A => 0,
            Button::B => 1,
            Button::Up => 2,
            Button::Down => 3,
            Button::Left => 4,
            Button::Right => 5,
            Button::Start => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonStates {
    down: [bool; BUTTON_COUNT],
}

impl ButtonStates {
    pub fn set(&mut self, button: Button, is_down: bool) {
        self.down[button.index()] = is_down;
    }

    pub fn is_down(&self, button: Button) -> bool {
        self.down[button.index()]
    }

    pub fn any(&self) -> bool {
        self.down.iter().any(|down| *down)
    }
}

/// One input device as seen by a player. `update` latches the live device state once per
/// tick; `hit` is true only on the tick a button went from released to held.
pub trait ControlMethod {
    fn held(&self, button: Button) -> bool;
    fn hit(&self, button: Button) -> bool;
    fn update(&mut self);
    fn reset_scene(&mut self);
}

/// Latches a live button set into current/previous tick states.
#[derive(Debug, Clone, Copy, Default)]
struct Latch {
    live: ButtonStates,
    current: ButtonStates,
    previous: ButtonStates,
}

impl Latch {
    fn advance(&mut self) {
        self.previous = self.current;
        self.current = self.live;
    }

    fn held(&self, button: Button) -> bool {
        self.current.is_down(button)
    }

    fn hit(&self, button: Button) -> bool {
        self.current.is_down(button) && !self.previous.is_down(button)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default)]
pub struct KeyboardControl {
    latch: Latch,
}

impl KeyboardControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the live state of a key-mapped button; visible after the next `update`.
    pub fn set_button(&mut self, button: Button, is_down: bool) {
        self.latch.live.set(button, is_down);
    }
}

impl ControlMethod for KeyboardControl {
    fn held(&self, button: Button) -> bool {
        self.latch.held(button)
    }

    fn hit(&self, button: Button) -> bool {
        self.latch.hit(button)
    }

    fn update(&mut self) {
        self.latch.advance();
    }

    fn reset_scene(&mut self) {
        // Keys held across a scene change must be pressed again to register a hit.
        self.latch.current = self.latch.live;
        self.latch.previous = self.latch.live;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GamepadState {
    pub buttons: ButtonStates,
    pub stick_x: f32,
    pub stick_y: f32,
}

pub const STICK_THRESHOLD: f32 = 0.1;

/// Supplies connected gamepads. Index `i` in the returned list is pad `i`.
pub trait GamepadSource {
    fn poll(&mut self) -> Vec<GamepadState>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoGamepads;

impl GamepadSource for NoGamepads {
    fn poll(&mut self) -> Vec<GamepadState> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GamepadControl {
    pad_index: usize,
    latch: Latch,
}

impl GamepadControl {
    pub fn new(pad_index: usize) -> Self {
        Self {
            pad_index,
            latch: Latch::default(),
        }
    }

    pub fn pad_index(&self) -> usize {
        self.pad_index
    }

    fn feed(&mut self, state: Option<&GamepadState>) {
        let Some(state) = state else {
            self.latch.live = ButtonStates::default();
            return;
        };
        let mut live = state.buttons;
        if state.stick_x < -STICK_THRESHOLD {
            live.set(Button::Left, true);
        }
        if state.stick_x > STICK_THRESHOLD {
            live.set(Button::Right, true);
        }
        if state.stick_y < -STICK_THRESHOLD {
            live.set(Button::Up, true);
        }
        if state.stick_y > STICK_THRESHOLD {
            live.set(Button::Down, true);
        }
        self.latch.live = live;
    }
}

impl ControlMethod for GamepadControl {
    fn held(&self, button: Button) -> bool {
        self.latch.held(button)
    }

    fn hit(&self, button: Button) -> bool {
        self.latch.hit(button)
    }

    fn update(&mut self) {
        self.latch.advance();
    }

    fn reset_scene(&mut self) {
        self.latch.clear();
    }
}

/// Owns every input device for a session. Slot 0 is always the keyboard; gamepads follow in
/// connection order.
pub struct InputDevices {
    keyboard: KeyboardControl,
    gamepads: Vec<GamepadControl>,
    source: Box<dyn GamepadSource>,
}

impl Default for InputDevices {
    fn default() -> Self {
        Self::new(Box::new(NoGamepads))
    }
}

impl InputDevices {
    pub fn new(source: Box<dyn GamepadSource>) -> Self {
        Self {
            keyboard: KeyboardControl::new(),
            gamepads: Vec::new(),
            source,
        }
    }

    pub fn keyboard_mut(&mut self) -> &mut KeyboardControl {
        &mut self.keyboard
    }

    pub fn count(&self) -> usize {
        1 + self.gamepads.len()
    }

    /// Polls gamepads, rebuilds the device list when the pad count changed, then latches
    /// every device for this tick.
    pub fn update_all(&mut self) {
        let pads = self.source.poll();
        self.refresh_control_methods(pads.len());
        for control in &mut self.gamepads {
            control.feed(pads.get(control.pad_index()));
        }
        self.keyboard.update();
        for control in &mut self.gamepads {
            control.update();
        }
    }

    fn refresh_control_methods(&mut self, pad_count: usize) {
        if pad_count == self.gamepads.len() {
            return;
        }
        self.gamepads = (0..pad_count).map(GamepadControl::new).collect();
        info!(gamepads = pad_count, "input_devices_changed");
    }

    pub fn control(&self, slot: usize) -> Option<&dyn ControlMethod> {
        if slot == 0 {
            return Some(&self.keyboard);
        }
        self.gamepads
            .get(slot - 1)
            .map(|pad| pad as &dyn ControlMethod)
    }

    pub fn any_held(&self, button: Button) -> bool {
        (0..self.count()).any(|slot| self.control(slot).is_some_and(|c| c.held(button)))
    }

    pub fn any_hit(&self, button: Button) -> bool {
        (0..self.count()).any(|slot| self.control(slot).is_some_and(|c| c.hit(button)))
    }

    pub fn reset_scene_all(&mut self) {
        self.keyboard.reset_scene();
        for control in &mut self.gamepads {
            control.reset_scene();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Clone, Default)]
    struct ScriptedPads {
        frames: Rc<RefCell<Vec<GamepadState>>>,
    }

    impl GamepadSource for ScriptedPads {
        fn poll(&mut self) -> Vec<GamepadState> {
            self.frames.borrow().clone()
        }
    }

    #[test]
    fn hit_is_true_for_exactly_one_tick() {
        let mut keyboard = KeyboardControl::new();
        keyboard.set_button(Button::A, true);

        keyboard.update();
        assert!(keyboard.hit(Button::A));
        assert!(keyboard.held(Button::A));

        keyboard.update();
        assert!(!keyboard.hit(Button::A));
        assert!(keyboard.held(Button::A));

        keyboard.set_button(Button::A, false);
        keyboard.update();
        assert!(!keyboard.held(Button::A));
    }

    #[test]
    fn reset_scene_swallows_held_key_hit() {
        let mut keyboard = KeyboardControl::new();
        keyboard.set_button(Button::Start, true);
        keyboard.update();
        keyboard.reset_scene();
        keyboard.update();
        assert!(keyboard.held(Button::Start));
        assert!(!keyboard.hit(Button::Start));
    }

    #[test]
    fn stick_past_threshold_maps_to_directions() {
        let pads = ScriptedPads::default();
        pads.frames.borrow_mut().push(GamepadState {
            stick_x: -0.5,
            stick_y: 0.05,
            ..GamepadState::default()
        });
        let mut devices = InputDevices::new(Box::new(pads.clone()));
        devices.update_all();

        assert_eq!(devices.count(), 2);
        let pad = devices.control(1).expect("pad");
        assert!(pad.held(Button::Left));
        assert!(pad.hit(Button::Left));
        assert!(!pad.held(Button::Down));
    }

    #[test]
    fn device_list_follows_pad_count() {
        let pads = ScriptedPads::default();
        let mut devices = InputDevices::new(Box::new(pads.clone()));
        devices.update_all();
        assert_eq!(devices.count(), 1);
        assert!(devices.control(1).is_none());

        let mut state = GamepadState::default();
        state.buttons.set(Button::Start, true);
        pads.frames.borrow_mut().push(state);
        devices.update_all();
        assert_eq!(devices.count(), 2);
        assert!(devices.any_hit(Button::Start));

        pads.frames.borrow_mut().clear();
        devices.update_all();
        assert_eq!(devices.count(), 1);
        assert!(!devices.any_held(Button::Start));
    }
}
