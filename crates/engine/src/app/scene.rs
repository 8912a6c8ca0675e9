use std::time::Duration;

use super::input::InputDevices;
use super::rendering::DrawList;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKey {
    Level,
    Pause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    SwitchTo(SceneKey),
    Quit,
}

/// Per-tick inputs handed to the active scene. `now_ms` is that scene's own clock, which
/// only advances while the scene is active.
pub struct FrameContext<'a> {
    pub now_ms: u64,
    pub fixed_dt_seconds: f32,
    pub devices: &'a mut InputDevices,
}

pub trait Scene {
    fn load(&mut self, now_ms: u64);
    fn update(&mut self, frame: &mut FrameContext<'_>) -> SceneCommand;
    fn render(&self, draw: &mut DrawList);
    fn unload(&mut self);
    fn debug_title(&self) -> Option<String> {
        None
    }
    fn actor_count(&self) -> usize {
        0
    }
}

struct SceneRuntime {
    scene: Box<dyn Scene>,
    is_loaded: bool,
    clock: Duration,
}

impl SceneRuntime {
    fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            is_loaded: false,
            clock: Duration::ZERO,
        }
    }

    fn now_ms(&self) -> u64 {
        self.clock.as_millis() as u64
    }
}

/// Two scene slots: the level and an overlay drawn over it. Only the active slot ticks.
pub struct SceneMachine {
    level: SceneRuntime,
    pause: SceneRuntime,
    active_scene: SceneKey,
}

impl SceneMachine {
    pub fn new(level: Box<dyn Scene>, pause: Box<dyn Scene>) -> Self {
        Self {
            level: SceneRuntime::new(level),
            pause: SceneRuntime::new(pause),
            active_scene: SceneKey::Level,
        }
    }

    pub fn active_scene(&self) -> SceneKey {
        self.active_scene
    }

    pub fn scene_now_ms(&self, key: SceneKey) -> u64 {
        self.runtime_ref(key).now_ms()
    }

    pub fn load_active(&mut self) {
        self.load_scene_if_needed(self.active_scene);
    }

    pub fn update_active(
        &mut self,
        fixed_dt: Duration,
        devices: &mut InputDevices,
    ) -> SceneCommand {
        let runtime = self.active_runtime_mut();
        runtime.clock = runtime.clock.saturating_add(fixed_dt);
        let mut frame = FrameContext {
            now_ms: runtime.now_ms(),
            fixed_dt_seconds: fixed_dt.as_secs_f32(),
            devices,
        };
        runtime.scene.update(&mut frame)
    }

    /// Applies a scene command. Returns true when the active scene changed or was reloaded;
    /// devices are told to reset in that case.
    pub fn apply(&mut self, command: SceneCommand, devices: &mut InputDevices) -> bool {
        let changed = match command {
            SceneCommand::SwitchTo(next) => self.switch_to(next),
            SceneCommand::None | SceneCommand::Quit => false,
        };
        if changed {
            devices.reset_scene_all();
        }
        changed
    }

    pub fn switch_to(&mut self, next_scene: SceneKey) -> bool {
        if self.active_scene == next_scene {
            return false;
        }
        self.load_scene_if_needed(next_scene);
        self.active_scene = next_scene;
        true
    }

    pub fn render(&self, draw: &mut DrawList) {
        draw.clear();
        if self.level.is_loaded {
            self.level.scene.render(draw);
        }
        if self.active_scene == SceneKey::Pause && self.pause.is_loaded {
            self.pause.scene.render(draw);
        }
    }

    pub fn debug_title_active(&self) -> Option<String> {
        self.active_runtime_ref().scene.debug_title()
    }

    pub fn actor_count(&self) -> usize {
        self.level.scene.actor_count()
    }

    pub fn shutdown_all(&mut self) {
        for runtime in [&mut self.level, &mut self.pause] {
            if runtime.is_loaded {
                runtime.scene.unload();
                runtime.is_loaded = false;
            }
        }
    }

    fn load_scene_if_needed(&mut self, key: SceneKey) {
        let runtime = self.runtime_mut(key);
        if runtime.is_loaded {
            return;
        }
        let now_ms = runtime.now_ms();
        runtime.scene.load(now_ms);
        runtime.is_loaded = true;
    }

    fn active_runtime_mut(&mut self) -> &mut SceneRuntime {
        self.runtime_mut(self.active_scene)
    }

    fn active_runtime_ref(&self) -> &SceneRuntime {
        self.runtime_ref(self.active_scene)
    }

    fn runtime_mut(&mut self, key: SceneKey) -> &mut SceneRuntime {
        match key {
            SceneKey::Level => &mut self.level,
            SceneKey::Pause => &mut self.pause,
        }
    }

    fn runtime_ref(&self, key: SceneKey) -> &SceneRuntime {
        match key {
            SceneKey::Level => &self.level,
            SceneKey::Pause => &self.pause,
        }
    }
}
