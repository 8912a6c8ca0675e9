use ninja_engine::{
    Button, Color, DrawList, FrameContext, Rect, Scene, SceneCommand, SceneKey, SCREEN_HEIGHT,
    SCREEN_WIDTH,
};
use tracing::info;

const BAND_HEIGHT: f32 = 24.0;
const MARKER_COLOR: Color = Color::rgb(0xf0, 0xf0, 0xf0);

/// Overlay shown over a frozen level. Any device's `Start` resumes.
#[derive(Debug, Default)]
pub(crate) struct PauseScene {
    paused_at_ms: u64,
}

impl Scene for PauseScene {
    fn load(&mut self, now_ms: u64) {
        self.paused_at_ms = now_ms;
    }

    fn update(&mut self, frame: &mut FrameContext<'_>) -> SceneCommand {
        frame.devices.update_all();
        if frame.devices.any_hit(Button::Start) {
            info!(paused_ms = frame.now_ms.saturating_sub(self.paused_at_ms), "pause_resumed");
            self.paused_at_ms = frame.now_ms;
            return SceneCommand::SwitchTo(SceneKey::Level);
        }
        SceneCommand::None
    }

    fn render(&self, draw: &mut DrawList) {
        let top = (SCREEN_HEIGHT - BAND_HEIGHT) * 0.5;
        draw.hud_rect(Rect::new(0.0, top, SCREEN_WIDTH, BAND_HEIGHT), Color::PAUSE_DIM);
        // two bars of a pause glyph
        let center = SCREEN_WIDTH * 0.5;
        for x in [center - 7.0, center + 3.0] {
            draw.hud_rect(Rect::new(x, top + 6.0, 4.0, BAND_HEIGHT - 12.0), MARKER_COLOR);
        }
    }

    fn unload(&mut self) {}

    fn debug_title(&self) -> Option<String> {
        Some(String::from("paused"))
    }
}

#[cfg(test)]
mod tests {
    use ninja_engine::InputDevices;

    use super::*;

    fn tick(scene: &mut PauseScene, devices: &mut InputDevices, now_ms: u64) -> SceneCommand {
        let mut frame = FrameContext {
            now_ms,
            fixed_dt_seconds: 1.0 / 60.0,
            devices,
        };
        scene.update(&mut frame)
    }

    #[test]
    fn start_press_resumes_the_level_once() {
        let mut scene = PauseScene::default();
        let mut devices = InputDevices::default();
        scene.load(0);

        assert_eq!(tick(&mut scene, &mut devices, 16), SceneCommand::None);
        devices.keyboard_mut().set_button(Button::Start, true);
        assert_eq!(
            tick(&mut scene, &mut devices, 32),
            SceneCommand::SwitchTo(SceneKey::Level)
        );
        // still held: not a new hit
        assert_eq!(tick(&mut scene, &mut devices, 48), SceneCommand::None);
    }

    #[test]
    fn overlay_draws_in_hud_space_only() {
        let scene = PauseScene::default();
        let mut draw = DrawList::default();
        scene.render(&mut draw);
        assert!(draw.world.is_empty());
        assert_eq!(draw.hud.len(), 3);
        assert_eq!(draw.hud[0].color, Color::PAUSE_DIM);
    }
}
