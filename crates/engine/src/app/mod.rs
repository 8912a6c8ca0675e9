mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use input::{
    Button, ButtonStates, ControlMethod, GamepadControl, GamepadSource, GamepadState,
    InputDevices, KeyboardControl, NoGamepads, STICK_THRESHOLD,
};
pub use loop_runner::{
    run_app, run_headless, AppError, HeadlessReport, LoopConfig,
};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{
    clip_to_viewport, rasterize, world_to_screen, Color, DrawList, DrawRect, PixelSpan, Renderer,
    Viewport,
};
pub use scene::{FrameContext, Scene, SceneCommand, SceneKey, SceneMachine};
