use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::camera::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::StartupError;

use super::input::{Button, InputDevices};
use super::metrics::LoopMetrics;
use super::rendering::{DrawList, Renderer, Viewport};
use super::scene::{SceneCommand, SceneMachine};
use super::Scene;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_scale: u32,
    pub logical_width: u32,
    pub logical_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Ninja".to_string(),
            window_scale: 3,
            logical_width: SCREEN_WIDTH as u32,
            logical_height: SCREEN_HEIGHT as u32,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

impl LoopConfig {
    fn fixed_dt(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_tps.max(1) as f64)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessReport {
    pub ticks_run: u64,
    pub quit_requested: bool,
}

pub fn run_app(
    config: LoopConfig,
    level: Box<dyn Scene>,
    pause: Box<dyn Scene>,
    mut devices: InputDevices,
) -> Result<(), AppError> {
    let mut scenes = SceneMachine::new(level, pause);
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let scale = config.window_scale.max(1);
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                (config.logical_width * scale) as f64,
                (config.logical_height * scale) as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let logical = Viewport {
        width: config.logical_width,
        height: config.logical_height,
    };
    let mut renderer =
        Renderer::new(Arc::clone(&window), logical).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = config.fixed_dt();
    log_loop_config(&config, max_frame_delta, max_ticks_per_frame);

    scenes.load_active();
    info!(scene = ?scenes.active_scene(), "scene_loaded");

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut metrics = LoopMetrics::new(metrics_log_interval);
    let mut last_applied_title: Option<String> = None;
    let mut draw_list = DrawList::default();

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if apply_key_event(&mut devices, &event) == KeyOutcome::Quit {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;
                    accumulator =
                        accumulator.saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));

                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    accumulator = step_plan.remaining_accumulator;
                    let signal = run_ticks(
                        &mut scenes,
                        &mut devices,
                        step_plan.ticks_to_run,
                        fixed_dt,
                        &mut metrics,
                    );
                    if step_plan.dropped_backlog > Duration::ZERO {
                        metrics.record_dropped(step_plan.dropped_backlog, fixed_dt);
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }
                    if signal == LoopSignal::Quit {
                        info!(reason = "scene_quit", "shutdown_requested");
                        window_target.exit();
                        return;
                    }

                    scenes.render(&mut draw_list);
                    if let Err(error) = renderer.present(&draw_list) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    let next_title = scenes.debug_title_active();
                    if next_title != last_applied_title {
                        window.set_title(next_title.as_deref().unwrap_or(&config.window_title));
                        last_applied_title = next_title;
                    }
                    metrics.record_frame(raw_frame_dt);
                    if let Some(snapshot) = metrics.take_snapshot(now) {
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            peak_actor_count = snapshot.peak_actor_count,
                            dropped_ticks = snapshot.dropped_ticks,
                            scene = ?scenes.active_scene(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                scenes.shutdown_all();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Runs `frames` fixed ticks with no window, renderer or wall clock.
pub fn run_headless(
    config: &LoopConfig,
    level: Box<dyn Scene>,
    pause: Box<dyn Scene>,
    mut devices: InputDevices,
    frames: u64,
) -> HeadlessReport {
    let mut scenes = SceneMachine::new(level, pause);
    let fixed_dt = config.fixed_dt();
    let mut metrics = LoopMetrics::new(
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1)),
    );
    info!(frames, target_tps = config.target_tps, "headless_start");
    scenes.load_active();

    let mut report = HeadlessReport {
        ticks_run: 0,
        quit_requested: false,
    };
    let mut draw_list = DrawList::default();
    while report.ticks_run < frames {
        let signal = run_ticks(&mut scenes, &mut devices, 1, fixed_dt, &mut metrics);
        report.ticks_run += 1;
        scenes.render(&mut draw_list);
        if signal == LoopSignal::Quit {
            report.quit_requested = true;
            break;
        }
    }
    scenes.shutdown_all();
    info!(
        ticks_run = report.ticks_run,
        quit_requested = report.quit_requested,
        actors = scenes.actor_count(),
        "shutdown"
    );
    report
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopSignal {
    Continue,
    Quit,
}

fn run_ticks(
    scenes: &mut SceneMachine,
    devices: &mut InputDevices,
    ticks: u32,
    fixed_dt: Duration,
    metrics: &mut LoopMetrics,
) -> LoopSignal {
    for _ in 0..ticks {
        let command = scenes.update_active(fixed_dt, devices);
        metrics.record_tick(scenes.actor_count());
        if command == SceneCommand::Quit {
            return LoopSignal::Quit;
        }
        if scenes.apply(command, devices) {
            info!(scene = ?scenes.active_scene(), "scene_switched");
        }
    }
    LoopSignal::Continue
}

fn log_loop_config(config: &LoopConfig, max_frame_delta: Duration, max_ticks_per_frame: u32) {
    info!(
        target_tps = config.target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        logical_width = config.logical_width,
        logical_height = config.logical_height,
        "loop_config"
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOutcome {
    Handled,
    Ignored,
    Quit,
}

fn apply_key_event(devices: &mut InputDevices, event: &KeyEvent) -> KeyOutcome {
    apply_physical_key(devices, event.physical_key, event.state == ElementState::Pressed)
}

fn apply_physical_key(devices: &mut InputDevices, key: PhysicalKey, is_pressed: bool) -> KeyOutcome {
    let PhysicalKey::Code(code) = key else {
        return KeyOutcome::Ignored;
    };
    if code == KeyCode::Escape {
        return if is_pressed {
            KeyOutcome::Quit
        } else {
            KeyOutcome::Ignored
        };
    }
    let Some(button) = button_for_key(code) else {
        return KeyOutcome::Ignored;
    };
    devices.keyboard_mut().set_button(button, is_pressed);
    KeyOutcome::Handled
}

fn button_for_key(code: KeyCode) -> Option<Button> {
    match code {
        KeyCode::KeyZ => Some(Button::A),
        KeyCode::KeyX => Some(Button::B),
        KeyCode::Enter => Some(Button::Start),
        KeyCode::ArrowUp => Some(Button::Up),
        KeyCode::ArrowDown => Some(Button::Down),
        KeyCode::ArrowLeft => Some(Button::Left),
        KeyCode::ArrowRight => Some(Button::Right),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(mut accumulator: Duration, fixed_dt: Duration, max_ticks_per_frame: u32) -> StepPlan {
    let mut ticks_to_run = 0u32;
    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::replace(&mut accumulator, Duration::ZERO)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
