use std::process::ExitCode;

use ninja_engine::{run_app, run_headless};
use tracing::{error, info};

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        config,
        level,
        pause,
        devices,
        headless_frames,
    } = app;

    if let Some(frames) = headless_frames {
        let report = run_headless(&config, level, pause, devices, frames);
        info!(
            ticks_run = report.ticks_run,
            quit_requested = report.quit_requested,
            "headless_finished"
        );
        return ExitCode::SUCCESS;
    }

    if let Err(err) = run_app(config, level, pause, devices) {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
