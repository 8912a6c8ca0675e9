use ninja_engine::{
    load_map_cached, AppPaths, Button, DrawList, FrameContext, Scene, SceneCommand, SceneKey,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info};

#[cfg(test)]
use super::acts::SegmentCursor;
use super::acts::Progression;
use super::config::{ActsFile, SegmentConfig};
use super::segment::{GameSegment, Roster, SegmentError, SegmentLayout, SegmentOutcome};

/// Binds the act progression to the scene machine: owns the running segment and decides
/// what follows each outcome.
pub(crate) struct LevelScene {
    paths: AppPaths,
    progression: Progression,
    num_players: usize,
    rng: StdRng,
    segment: Option<GameSegment>,
    invincible: bool,
    failed: bool,
}

impl LevelScene {
    pub(crate) fn new(paths: AppPaths, acts: ActsFile, num_players: usize, seed: u64) -> Self {
        Self {
            paths,
            progression: Progression::new(acts),
            num_players,
            rng: StdRng::seed_from_u64(seed),
            segment: None,
            invincible: false,
            failed: false,
        }
    }

    /// Every segment entered from now on starts with scripted invincibility.
    pub(crate) fn with_invincibility(mut self, invincible: bool) -> Self {
        self.invincible = invincible;
        self
    }

    #[cfg(test)]
    pub(crate) fn segment(&self) -> Option<&GameSegment> {
        self.segment.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn cursor(&self) -> Option<SegmentCursor> {
        self.progression.cursor()
    }

    fn start_run(&mut self, now_ms: u64) {
        self.progression.reset();
        let Some(config) = self.progression.next_segment().cloned() else {
            error!("acts_empty");
            self.failed = true;
            return;
        };
        let timer_ms = self.progression.time_limit_ms();
        self.enter_or_fail(&config, Roster::Fresh(self.num_players), timer_ms, now_ms);
    }

    fn enter_or_fail(&mut self, config: &SegmentConfig, roster: Roster, timer_ms: u64, now_ms: u64) {
        if let Err(err) = self.enter(config, roster, timer_ms, now_ms) {
            error!(segment = %config.name, error = %err, "segment_load_failed");
            self.segment = None;
            self.failed = true;
        }
    }

    fn enter(
        &mut self,
        config: &SegmentConfig,
        roster: Roster,
        timer_ms: u64,
        now_ms: u64,
    ) -> Result<(), SegmentError> {
        let source = self.paths.maps_dir.join(&config.map);
        let loaded = load_map_cached(&source, &self.paths.cache_dir)?;
        let layout = SegmentLayout::from_document(config, &loaded.document)?;
        let rng = StdRng::seed_from_u64(self.rng.gen());
        let mut segment = GameSegment::new(layout, roster, timer_ms, rng, now_ms);
        if self.invincible {
            segment.set_invincibility(true);
        }
        self.segment = Some(segment);
        info!(
            segment = %config.name,
            act = self.progression.cursor().map_or(0, |cursor| cursor.act),
            from_cache = loaded.from_cache,
            timer_ms,
            "segment_entered"
        );
        Ok(())
    }

    /// Picks the next segment for `outcome`. Returns `Quit` when the run is over.
    fn advance(&mut self, outcome: SegmentOutcome, now_ms: u64) -> SceneCommand {
        let Some(finished) = self.segment.take() else {
            return SceneCommand::Quit;
        };
        let previous_act = self.progression.cursor().map(|cursor| cursor.act);
        let players = finished.into_players();

        let (config, roster, timer_ms) = match outcome {
            SegmentOutcome::Cleared { remaining_ms } => {
                let Some(config) = self.progression.next_segment().cloned() else {
                    info!("run_complete");
                    return SceneCommand::Quit;
                };
                // a new act brings its own time budget
                let same_act = self.progression.cursor().map(|cursor| cursor.act) == previous_act;
                let timer_ms = if same_act {
                    remaining_ms
                } else {
                    self.progression.time_limit_ms()
                };
                let roster = Roster::Carried {
                    players,
                    keep_stats: true,
                };
                (config, roster, timer_ms)
            }
            SegmentOutcome::Restart => {
                let Some(config) = self.progression.restart_to_checkpoint().cloned() else {
                    return SceneCommand::Quit;
                };
                let roster = Roster::Carried {
                    players,
                    keep_stats: false,
                };
                (config, roster, self.progression.time_limit_ms())
            }
            SegmentOutcome::GameOver => {
                self.progression.reset();
                let Some(config) = self.progression.next_segment().cloned() else {
                    return SceneCommand::Quit;
                };
                (
                    config,
                    Roster::Fresh(self.num_players),
                    self.progression.time_limit_ms(),
                )
            }
        };

        info!(?outcome, next = %config.name, "segment_finished");
        self.enter_or_fail(&config, roster, timer_ms, now_ms);
        if self.failed {
            SceneCommand::Quit
        } else {
            SceneCommand::None
        }
    }
}

impl Scene for LevelScene {
    fn load(&mut self, now_ms: u64) {
        self.failed = false;
        self.start_run(now_ms);
    }

    fn update(&mut self, frame: &mut FrameContext<'_>) -> SceneCommand {
        frame.devices.update_all();
        if self.failed {
            return SceneCommand::Quit;
        }
        let Some(segment) = self.segment.as_mut() else {
            return SceneCommand::Quit;
        };
        segment.update(frame.now_ms, frame.fixed_dt_seconds, frame.devices);
        if let Some(outcome) = segment.outcome() {
            return self.advance(outcome, frame.now_ms);
        }
        if frame.devices.any_hit(Button::Start) {
            return SceneCommand::SwitchTo(SceneKey::Pause);
        }
        SceneCommand::None
    }

    fn render(&self, draw: &mut DrawList) {
        if let Some(segment) = &self.segment {
            segment.render(draw);
        }
    }

    fn unload(&mut self) {
        if let Some(segment) = self.segment.take() {
            info!(segment = %segment.name(), "segment_unloaded");
        }
    }

    fn debug_title(&self) -> Option<String> {
        self.segment.as_ref().map(|segment| {
            format!(
                "{} | {}s",
                segment.name(),
                segment.remaining_ms().div_ceil(1000)
            )
        })
    }

    fn actor_count(&self) -> usize {
        self.segment.as_ref().map_or(0, GameSegment::actor_count)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use ninja_engine::InputDevices;
    use tempfile::TempDir;

    use super::*;
    use crate::app::config::ActConfig;

    const MAP_WIDTH: usize = 24;
    const MAP_HEIGHT: usize = 14;

    /// A floor row at y = 192, and optionally an exit around the spawn point.
    fn map_source(exit: bool) -> String {
        let rows: Vec<String> = (0..MAP_HEIGHT)
            .map(|row| {
                let gid = if row == 12 { "17" } else { "0" };
                vec![gid; MAP_WIDTH].join(",")
            })
            .collect();
        let walls = if exit {
            r#"<object id="1" name="Exit" x="40" y="140" width="60" height="52"/>"#
        } else {
            ""
        };
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" width="{MAP_WIDTH}" height="{MAP_HEIGHT}" tilewidth="16" tileheight="16">
 <layer id="1" name="Platforms" width="{MAP_WIDTH}" height="{MAP_HEIGHT}">
  <data encoding="csv">
{}
</data>
 </layer>
 <objectgroup id="2" name="Walls">{walls}</objectgroup>
</map>"#,
            rows.join(",\n")
        )
    }

    fn segment(name: &str) -> SegmentConfig {
        SegmentConfig {
            name: name.to_string(),
            map: format!("{name}.tmx"),
            checkpoint: true,
            level_width: None,
            lower_bounds: None,
            collision: vec![[17, 44]],
            player_spawn: Some([64.0, 150.0]),
        }
    }

    fn project(maps: &[(&str, bool)]) -> (TempDir, AppPaths) {
        let temp = TempDir::new().expect("tempdir");
        let paths = AppPaths::from_root(temp.path().to_path_buf());
        fs::create_dir_all(&paths.maps_dir).expect("maps dir");
        fs::create_dir_all(&paths.cache_dir).expect("cache dir");
        for (name, exit) in maps {
            write_map(&paths.maps_dir, name, *exit);
        }
        (temp, paths)
    }

    fn write_map(dir: &Path, name: &str, exit: bool) {
        fs::write(dir.join(format!("{name}.tmx")), map_source(exit)).expect("write map");
    }

    fn acts(names: &[&str]) -> ActsFile {
        ActsFile {
            acts: vec![ActConfig {
                name: "Act I".to_string(),
                time_limit_seconds: 250,
                segments: names.iter().map(|name| segment(name)).collect(),
            }],
        }
    }

    struct Harness {
        scene: LevelScene,
        devices: InputDevices,
        now_ms: u64,
    }

    impl Harness {
        fn new(paths: AppPaths, acts: ActsFile) -> Self {
            let mut scene = LevelScene::new(paths, acts, 1, 7);
            scene.load(0);
            Self {
                scene,
                devices: InputDevices::default(),
                now_ms: 0,
            }
        }

        fn tick(&mut self) -> SceneCommand {
            self.now_ms += 16;
            let mut frame = FrameContext {
                now_ms: self.now_ms,
                fixed_dt_seconds: 1.0 / 60.0,
                devices: &mut self.devices,
            };
            self.scene.update(&mut frame)
        }

        /// Ticks until a command other than `None` comes back or the segment changes.
        fn run_until_change(&mut self) -> SceneCommand {
            let start = self.scene.cursor();
            for _ in 0..120 {
                let command = self.tick();
                if command != SceneCommand::None || self.scene.cursor() != start {
                    return command;
                }
            }
            panic!("nothing changed");
        }
    }

    fn segment_name(harness: &Harness) -> Option<String> {
        harness
            .scene
            .segment()
            .map(|segment| segment.name().to_string())
    }

    #[test]
    fn cleared_segment_carries_the_timer_into_the_next() {
        let (_temp, paths) = project(&[("a", true), ("b", false)]);
        let mut harness = Harness::new(paths, acts(&["a", "b"]));
        assert_eq!(segment_name(&harness).as_deref(), Some("a"));

        assert_eq!(harness.run_until_change(), SceneCommand::None);

        assert_eq!(segment_name(&harness).as_deref(), Some("b"));
        let remaining = harness
            .scene
            .segment()
            .map(GameSegment::remaining_ms)
            .expect("segment");
        assert_eq!(remaining, 250_000 - 16);
        assert!(harness.scene.actor_count() >= 1);
    }

    #[test]
    fn clearing_the_last_segment_ends_the_run() {
        let (_temp, paths) = project(&[("a", true)]);
        let mut harness = Harness::new(paths, acts(&["a"]));
        assert_eq!(harness.run_until_change(), SceneCommand::Quit);
    }

    #[test]
    fn start_opens_the_pause_overlay() {
        let (_temp, paths) = project(&[("a", false)]);
        let mut harness = Harness::new(paths, acts(&["a"]));
        assert_eq!(harness.tick(), SceneCommand::None);
        harness.devices.keyboard_mut().set_button(Button::Start, true);
        assert_eq!(harness.tick(), SceneCommand::SwitchTo(SceneKey::Pause));
    }

    #[test]
    fn missing_map_quits_instead_of_panicking() {
        let (_temp, paths) = project(&[]);
        let mut harness = Harness::new(paths, acts(&["nowhere"]));
        assert!(harness.scene.segment().is_none());
        assert_eq!(harness.tick(), SceneCommand::Quit);
    }

    #[test]
    fn invincible_run_survives_into_the_next_segment() {
        let (_temp, paths) = project(&[("a", true), ("b", false)]);
        let scene = LevelScene::new(paths, acts(&["a", "b"]), 1, 7).with_invincibility(true);
        let mut harness = Harness {
            scene,
            devices: InputDevices::default(),
            now_ms: 0,
        };
        harness.scene.load(0);
        let invincible = |harness: &Harness| {
            harness
                .scene
                .segment()
                .map(|segment| segment.players().iter().all(|player| player.is_invincible()))
        };
        assert_eq!(invincible(&harness), Some(true));

        harness.run_until_change();

        assert_eq!(segment_name(&harness).as_deref(), Some("b"));
        assert_eq!(invincible(&harness), Some(true));
    }

    #[test]
    fn debug_title_names_the_segment_and_time() {
        let (_temp, paths) = project(&[("a", false)]);
        let mut harness = Harness::new(paths, acts(&["a"]));
        harness.tick();
        assert_eq!(harness.scene.debug_title().as_deref(), Some("a | 250s"));
        harness.scene.unload();
        assert_eq!(harness.scene.debug_title(), None);
    }
}
