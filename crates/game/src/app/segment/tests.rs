    use ninja_engine::{ActorCore, KeyboardControl, MapProperty, PropertyValue};
    use rand::SeedableRng;

    use super::super::actors::bullet::BulletLaunch;
    use super::super::actors::soldier::Soldier;
    use super::super::actors::PowerUpVariant;
    use super::*;

    const DT: f32 = 1.0 / 60.0;
    const TICK_MS: u64 = 16;

    /// 60x14 tiles of 16px; `floor` adds a solid row at y = 192.
    fn tiles(floor: bool) -> Tilemap {
        let (width, height) = (60u32, 14u32);
        let mut data = vec![0u32; (width * height) as usize];
        if floor {
            for x in 0..width {
                data[(12 * width + x) as usize] = 17;
            }
        }
        Tilemap::new(width, height, 16.0, 16.0, data)
            .expect("tilemap")
            .with_collision_ranges(&[(17, 44)])
    }

    fn layout() -> SegmentLayout {
        SegmentLayout {
            name: String::from("test"),
            tiles: tiles(true),
            limits: LevelLimits {
                width: 960.0,
                lower_bound: None,
            },
            camera_bounds: Rect::new(0.0, 0.0, 960.0, 224.0),
            player_spawn: Vec2::new(64.0, 150.0),
            enemies: Vec::new(),
            power_ups: Vec::new(),
            walls: Vec::new(),
            quicksand: Vec::new(),
            factory: FactoryContext::default(),
        }
    }

    fn record(id: u32, name: &str, x: f32, y: f32) -> MapObject {
        MapObject {
            id,
            name: name.to_string(),
            x,
            y,
            width: 16.0,
            height: 16.0,
            rotation: 0.0,
            gid: None,
            flipped_horizontal: false,
            flipped_vertical: false,
            properties: Vec::new(),
        }
    }

    fn shape(id: u32, name: &str, bounds: Rect) -> MapObject {
        MapObject {
            width: bounds.width,
            height: bounds.height,
            ..record(id, name, bounds.x, bounds.y)
        }
    }

    struct Driver {
        segment: GameSegment,
        devices: InputDevices,
        now_ms: u64,
    }

    impl Driver {
        fn new(layout: SegmentLayout, roster: Roster, timer_ms: u64) -> Self {
            Self {
                segment: GameSegment::new(layout, roster, timer_ms, StdRng::seed_from_u64(3), 0),
                devices: InputDevices::default(),
                now_ms: 0,
            }
        }

        fn players(layout: SegmentLayout, count: usize) -> Self {
            Self::new(layout, Roster::Fresh(count), 250_000)
        }

        fn tick(&mut self) {
            self.now_ms += TICK_MS;
            self.devices.update_all();
            self.segment.update(self.now_ms, DT, &self.devices);
        }

        fn run(&mut self, ticks: usize) {
            for _ in 0..ticks {
                self.tick();
            }
        }

        fn run_to_outcome(&mut self) -> SegmentOutcome {
            for _ in 0..120 {
                self.tick();
                if let Some(outcome) = self.segment.outcome() {
                    return outcome;
                }
            }
            panic!("segment never finished: {:?}", self.segment.phase());
        }

        fn keyboard(&mut self) -> &mut KeyboardControl {
            self.devices.keyboard_mut()
        }
    }

    fn knock_out(segment: &mut GameSegment, slot: usize) {
        let mut cx = PlayerContext {
            now_ms: segment.now_ms,
            limits: segment.limits,
            schedule: &mut segment.schedule,
            events: &mut segment.player_events,
        };
        segment.players[slot].lose_life(&mut cx);
    }

    #[test]
    fn frame_steps_run_in_fixed_order() {
        let mut driver = Driver::players(layout(), 1);
        driver.tick();
        let order = driver
            .segment
            .last_frame_order
            .iter()
            .map(|step| format!("{step:?}"))
            .collect::<Vec<_>>()
            .join(">");
        assert_eq!(order, SEGMENT_FRAME_ORDER_TEXT);
    }

    #[test]
    fn players_spawn_spaced_along_x_and_land_on_the_floor() {
        let mut driver = Driver::players(layout(), 2);
        let centers: Vec<Vec2> = driver
            .segment
            .players()
            .iter()
            .map(|player| player.core().center())
            .collect();
        assert_eq!(centers, vec![Vec2::new(64.0, 150.0), Vec2::new(84.0, 150.0)]);

        driver.run(60);

        for player in driver.segment.players() {
            assert!(player.on_floor());
            assert_eq!(player.core().bounds().bottom(), 192.0);
        }
    }

    #[test]
    fn spawn_box_records_wait_for_a_player_while_plain_records_follow_the_camera() {
        let mut layout = layout();
        let mut linked = record(2, "EnemySoldier", 350.0, 192.0);
        linked.properties.push(MapProperty {
            name: SPAWN_BOX_PROPERTY.to_string(),
            value: PropertyValue::Object(10),
        });
        layout.enemies = vec![
            record(1, "EnemySoldier", 300.0, 192.0),
            linked,
            record(3, "EnemySoldier", 800.0, 192.0),
            shape(10, "SpawnBox", Rect::new(600.0, 100.0, 40.0, 100.0)),
        ];
        let mut driver = Driver::players(layout, 1);
        assert_eq!(driver.segment.pending_enemies().len(), 3);
        let box_rect = driver
            .segment
            .pending_enemies()
            .iter()
            .find(|pending| pending.record.id == 2)
            .and_then(|pending| pending.spawn_box);
        assert_eq!(box_rect, Some(Rect::new(600.0, 100.0, 40.0, 100.0)));

        driver.tick();
        assert_eq!(driver.segment.enemies().len(), 1, "only the visible plain record");

        // camera sweeps past the linked record without anyone inside its box
        driver.segment.players[0].core_mut().place_center(Vec2::new(700.0, 150.0));
        driver.segment.camera.set_focus(Vec2::new(700.0, 150.0));
        driver.tick();
        assert_eq!(driver.segment.enemies().len(), 2);
        let pending: Vec<u32> = driver
            .segment
            .pending_enemies()
            .iter()
            .map(|pending| pending.record.id)
            .collect();
        assert_eq!(pending, vec![2]);

        driver.segment.players[0].core_mut().place_center(Vec2::new(620.0, 150.0));
        driver.tick();
        assert_eq!(driver.segment.enemies().len(), 3);
        assert!(driver.segment.pending_enemies().is_empty());
    }

    #[test]
    fn unmoved_camera_spawns_nothing_new() {
        let mut layout = layout();
        layout.enemies = vec![record(1, "EnemySoldier", 2000.0, 192.0)];
        let mut driver = Driver::players(layout, 1);
        driver.tick();
        assert!(!driver.segment.camera().scroll_changed());
        // placed where the camera already looks, but the scroll has not moved since
        driver.segment.pending_enemies[0].placement = Rect::new(100.0, 100.0, 16.0, 16.0);
        driver.tick();
        assert!(driver.segment.enemies().is_empty());
    }

    #[test]
    fn flipped_record_spawns_facing_right() {
        let mut layout = layout();
        let mut flipped = record(1, "EnemySoldier", 300.0, 192.0);
        flipped.flipped_horizontal = true;
        layout.enemies = vec![flipped, record(2, "EnemySoldier", 250.0, 192.0)];
        let mut driver = Driver::players(layout, 1);
        driver.tick();

        let facings: Vec<Facing> = driver
            .segment
            .enemies()
            .iter()
            .map(|enemy| enemy.core().facing())
            .collect();
        assert_eq!(facings, vec![Facing::Right, Facing::Left]);
    }

    #[test]
    fn wave_floater_locks_to_the_player_height_when_it_spawns() {
        let mut layout = layout();
        layout.enemies = vec![record(1, "WaveFloater", 300.0, 100.0)];
        let mut driver = Driver::players(layout, 1);
        driver.tick();

        let player_y = driver.segment.players()[0].core().center().y;
        let Some(Enemy::WaveFloater(floater)) = driver.segment.enemies().first() else {
            panic!("floater not spawned");
        };
        assert!((floater.core().center().y - player_y).abs() < 1e-3);
        assert!((player_y - 84.0).abs() > 1.0);
        let locked = floater.wave_center_y();

        driver.run(5);
        let Some(Enemy::WaveFloater(floater)) = driver.segment.enemies().first() else {
            panic!("floater removed");
        };
        assert_eq!(floater.wave_center_y(), locked);
    }

    #[test]
    fn lone_player_losing_a_life_restarts_the_segment() {
        let mut layout = layout();
        layout.walls = vec![shape(1, "Spike", Rect::new(40.0, 140.0, 60.0, 52.0))];
        layout.enemies = vec![record(2, "EnemySoldier", 300.0, 192.0)];
        let mut driver = Driver::players(layout, 1);
        driver.segment.players[0].core_mut().hp = 1;

        driver.tick();

        let player = &driver.segment.players()[0];
        assert_eq!(player.core().hp, 0);
        assert_eq!(player.lives(), 1);
        assert!(player.is_invincible());
        assert!(matches!(
            driver.segment.phase(),
            SegmentPhase::Stopping {
                outcome: SegmentOutcome::Restart,
                ..
            }
        ));
        assert!(driver.segment.enemies().is_empty());
        assert_eq!(driver.run_to_outcome(), SegmentOutcome::Restart);
    }

    #[test]
    fn outcome_waits_for_the_fade() {
        let mut layout = layout();
        layout.walls = vec![shape(1, "Exit", Rect::new(40.0, 140.0, 60.0, 52.0))];
        let mut driver = Driver::players(layout, 1);

        driver.tick();
        let SegmentPhase::Stopping { since_ms, .. } = driver.segment.phase() else {
            panic!("expected stopping, got {:?}", driver.segment.phase());
        };
        assert_eq!(since_ms, TICK_MS);

        while driver.now_ms + TICK_MS < since_ms + STOP_FADE_MS {
            driver.tick();
            assert!(driver.segment.outcome().is_none());
        }
        driver.tick();
        assert_eq!(
            driver.segment.outcome(),
            Some(SegmentOutcome::Cleared {
                remaining_ms: 250_000 - TICK_MS
            })
        );
    }

    #[test]
    fn everyone_out_of_lives_is_game_over() {
        let mut driver = Driver::players(layout(), 1);
        for _ in 0..3 {
            knock_out(&mut driver.segment, 0);
        }
        assert!(driver.segment.players()[0].is_dead());

        driver.tick();

        assert!(matches!(
            driver.segment.phase(),
            SegmentPhase::Stopping {
                outcome: SegmentOutcome::GameOver,
                ..
            }
        ));
    }

    #[test]
    fn partial_knockout_removes_only_that_player() {
        let mut driver = Driver::players(layout(), 2);
        knock_out(&mut driver.segment, 1);

        driver.tick();

        assert_eq!(driver.segment.phase(), SegmentPhase::Running);
        let players = driver.segment.players();
        assert!(players[0].is_active());
        assert!(!players[1].core().body.enabled);
        assert!(!players[1].core().visible);
        assert_eq!(driver.segment.explosions.len(), 1);
    }

    #[test]
    fn time_limit_costs_every_living_player_a_life() {
        let mut driver = Driver::new(layout(), Roster::Fresh(2), 2 * TICK_MS);
        driver.tick();
        assert_eq!(driver.segment.phase(), SegmentPhase::Running);
        assert_eq!(driver.segment.hud().remaining_seconds, 1);

        driver.tick();

        for player in driver.segment.players() {
            assert_eq!(player.lives(), 1);
            assert!(player.is_knocked_out());
        }
        assert!(matches!(
            driver.segment.phase(),
            SegmentPhase::Stopping {
                outcome: SegmentOutcome::Restart,
                ..
            }
        ));
    }

    #[test]
    fn carried_roster_keeps_lives_and_retires_the_dead() {
        let mut first = Driver::players(layout(), 2);
        first.segment.players[0].pick_up_power_up(PowerUpVariant::Sword);
        for _ in 0..3 {
            knock_out(&mut first.segment, 1);
        }
        let players = first.segment.into_players();

        let second = GameSegment::new(
            layout(),
            Roster::Carried {
                players,
                keep_stats: true,
            },
            100_000,
            StdRng::seed_from_u64(4),
            1_000,
        );

        let players = second.players();
        assert!(players[0].is_active());
        assert!(players[0].sword_powered());
        assert_eq!(players[0].core().center(), Vec2::new(64.0, 150.0));
        assert!(players[1].is_dead());
        assert!(!players[1].is_active());
        assert_eq!(second.remaining_ms(), 100_000);
    }

    #[test]
    fn defeated_enemy_is_removed_with_its_pending_actions() {
        let mut driver = Driver::players(layout(), 1);
        let id = ActorId(50);
        driver
            .segment
            .enemies
            .push(Enemy::Soldier(Soldier::new(id, Vec2::new(300.0, 170.0), 0)));
        driver
            .segment
            .schedule
            .schedule(id, 60_000, SegmentAction::TurretFire);

        let segment = &mut driver.segment;
        segment.enemies[0].got_hit(1, &mut segment.spawns);
        driver.tick();

        assert!(driver.segment.enemies().is_empty());
        assert_eq!(driver.segment.schedule.pending_for(id), 0);
        assert_eq!(driver.segment.explosions.len(), 1);
    }

    #[test]
    fn unhandled_scheduled_action_only_affects_its_owner() {
        let mut driver = Driver::players(layout(), 1);
        for (raw, x) in [(50, 250.0), (51, 320.0)] {
            driver.segment.enemies.push(Enemy::Soldier(Soldier::new(
                ActorId(raw),
                Vec2::new(x, 176.0),
                0,
            )));
        }
        driver
            .segment
            .schedule
            .schedule(ActorId(50), 0, SegmentAction::TurretClose);

        driver.run(3);

        assert_eq!(driver.segment.enemies().len(), 2);
        assert!(driver.segment.schedule.is_empty());
    }

    #[test]
    fn grace_invincibility_ends_through_the_schedule() {
        let mut driver = Driver::players(layout(), 1);
        driver.run(60);
        let id = driver.segment.players()[0].core().id;
        driver.segment.players[0].grant_invincibility(InvincibilitySource::HitGrace);
        driver.segment.schedule.schedule(
            id,
            driver.now_ms + 100,
            SegmentAction::EndInvincibility(InvincibilitySource::HitGrace),
        );

        driver.run(5);
        assert!(driver.segment.players()[0].is_invincible());
        driver.run(3);
        assert!(!driver.segment.players()[0].is_invincible());
    }

    #[test]
    fn scripted_invincibility_blocks_spikes_and_clears_on_its_own() {
        let mut layout = layout();
        layout.walls = vec![shape(1, "Spike", Rect::new(40.0, 140.0, 60.0, 52.0))];
        layout.enemies = vec![record(2, "EnemySoldier", 300.0, 192.0)];
        let mut driver = Driver::players(layout, 1);
        driver.segment.set_invincibility(true);
        driver.segment.players[0].grant_invincibility(InvincibilitySource::HitGrace);

        driver.run(3);
        let player = &driver.segment.players()[0];
        assert_eq!(player.core().hp, 16);
        assert!(player.invincibility().has(InvincibilitySource::Scripted));

        driver.segment.set_invincibility(false);
        let player = &driver.segment.players()[0];
        assert!(!player.invincibility().has(InvincibilitySource::Scripted));
        assert!(player.invincibility().has(InvincibilitySource::HitGrace));
        assert!(player.is_invincible());
    }

    #[test]
    fn touching_a_falling_power_up_collects_it() {
        let mut driver = Driver::players(layout(), 1);
        driver.segment.players[0].core_mut().hp = 10;
        let center = driver.segment.players()[0].core().center();
        let mut pickup = PowerUp::new(ActorId(60), center, PowerUpVariant::HpUp, 0);
        assert!(pickup.knock_loose(0));
        driver.segment.power_ups.push(pickup);

        driver.tick();

        assert_eq!(driver.segment.players()[0].core().hp, 16);
        assert!(driver.segment.power_ups.is_empty());
    }

    #[test]
    fn glowing_power_up_is_not_collected() {
        let mut driver = Driver::players(layout(), 1);
        let center = driver.segment.players()[0].core().center();
        driver
            .segment
            .power_ups
            .push(PowerUp::new(ActorId(60), center, PowerUpVariant::OneUp, 0));

        driver.tick();

        assert_eq!(driver.segment.players()[0].lives(), 2);
        assert_eq!(driver.segment.power_ups.len(), 1);
    }

    #[test]
    fn falling_player_lands_on_a_ledge() {
        let mut layout = layout();
        layout.tiles = tiles(false);
        layout.walls = vec![shape(1, "Ledge", Rect::new(40.0, 170.0, 60.0, 8.0))];
        let mut driver = Driver::players(layout, 1);

        driver.run(60);

        let player = &driver.segment.players()[0];
        assert_eq!(player.ledge_top().map(|ledge| ledge.id), Some(0));
        assert_eq!(player.core().bounds().bottom(), 170.0);
        assert!(player.on_floor());
    }

    #[test]
    fn pickups_rest_on_ledges_nobody_stands_on() {
        let mut layout = layout();
        layout.walls = vec![shape(1, "Ledge", Rect::new(200.0, 100.0, 40.0, 8.0))];
        let mut driver = Driver::players(layout, 1);
        let mut pickup = PowerUp::new(ActorId(60), Vec2::new(220.0, 60.0), PowerUpVariant::Mana, 0);
        pickup.knock_loose(0);
        driver.segment.power_ups.push(pickup);

        driver.run(60);

        assert_eq!(driver.segment.power_ups[0].core().bounds().bottom(), 100.0);
    }

    #[test]
    fn projectiles_far_off_screen_are_culled() {
        let mut driver = Driver::players(layout(), 1);
        for (raw, x) in [(70, 2000.0), (71, 200.0)] {
            let owner = ActorCore::new(ActorId(raw + 100), 16.0, 16.0, Vec2::new(x, 60.0));
            driver
                .segment
                .projectiles
                .push(Bullet::fire(ActorId(raw), &owner, BulletLaunch::TURRET, 0));
        }

        driver.tick();

        let kept: Vec<ActorId> = driver
            .segment
            .projectiles
            .iter()
            .map(|bullet| bullet.core().id)
            .collect();
        assert_eq!(kept, vec![ActorId(71)]);
    }

    #[test]
    fn camera_holds_still_with_nobody_alive() {
        let mut driver = Driver::players(layout(), 1);
        driver.tick();
        let focus = driver.segment.camera().focus();
        driver.segment.players[0].core_mut().body.enabled = false;
        driver.segment.players[0].core_mut().place_center(Vec2::new(900.0, 20.0));

        driver.run(5);

        assert_eq!(driver.segment.camera().focus(), focus);
    }

    #[test]
    fn jump_input_reaches_the_player() {
        let mut driver = Driver::players(layout(), 1);
        driver.run(60);
        driver.keyboard().set_button(Button::A, true);
        driver.tick();
        assert!(driver.segment.players()[0].is_jumping());
        assert!(driver.segment.players()[0].core().body.velocity.y < 0.0);
    }

    #[test]
    fn render_draws_world_and_hud() {
        let mut layout = layout();
        layout.enemies = vec![record(1, "EnemySoldier", 300.0, 192.0)];
        let mut driver = Driver::players(layout, 1);
        driver.tick();

        let mut draw = DrawList::default();
        driver.segment.render(&mut draw);

        assert_eq!(draw.scroll, driver.segment.camera().scroll());
        assert!(draw.world.iter().any(|rect| rect.color == ENEMY_COLOR));
        assert!(draw.world.iter().any(|rect| rect.color == PLAYER_COLORS[0]));
        assert!(!draw.hud.is_empty());
    }
