impl GameSegment {
    /// Runs one fixed step. Once stopped, only the fade countdown advances.
    pub(crate) fn update(&mut self, now_ms: u64, dt_seconds: f32, devices: &InputDevices) {
        self.now_ms = now_ms;
        self.last_frame_order.clear();
        match self.phase {
            SegmentPhase::Finished(_) => return,
            SegmentPhase::Stopping { since_ms, outcome } => {
                if now_ms.saturating_sub(since_ms) >= STOP_FADE_MS {
                    self.phase = SegmentPhase::Finished(outcome);
                }
                return;
            }
            SegmentPhase::Running => {}
        }
        for step in SEGMENT_FRAME_ORDER {
            if self.phase != SegmentPhase::Running && step != FrameStep::Hud {
                continue;
            }
            self.last_frame_order.push(step);
            self.run_step(step, dt_seconds, devices);
        }
    }

    fn run_step(&mut self, step: FrameStep, dt_seconds: f32, devices: &InputDevices) {
        match step {
            FrameStep::TimeLimit => self.check_time_limit(),
            FrameStep::DueActions => self.run_due_actions(),
            FrameStep::Physics => self.step_physics(dt_seconds),
            FrameStep::Players => self.update_players(devices),
            FrameStep::Camera => self.update_camera(),
            FrameStep::Enemies => self.update_enemies(),
            FrameStep::Contacts => self.resolve_contacts(),
            FrameStep::Knockouts => self.handle_knockouts(),
            FrameStep::SpawnEnemies => self.spawn_enemies(),
            FrameStep::PowerUps => self.place_power_ups(),
            FrameStep::Cleanup => self.cleanup(),
            FrameStep::Hud => self.hud = self.hud_snapshot(),
        }
    }

    fn player_views(&self) -> Vec<PlayerView> {
        self.players
            .iter()
            .filter(|player| player.is_active())
            .map(|player| PlayerView {
                slot: player.slot(),
                bounds: player.core().bounds(),
                center: player.core().center(),
            })
            .collect()
    }

    fn check_time_limit(&mut self) {
        if self.timer.remaining_ms(self.now_ms) > 0 {
            return;
        }
        let mut cx = PlayerContext {
            now_ms: self.now_ms,
            limits: self.limits,
            schedule: &mut self.schedule,
            events: &mut self.player_events,
        };
        let mut expired = 0usize;
        for player in &mut self.players {
            if player.core().hp > 0 {
                player.lose_life(&mut cx);
                expired += 1;
            }
        }
        if expired > 0 {
            info!(segment = %self.name, players = expired, "time_limit_reached");
        }
    }

    /// Routes due actions to their owners. Owners removed since scheduling had their
    /// entries cancelled, so a missing owner means nothing to do.
    fn run_due_actions(&mut self) {
        let due = self.schedule.drain_due(self.now_ms);
        if due.is_empty() {
            return;
        }
        let views = self.player_views();
        for entry in due {
            if let Some(player) = self
                .players
                .iter_mut()
                .find(|player| player.core().id == entry.owner)
            {
                match entry.action {
                    SegmentAction::EndInvincibility(source) => player.clear_invincibility(source),
                    other => {
                        warn!(slot = player.slot(), action = ?other, "player_action_unhandled");
                    }
                }
                continue;
            }
            let Some(enemy) = self
                .enemies
                .iter_mut()
                .find(|enemy| enemy.core().id == entry.owner)
            else {
                continue;
            };
            let mut cx = EnemyContext {
                now_ms: self.now_ms,
                players: &views,
                tiles: &self.tiles,
                schedule: &mut self.schedule,
                spawns: &mut self.spawns,
                ids: &mut self.ids,
                rng: &mut self.rng,
            };
            if let Err(err) = enemy.on_scheduled(&mut cx, entry.action) {
                warn!(
                    segment = %self.name,
                    actor = entry.owner.0,
                    kind = enemy.kind(),
                    error = %err,
                    "actor_update_failed"
                );
            }
        }
    }

    fn update_players(&mut self, devices: &InputDevices) {
        let mut cx = PlayerContext {
            now_ms: self.now_ms,
            limits: self.limits,
            schedule: &mut self.schedule,
            events: &mut self.player_events,
        };
        for player in &mut self.players {
            let control: &dyn ControlMethod = match devices.control(player.slot()) {
                Some(control) => control,
                None => &IdleControl,
            };
            player.update(&mut cx, control);
        }
    }

    /// Focus follows the mean of living players with a capped step; with nobody alive it
    /// holds still.
    fn update_camera(&mut self) {
        let living: Vec<Vec2> = self
            .players
            .iter()
            .filter(|player| player.is_active())
            .map(|player| player.core().center())
            .collect();
        self.camera.track(living, CAM_MAX_MOVEMENT);
        self.scrolled = self.camera.scroll_changed();
        self.camera.commit_scroll();
    }

    /// A failing actor is logged and skipped; the rest of the roster still updates.
    fn update_enemies(&mut self) {
        let views = self.player_views();
        let mut cx = EnemyContext {
            now_ms: self.now_ms,
            players: &views,
            tiles: &self.tiles,
            schedule: &mut self.schedule,
            spawns: &mut self.spawns,
            ids: &mut self.ids,
            rng: &mut self.rng,
        };
        for enemy in &mut self.enemies {
            if enemy.is_defeated() {
                continue;
            }
            if let Err(err) = enemy.update(&mut cx) {
                warn!(
                    segment = %self.name,
                    actor = enemy.core().id.0,
                    kind = enemy.kind(),
                    error = %err,
                    "actor_update_failed"
                );
            }
        }
        for bullet in &mut self.projectiles {
            if let Err(err) = bullet.update(&mut cx) {
                warn!(
                    segment = %self.name,
                    actor = bullet.core().id.0,
                    kind = "bullet",
                    error = %err,
                    "actor_update_failed"
                );
            }
        }
    }

    fn handle_knockouts(&mut self) {
        let events: Vec<PlayerEvent> = self.player_events.drain(..).collect();
        for event in events {
            match event {
                PlayerEvent::Ko { slot } => self.on_player_ko(slot),
            }
            if self.phase != SegmentPhase::Running {
                break;
            }
        }
    }

    /// Everyone out of lives ends the run, everyone knocked out restarts the segment,
    /// otherwise the knocked-out player just leaves the field.
    fn on_player_ko(&mut self, slot: usize) {
        let total = self.players.len();
        let knocked_out = self
            .players
            .iter()
            .filter(|player| player.is_knocked_out())
            .count();
        let dead = self
            .players
            .iter()
            .filter(|player| player.is_knocked_out() && player.is_dead())
            .count();
        let lives = self
            .players
            .iter()
            .find(|player| player.slot() == slot)
            .map_or(-1, Ninja::lives);
        info!(segment = %self.name, slot, lives, knocked_out, dead, "player_ko");

        if dead == total {
            info!(segment = %self.name, "game_over");
            self.stop(SegmentOutcome::GameOver);
        } else if knocked_out == total {
            info!(segment = %self.name, "level_restart");
            self.stop(SegmentOutcome::Restart);
        } else if let Some(player) = self.players.iter_mut().find(|player| player.slot() == slot) {
            self.explosions
                .push(Explosion::new(player.core().center(), self.now_ms));
            let core = player.core_mut();
            core.body.enabled = false;
            core.visible = false;
        }
    }

    /// Freezes the segment and clears the enemy roster; the outcome is reported once the
    /// fade has run.
    fn stop(&mut self, outcome: SegmentOutcome) {
        if self.phase != SegmentPhase::Running {
            return;
        }
        for enemy in self.enemies.drain(..) {
            self.schedule.cancel_owner(enemy.core().id);
        }
        for bullet in self.projectiles.drain(..) {
            self.schedule.cancel_owner(bullet.core().id);
        }
        self.phase = SegmentPhase::Stopping {
            since_ms: self.now_ms,
            outcome,
        };
    }

    fn hud_snapshot(&self) -> HudSnapshot {
        HudSnapshot {
            players: self
                .players
                .iter()
                .map(|player| PlayerHud {
                    slot: player.slot(),
                    stats: player.stats(),
                    active: player.is_active(),
                })
                .collect(),
            remaining_seconds: self.timer.remaining_ms(self.now_ms).div_ceil(1000),
        }
    }

    pub(crate) fn render(&self, draw: &mut DrawList) {
        draw.scroll = self.camera.scroll();
        let view = self.camera.view_rect();
        for rect in self.tiles.solid_rects_in(&view) {
            draw.world_rect(rect, TILE_COLOR);
        }
        for platform in &self.platforms {
            if platform.kind == PlatformKind::Ledge && platform.bounds.overlaps(&view) {
                draw.world_rect(platform.bounds, LEDGE_COLOR);
            }
        }
        for sand in &self.quicksand {
            draw.world_rect(*sand, QUICKSAND_COLOR);
        }
        for power_up in self.power_ups.iter().filter(|power_up| power_up.core().visible) {
            draw.world_rect(power_up.core().bounds(), POWER_UP_COLOR);
        }
        for enemy in self.enemies.iter().filter(|enemy| enemy.core().visible) {
            draw.world_rect(enemy.core().bounds(), ENEMY_COLOR);
        }
        for bullet in self.projectiles.iter().filter(|bullet| bullet.core().visible) {
            draw.world_rect(bullet.core().bounds(), BULLET_COLOR);
        }
        for player in &self.players {
            if !player.is_active() || !player.core().visible {
                continue;
            }
            // invincible players blink
            if player.is_invincible() && (self.now_ms / 100) % 2 == 1 {
                continue;
            }
            let color = PLAYER_COLORS[player.slot() % MAX_NUM_PLAYERS];
            draw.world_rect(player.core().bounds(), color);
            if let Some(sword) = player.sword_hitbox(self.now_ms) {
                draw.world_rect(sword, SWORD_COLOR);
            }
        }
        for explosion in &self.explosions {
            draw.world_rect(
                Rect::from_center(
                    explosion.center(),
                    explosion::FRAME_WIDTH,
                    explosion::FRAME_HEIGHT,
                ),
                EXPLOSION_COLOR,
            );
            for wave in explosion.shockwave_centers(self.now_ms) {
                draw.world_rect(Rect::from_center(wave, 4.0, 4.0), EXPLOSION_COLOR);
            }
        }
        self.hud.render(draw);
    }
}
