/// Side of the moving body that pressed into a wall, as the direction the player faces.
fn wall_facing(side: Side) -> Option<Facing> {
    match side {
        Side::Left => Some(Facing::Left),
        Side::Right => Some(Facing::Right),
        Side::Up | Side::Down => None,
    }
}

/// Lands a body on `ledge` when it sank into it from above this frame.
fn settle_on(body: &mut Body, ledge: &Rect) {
    if !body.bounds().overlaps(ledge) || body.velocity.y < 0.0 {
        return;
    }
    body.y = ledge.top() - body.height;
    body.velocity.y = 0.0;
    body.blocked.set(Side::Down);
}

/// Integrates and moves a body that collides with tiles and every platform.
fn step_grounded_body(
    body: &mut Body,
    dt_seconds: f32,
    tiles: &Tilemap,
    platforms: &[Platform],
) {
    if !body.enabled {
        return;
    }
    integrate_velocity(body, dt_seconds, GRAVITY_Y);
    let area = swept_bounds(body, dt_seconds);
    let mut solids = tiles.solid_rects_in(&area);
    solids.extend(platforms.iter().map(|platform| platform.bounds));
    move_and_collide(body, dt_seconds, &solids);
}

fn step_free_body(body: &mut Body, dt_seconds: f32) {
    if !body.enabled {
        return;
    }
    integrate_velocity(body, dt_seconds, GRAVITY_Y);
    move_and_collide(body, dt_seconds, &[]);
}

impl GameSegment {
    fn step_physics(&mut self, dt_seconds: f32) {
        for enemy in &mut self.enemies {
            let hovering = enemy.is_hovering();
            let body = &mut enemy.core_mut().body;
            if hovering {
                step_free_body(body, dt_seconds);
            } else {
                step_grounded_body(body, dt_seconds, &self.tiles, &self.platforms);
            }
        }
        for power_up in &mut self.power_ups {
            step_grounded_body(&mut power_up.core_mut().body, dt_seconds, &self.tiles, &self.platforms);
        }
        for bullet in &mut self.projectiles {
            step_free_body(&mut bullet.core_mut().body, dt_seconds);
        }
        for index in 0..self.players.len() {
            self.step_player_physics(index, dt_seconds);
        }
    }

    /// Player movement plus every platform reaction: wall climbs, ledges, spikes, exits
    /// and quicksand.
    fn step_player_physics(&mut self, index: usize, dt_seconds: f32) {
        let mut cx = PlayerContext {
            now_ms: self.now_ms,
            limits: self.limits,
            schedule: &mut self.schedule,
            events: &mut self.player_events,
        };
        let player = &mut self.players[index];
        if !player.core().body.enabled {
            return;
        }

        let body = &mut player.core_mut().body;
        integrate_velocity(body, dt_seconds, GRAVITY_Y);
        let area = swept_bounds(body, dt_seconds);

        let mut solids = Vec::new();
        let mut sources = Vec::new();
        if !player.in_quicksand() {
            solids = self.tiles.solid_rects_in(&area);
            sources = vec![None; solids.len()];
        }
        let ledge_top = player.ledge_top();
        for (id, platform) in self.platforms.iter().enumerate() {
            let solid = match platform.kind {
                PlatformKind::Wall => true,
                PlatformKind::Ledge => ledge_top.is_some_and(|ledge| ledge.id == id),
                PlatformKind::Spike | PlatformKind::Exit => false,
            };
            if solid {
                solids.push(platform.bounds);
                sources.push(Some(id));
            }
        }

        let contacts = move_and_collide(&mut player.core_mut().body, dt_seconds, &solids);
        for contact in contacts {
            let Some(id) = sources[contact.solid] else {
                continue;
            };
            let platform = self.platforms[id];
            if platform.kind != PlatformKind::Wall {
                continue;
            }
            if let Some(side) = wall_facing(contact.side) {
                let wall = PlatformRef {
                    id,
                    bounds: platform.bounds,
                };
                player.on_touched_wall(&mut cx, wall, side);
            }
        }

        let mut cleared = false;
        for (id, platform) in self.platforms.iter().enumerate() {
            if !player.core().bounds().overlaps(&platform.bounds) {
                continue;
            }
            match platform.kind {
                PlatformKind::Ledge => {
                    let ledge = PlatformRef {
                        id,
                        bounds: platform.bounds,
                    };
                    player.on_touched_ledge(&mut cx, ledge);
                    if player.ledge_top().is_some_and(|top| top.id == id) {
                        settle_on(&mut player.core_mut().body, &platform.bounds);
                    }
                }
                PlatformKind::Spike => {
                    player.got_hit_by_spike(&mut cx);
                }
                PlatformKind::Exit => cleared |= player.is_active(),
                PlatformKind::Wall => {}
            }
        }

        let bounds = player.core().bounds();
        let sinking = self.quicksand.iter().any(|sand| sand.intersects(&bounds));
        player.set_quicksand(sinking);

        if cleared && self.phase == SegmentPhase::Running {
            let remaining_ms = self.timer.remaining_ms(self.now_ms);
            info!(segment = %self.name, slot = self.players[index].slot(), remaining_ms, "segment_cleared");
            self.stop(SegmentOutcome::Cleared { remaining_ms });
        }
    }

    /// Enemy and projectile contact with players, then sword hits and pickup collection.
    fn resolve_contacts(&mut self) {
        let mut cx = PlayerContext {
            now_ms: self.now_ms,
            limits: self.limits,
            schedule: &mut self.schedule,
            events: &mut self.player_events,
        };
        for player in &mut self.players {
            if !player.is_active() {
                continue;
            }
            let bounds = player.core().bounds();
            let hostile = self
                .enemies
                .iter()
                .filter(|enemy| enemy.core().body.enabled)
                .map(|enemy| (enemy.core().bounds(), enemy.attack_strength()))
                .chain(
                    self.projectiles
                        .iter()
                        .filter(|bullet| bullet.core().body.enabled)
                        .map(|bullet| (bullet.core().bounds(), bullet.attack_strength())),
                );
            for (other, strength) in hostile {
                if let Some(side) = contact_side(&bounds, &other) {
                    if player.got_hit(&mut cx, strength, Some(side)) {
                        break;
                    }
                }
            }
        }

        for player in &self.players {
            if !player.is_active() {
                continue;
            }
            let Some(sword) = player.sword_hitbox(self.now_ms) else {
                continue;
            };
            let strength = player.attack_strength();
            for enemy in &mut self.enemies {
                if enemy.core().bounds().overlaps(&sword) {
                    enemy.got_hit(strength, &mut self.spawns);
                }
            }
            for bullet in &mut self.projectiles {
                if bullet.core().bounds().overlaps(&sword) {
                    bullet.got_hit(strength);
                }
            }
            for power_up in &mut self.power_ups {
                if power_up.core().bounds().overlaps(&sword) {
                    power_up.knock_loose(self.now_ms);
                }
            }
        }

        for power_up in &mut self.power_ups {
            if !power_up.is_collectable() {
                continue;
            }
            let bounds = power_up.core().bounds();
            let Some(player) = self
                .players
                .iter_mut()
                .find(|player| player.is_active() && player.core().bounds().overlaps(&bounds))
            else {
                continue;
            };
            if let Some(variant) = power_up.collect() {
                debug!(slot = player.slot(), ?variant, "power_up_collected");
                player.pick_up_power_up(variant);
            }
        }
    }
}
