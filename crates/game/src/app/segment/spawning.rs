/// Which pending records are due this frame. Camera checks only run when the scroll
/// moved; trigger boxes are checked every frame against live players.
fn take_due_records(
    pool: &mut Vec<PendingRecord>,
    camera_area: Option<Rect>,
    player_bounds: &[Rect],
) -> Vec<PendingRecord> {
    let mut due = Vec::new();
    let mut index = 0;
    while index < pool.len() {
        let pending = &pool[index];
        let triggered = match pending.spawn_box {
            Some(trigger) => player_bounds.iter().any(|bounds| trigger.overlaps(bounds)),
            None => camera_area.is_some_and(|area| area.overlaps(&pending.placement)),
        };
        if triggered {
            due.push(pool.remove(index));
        } else {
            index += 1;
        }
    }
    due
}

impl GameSegment {
    fn live_player_bounds(&self) -> Vec<Rect> {
        self.players
            .iter()
            .filter(|player| player.is_active())
            .map(|player| player.core().bounds())
            .collect()
    }

    fn spawn_enemies(&mut self) {
        let camera_area = self
            .scrolled
            .then(|| self.camera.view_rect().expanded(ENEMY_SPAWN_MARGIN, ENEMY_SPAWN_MARGIN));
        let players = self.live_player_bounds();
        let views = self.player_views();
        for pending in take_due_records(&mut self.pending_enemies, camera_area, &players) {
            let via = if pending.spawn_box.is_some() {
                "spawn_box"
            } else {
                "camera"
            };
            match factory::make_one(&pending.record, &self.factory, &mut self.ids, self.now_ms) {
                Some(Spawned::Enemy(mut enemy)) => {
                    if let Enemy::WaveFloater(floater) = &mut enemy {
                        floater.lock_to_nearest(&views);
                    }
                    debug!(
                        segment = %self.name,
                        kind = enemy.kind(),
                        id = enemy.core().id.0,
                        via,
                        "enemy_activated"
                    );
                    self.enemies.push(enemy);
                }
                Some(Spawned::PowerUp(power_up)) => self.power_ups.push(power_up),
                None => {}
            }
        }
    }

    fn place_power_ups(&mut self) {
        let camera_area = self.scrolled.then(|| self.camera.view_rect());
        for pending in take_due_records(&mut self.pending_power_ups, camera_area, &[]) {
            if let Some(Spawned::PowerUp(power_up)) =
                factory::make_one(&pending.record, &self.factory, &mut self.ids, self.now_ms)
            {
                self.power_ups.push(power_up);
            }
        }
    }

    fn absorb_spawn_requests(&mut self) {
        for request in self.spawns.drain(..) {
            match request {
                SpawnRequest::Bullet(bullet) => self.projectiles.push(bullet),
                SpawnRequest::Explosion(at) => self.explosions.push(Explosion::new(at, self.now_ms)),
            }
        }
    }

    /// Drops removed actors. Defeated enemies lose every pending scheduled action first.
    fn cleanup(&mut self) {
        self.absorb_spawn_requests();
        let schedule = &mut self.schedule;
        self.enemies.retain(|enemy| {
            if !enemy.is_defeated() {
                return true;
            }
            let id = enemy.core().id;
            let cancelled = schedule.cancel_owner(id);
            debug!(kind = enemy.kind(), id = id.0, cancelled, "enemy_removed");
            false
        });

        let keep_area = self.camera.view_rect().expanded(SCREEN_WIDTH, SCREEN_HEIGHT);
        self.projectiles.retain(|bullet| {
            bullet.core().body.enabled && bullet.core().bounds().overlaps(&keep_area)
        });
        self.power_ups.retain(|power_up| !power_up.is_collected());
        let now_ms = self.now_ms;
        self.explosions.retain(|explosion| !explosion.is_finished(now_ms));
    }
}
