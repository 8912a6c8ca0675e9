/// A segment's map and config resolved into typed data, ready to instantiate.
#[derive(Debug, Clone)]
pub(crate) struct SegmentLayout {
    pub(crate) name: String,
    pub(crate) tiles: Tilemap,
    pub(crate) limits: LevelLimits,
    pub(crate) camera_bounds: Rect,
    pub(crate) player_spawn: Vec2,
    pub(crate) enemies: Vec<MapObject>,
    pub(crate) power_ups: Vec<MapObject>,
    pub(crate) walls: Vec<MapObject>,
    pub(crate) quicksand: Vec<Rect>,
    pub(crate) factory: FactoryContext,
}

fn object_layer(document: &MapDocument, name: &str) -> Vec<MapObject> {
    document
        .object_layer(name)
        .map(|layer| layer.objects.clone())
        .unwrap_or_default()
}

impl SegmentLayout {
    pub(crate) fn from_document(
        config: &SegmentConfig,
        document: &MapDocument,
    ) -> Result<Self, SegmentError> {
        let layer = document
            .tile_layer(PLATFORMS_LAYER)
            .ok_or_else(|| SegmentError::MissingLayer {
                segment: config.name.clone(),
                layer: PLATFORMS_LAYER,
            })?;
        let tiles = document
            .build_tilemap(layer, &config.collision_ranges())
            .map_err(|source| SegmentError::Tilemap {
                segment: config.name.clone(),
                layer: PLATFORMS_LAYER,
                source,
            })?;

        let width = config.level_width.unwrap_or_else(|| document.pixel_width());
        let lower_bound = config.lower_bounds.filter(|bound| *bound > 0.0);
        let camera_height = lower_bound.unwrap_or_else(|| document.pixel_height());

        // every pickup record goes through the same factory tag
        let power_ups = object_layer(document, POWER_UPS_LAYER)
            .into_iter()
            .map(|mut record| {
                record.name = String::from("PowerUp");
                record
            })
            .collect();

        Ok(Self {
            name: config.name.clone(),
            tiles,
            limits: LevelLimits { width, lower_bound },
            camera_bounds: Rect::new(0.0, 0.0, width, camera_height),
            player_spawn: config.spawn_point().unwrap_or(PLAYER1_SPAWN),
            enemies: object_layer(document, ENEMIES_LAYER),
            power_ups,
            walls: object_layer(document, WALLS_LAYER),
            quicksand: object_layer(document, QUICKSAND_LAYER)
                .iter()
                .map(MapObject::shape_rect)
                .collect(),
            factory: FactoryContext {
                power_up_first_gid: document.first_gid_of(POWER_UP_TILESET),
            },
        })
    }

    fn spawn_point(&self, slot: usize) -> Vec2 {
        Vec2::new(
            self.player_spawn.x + PLAYER_SPAWN_SPACING * slot as f32,
            self.player_spawn.y,
        )
    }
}

fn build_platforms(segment: &str, walls: &[MapObject]) -> Vec<Platform> {
    walls
        .iter()
        .filter_map(|object| match PlatformKind::from_name(&object.name) {
            Some(kind) => Some(Platform {
                kind,
                bounds: object.shape_rect(),
            }),
            None => {
                warn!(segment, object = object.id, name = %object.name, "platform_kind_unknown");
                None
            }
        })
        .collect()
}

/// Turns map records into pending entries, pulling every record named by a `spawnBox`
/// property out of the pool and attaching its rectangle to the record that named it.
fn build_pending_pool(segment: &str, records: Vec<MapObject>) -> Vec<PendingRecord> {
    let mut pool: Vec<PendingRecord> = records.into_iter().map(PendingRecord::new).collect();
    let links: Vec<(usize, u32)> = pool
        .iter()
        .enumerate()
        .filter_map(|(index, pending)| {
            pending
                .record
                .property(SPAWN_BOX_PROPERTY)
                .and_then(|value| value.as_object_id())
                .map(|box_id| (index, box_id))
        })
        .collect();

    let mut consumed = Vec::new();
    for (index, box_id) in links {
        let trigger = pool
            .iter()
            .find(|pending| pending.record.id == box_id)
            .map(|pending| pending.record.shape_rect());
        match trigger {
            Some(rect) => {
                pool[index].spawn_box = Some(rect);
                consumed.push(box_id);
            }
            None => warn!(
                segment,
                object = pool[index].record.id,
                spawn_box = box_id,
                "spawn_box_missing"
            ),
        }
    }
    pool.retain(|pending| !consumed.contains(&pending.record.id));
    pool
}

impl GameSegment {
    pub(crate) fn new(
        layout: SegmentLayout,
        roster: Roster,
        initial_timer_ms: u64,
        rng: StdRng,
        now_ms: u64,
    ) -> Self {
        let players = match roster {
            Roster::Fresh(count) => (0..count.min(MAX_NUM_PLAYERS))
                .map(|slot| {
                    Ninja::new(ActorId(slot as u64), slot, layout.spawn_point(slot), now_ms)
                })
                .collect(),
            Roster::Carried {
                mut players,
                keep_stats,
            } => {
                for player in &mut players {
                    let spawn = layout.spawn_point(player.slot());
                    if player.is_dead() {
                        player.respawn(spawn, now_ms);
                        player.retire();
                    } else if keep_stats && !player.is_knocked_out() {
                        player.carry_over(spawn, now_ms);
                    } else {
                        player.respawn(spawn, now_ms);
                    }
                }
                players
            }
        };

        let mut camera = Camera2D::new(Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT), layout.camera_bounds);
        let starts: Vec<Vec2> = players
            .iter()
            .filter(|player: &&Ninja| player.is_active())
            .map(|player| player.core().center())
            .collect();
        if !starts.is_empty() {
            let count = starts.len() as f32;
            let sum = starts
                .iter()
                .fold(Vec2::ZERO, |acc, point| Vec2::new(acc.x + point.x, acc.y + point.y));
            camera.set_focus(Vec2::new(sum.x / count, sum.y / count));
        }

        let platforms = build_platforms(&layout.name, &layout.walls);
        let pending_enemies = build_pending_pool(&layout.name, layout.enemies);
        let pending_power_ups = build_pending_pool(&layout.name, layout.power_ups);
        info!(
            segment = %layout.name,
            players = players.len(),
            enemies = pending_enemies.len(),
            power_ups = pending_power_ups.len(),
            platforms = platforms.len(),
            timer_ms = initial_timer_ms,
            "segment_loaded"
        );

        let timer = SegmentTimer {
            initial_ms: initial_timer_ms,
            started_at_ms: now_ms,
        };
        let mut segment = Self {
            name: layout.name,
            tiles: layout.tiles,
            limits: layout.limits,
            platforms,
            quicksand: layout.quicksand,
            pending_enemies,
            pending_power_ups,
            factory: layout.factory,
            players,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            power_ups: Vec::new(),
            explosions: Vec::new(),
            schedule: ScheduledActions::default(),
            spawns: Vec::new(),
            player_events: Vec::new(),
            ids: ActorIdAllocator::starting_at(MAX_NUM_PLAYERS as u64),
            rng,
            camera,
            scrolled: false,
            timer,
            phase: SegmentPhase::Running,
            now_ms,
            hud: HudSnapshot::default(),
            last_frame_order: Vec::with_capacity(SEGMENT_FRAME_ORDER.len()),
        };
        segment.hud = segment.hud_snapshot();
        segment
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn phase(&self) -> SegmentPhase {
        self.phase
    }

    pub(crate) fn outcome(&self) -> Option<SegmentOutcome> {
        match self.phase {
            SegmentPhase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub(crate) fn players(&self) -> &[Ninja] {
        &self.players
    }

    pub(crate) fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub(crate) fn pending_enemies(&self) -> &[PendingRecord] {
        &self.pending_enemies
    }

    pub(crate) fn hud(&self) -> &HudSnapshot {
        &self.hud
    }

    pub(crate) fn camera(&self) -> &Camera2D {
        &self.camera
    }

    /// Scripted immunity for every player. Independent of hit grace and post-KO immunity,
    /// so turning it off leaves those running.
    pub(crate) fn set_invincibility(&mut self, on: bool) {
        for player in &mut self.players {
            if on {
                player.grant_invincibility(InvincibilitySource::Scripted);
            } else {
                player.clear_invincibility(InvincibilitySource::Scripted);
            }
        }
        info!(segment = %self.name, on, "invincibility_set");
    }

    pub(crate) fn remaining_ms(&self) -> u64 {
        self.timer.remaining_ms(self.now_ms)
    }

    pub(crate) fn actor_count(&self) -> usize {
        self.players.len()
            + self.enemies.len()
            + self.projectiles.len()
            + self.power_ups.len()
            + self.explosions.len()
    }

    /// Hands the roster to the next segment.
    pub(crate) fn into_players(self) -> Vec<Ninja> {
        self.players
    }
}
