#[derive(Debug, Error)]
pub(crate) enum SegmentError {
    #[error(transparent)]
    Map(#[from] MapPipelineError),
    #[error("map for segment {segment} has no tile layer named {layer}")]
    MissingLayer {
        segment: String,
        layer: &'static str,
    },
    #[error("map for segment {segment} has an invalid {layer} layer: {source}")]
    Tilemap {
        segment: String,
        layer: &'static str,
        #[source]
        source: TilemapError,
    },
}

/// Named object of the `Walls` layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlatformKind {
    /// Solid; side contact lets an airborne player climb.
    Wall,
    /// Semi-solid: players stand on it only after landing from above, or hang from it.
    Ledge,
    Spike,
    Exit,
}

impl PlatformKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "Wall" => Some(PlatformKind::Wall),
            "Ledge" => Some(PlatformKind::Ledge),
            "Spike" => Some(PlatformKind::Spike),
            "Exit" => Some(PlatformKind::Exit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Platform {
    pub(crate) kind: PlatformKind,
    pub(crate) bounds: Rect,
}

/// Map record not yet turned into an actor.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingRecord {
    pub(crate) record: MapObject,
    pub(crate) placement: Rect,
    /// Trigger rectangle taken from the record named by `spawnBox`. When set, only a
    /// player entering it spawns the record.
    pub(crate) spawn_box: Option<Rect>,
}

impl PendingRecord {
    fn new(record: MapObject) -> Self {
        Self {
            placement: record.placement_rect(),
            record,
            spawn_box: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentOutcome {
    /// Every player is knocked out but someone still has lives.
    Restart,
    GameOver,
    /// A player reached an exit; the remaining time carries into the next segment.
    Cleared { remaining_ms: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentPhase {
    Running,
    Stopping { since_ms: u64, outcome: SegmentOutcome },
    Finished(SegmentOutcome),
}

/// How the player roster enters a new segment.
#[derive(Debug)]
pub(crate) enum Roster {
    Fresh(usize),
    /// Players from a previous segment. `keep_stats` carries hp, mana and powers over;
    /// otherwise only lives survive.
    Carried { players: Vec<Ninja>, keep_stats: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameStep {
    TimeLimit,
    DueActions,
    Physics,
    Players,
    Camera,
    Enemies,
    Contacts,
    Knockouts,
    SpawnEnemies,
    PowerUps,
    Cleanup,
    Hud,
}

const SEGMENT_FRAME_ORDER: [FrameStep; 12] = [
    FrameStep::TimeLimit,
    FrameStep::DueActions,
    FrameStep::Physics,
    FrameStep::Players,
    FrameStep::Camera,
    FrameStep::Enemies,
    FrameStep::Contacts,
    FrameStep::Knockouts,
    FrameStep::SpawnEnemies,
    FrameStep::PowerUps,
    FrameStep::Cleanup,
    FrameStep::Hud,
];

/// Countdown shared by a segment's players.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SegmentTimer {
    initial_ms: u64,
    started_at_ms: u64,
}

impl SegmentTimer {
    fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.initial_ms
            .saturating_sub(now_ms.saturating_sub(self.started_at_ms))
    }
}

/// Stands in for a missing device so the player still updates with nothing pressed.
struct IdleControl;

impl ControlMethod for IdleControl {
    fn held(&self, _button: Button) -> bool {
        false
    }

    fn hit(&self, _button: Button) -> bool {
        false
    }

    fn update(&mut self) {}

    fn reset_scene(&mut self) {}
}

pub(crate) struct GameSegment {
    name: String,
    tiles: Tilemap,
    limits: LevelLimits,
    platforms: Vec<Platform>,
    quicksand: Vec<Rect>,
    pending_enemies: Vec<PendingRecord>,
    pending_power_ups: Vec<PendingRecord>,
    factory: FactoryContext,
    players: Vec<Ninja>,
    enemies: Vec<Enemy>,
    projectiles: Vec<Bullet>,
    power_ups: Vec<PowerUp>,
    explosions: Vec<Explosion>,
    schedule: ScheduledActions<SegmentAction>,
    spawns: Vec<SpawnRequest>,
    player_events: Vec<PlayerEvent>,
    ids: ActorIdAllocator,
    rng: StdRng,
    camera: Camera2D,
    scrolled: bool,
    timer: SegmentTimer,
    phase: SegmentPhase,
    now_ms: u64,
    hud: HudSnapshot,
    last_frame_order: Vec<FrameStep>,
}
