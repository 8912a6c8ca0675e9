use ninja_engine::Vec2;

pub(crate) const SHOCKWAVE_RADIUS: f32 = 16.0;
pub(crate) const EXPLOSION_DURATION_MS: u64 = 100;
pub(crate) const FRAME_WIDTH: f32 = 15.0;
pub(crate) const FRAME_HEIGHT: f32 = 16.0;

/// Visual burst left where an actor was defeated: a flash plus four shockwave sprites
/// moving out along the diagonals. Never collides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Explosion {
    center: Vec2,
    started_at_ms: u64,
}

impl Explosion {
    pub(crate) fn new(center: Vec2, now_ms: u64) -> Self {
        Self {
            center,
            started_at_ms: now_ms,
        }
    }

    pub(crate) fn center(&self) -> Vec2 {
        self.center
    }

    pub(crate) fn is_finished(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.started_at_ms) >= EXPLOSION_DURATION_MS
    }

    /// 0.0 at spawn, 1.0 once finished.
    pub(crate) fn progress(&self, now_ms: u64) -> f32 {
        let elapsed = now_ms.saturating_sub(self.started_at_ms).min(EXPLOSION_DURATION_MS);
        elapsed as f32 / EXPLOSION_DURATION_MS as f32
    }

    pub(crate) fn shockwave_centers(&self, now_ms: u64) -> [Vec2; 4] {
        let reach = SHOCKWAVE_RADIUS * self.progress(now_ms);
        let Vec2 { x, y } = self.center;
        [
            Vec2::new(x + reach, y - reach),
            Vec2::new(x + reach, y + reach),
            Vec2::new(x - reach, y - reach),
            Vec2::new(x - reach, y + reach),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lasts_one_hundred_milliseconds() {
        let explosion = Explosion::new(Vec2::new(10.0, 10.0), 500);
        assert!(!explosion.is_finished(599));
        assert!(explosion.is_finished(600));
    }

    #[test]
    fn shockwaves_reach_radius_at_the_end() {
        let explosion = Explosion::new(Vec2::new(100.0, 100.0), 0);
        assert_eq!(explosion.shockwave_centers(0), [Vec2::new(100.0, 100.0); 4]);
        let last = explosion.shockwave_centers(100);
        assert_eq!(last[0], Vec2::new(116.0, 84.0));
        assert_eq!(last[3], Vec2::new(84.0, 116.0));
    }
}
