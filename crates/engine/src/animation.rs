/// Fixed-length, non-repeating frame clip timed against state elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationClip {
    pub frame_count: u32,
    pub duration_ms: u64,
}

impl AnimationClip {
    pub const fn new(frame_count: u32, duration_ms: u64) -> Self {
        Self {
            frame_count,
            duration_ms,
        }
    }

    /// 1-based frame shown after `elapsed_ms`; holds the last frame once complete.
    pub fn frame_at(&self, elapsed_ms: u64) -> u32 {
        if self.frame_count == 0 {
            return 0;
        }
        if self.duration_ms == 0 || elapsed_ms >= self.duration_ms {
            return self.frame_count;
        }
        let frame = elapsed_ms * u64::from(self.frame_count) / self.duration_ms;
        frame as u32 + 1
    }

    pub fn is_complete(&self, elapsed_ms: u64) -> bool {
        elapsed_ms >= self.duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_frame_clip_advances_evenly() {
        let slash = AnimationClip::new(3, 250);
        assert_eq!(slash.frame_at(0), 1);
        assert_eq!(slash.frame_at(83), 1);
        assert_eq!(slash.frame_at(84), 2);
        assert_eq!(slash.frame_at(166), 2);
        assert_eq!(slash.frame_at(167), 3);
        assert_eq!(slash.frame_at(900), 3);
        assert!(!slash.is_complete(249));
        assert!(slash.is_complete(250));
    }

    #[test]
    fn zero_length_clip_completes_immediately() {
        let spark = AnimationClip::new(1, 0);
        assert!(spark.is_complete(0));
        assert_eq!(spark.frame_at(0), 1);
    }
}
