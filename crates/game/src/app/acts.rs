use super::config::{ActConfig, ActsFile, SegmentConfig};

/// Position in the act sequence. Before the first `next_segment` call nothing is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SegmentCursor {
    pub(crate) act: usize,
    pub(crate) segment: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct Progression {
    acts: Vec<ActConfig>,
    cursor: Option<SegmentCursor>,
}

impl Progression {
    pub(crate) fn new(file: ActsFile) -> Self {
        Self {
            acts: file.acts,
            cursor: None,
        }
    }

    pub(crate) fn cursor(&self) -> Option<SegmentCursor> {
        self.cursor
    }

    pub(crate) fn current(&self) -> Option<&SegmentConfig> {
        let cursor = self.cursor?;
        self.acts.get(cursor.act)?.segments.get(cursor.segment)
    }

    pub(crate) fn current_act(&self) -> Option<&ActConfig> {
        self.acts.get(self.cursor.map_or(0, |cursor| cursor.act))
    }

    /// Time budget of the current act (the first act before the run starts).
    pub(crate) fn time_limit_ms(&self) -> u64 {
        self.current_act()
            .map_or(0, |act| u64::from(act.time_limit_seconds) * 1000)
    }

    /// Advances to the following segment, crossing into the next act when the current one
    /// is exhausted. `None` once the last segment of the last act is behind.
    pub(crate) fn next_segment(&mut self) -> Option<&SegmentConfig> {
        let next = match self.cursor {
            None => SegmentCursor { act: 0, segment: 0 },
            Some(cursor) => {
                let act = self.acts.get(cursor.act)?;
                if cursor.segment + 1 < act.segments.len() {
                    SegmentCursor {
                        act: cursor.act,
                        segment: cursor.segment + 1,
                    }
                } else {
                    SegmentCursor {
                        act: cursor.act + 1,
                        segment: 0,
                    }
                }
            }
        };
        if self
            .acts
            .get(next.act)
            .map_or(true, |act| next.segment >= act.segments.len())
        {
            return None;
        }
        self.cursor = Some(next);
        self.current()
    }

    /// Rewinds to before the first segment, as after a game over.
    pub(crate) fn reset(&mut self) {
        self.cursor = None;
    }

    /// Moves back to the latest checkpoint segment of the current act at or before the
    /// cursor. Without one the cursor stays put.
    pub(crate) fn restart_to_checkpoint(&mut self) -> Option<&SegmentConfig> {
        let cursor = self.cursor?;
        let act = self.acts.get(cursor.act)?;
        if let Some(segment) = (0..=cursor.segment)
            .rev()
            .find(|index| act.segments.get(*index).is_some_and(|segment| segment.checkpoint))
        {
            self.cursor = Some(SegmentCursor {
                act: cursor.act,
                segment,
            });
        }
        self.current()
    }
}
