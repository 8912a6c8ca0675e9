use crate::actor::ActorId;

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledAction<A> {
    pub fire_at_ms: u64,
    pub owner: ActorId,
    pub action: A,
    seq: u64,
}

/// Deferred one-shot actions keyed by owner. Entries cancelled through
/// [`ScheduledActions::cancel_owner`] are gone for good.
#[derive(Debug, Clone)]
pub struct ScheduledActions<A> {
    entries: Vec<ScheduledAction<A>>,
    next_seq: u64,
}

impl<A> Default for ScheduledActions<A> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<A> ScheduledActions<A> {
    pub fn schedule(&mut self, owner: ActorId, fire_at_ms: u64, action: A) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        self.entries.push(ScheduledAction {
            fire_at_ms,
            owner,
            action,
            seq,
        });
    }

    pub fn cancel_owner(&mut self, owner: ActorId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.owner != owner);
        before - self.entries.len()
    }

    /// Removes and returns every entry due at `now_ms`, oldest deadline first, ties in
    /// scheduling order.
    pub fn drain_due(&mut self, now_ms: u64) -> Vec<ScheduledAction<A>> {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| entry.fire_at_ms <= now_ms);
        self.entries = pending;
        due.sort_by_key(|entry| (entry.fire_at_ms, entry.seq));
        due
    }

    pub fn pending_for(&self, owner: ActorId) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.owner == owner)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
