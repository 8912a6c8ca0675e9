use std::fmt::Debug;

/// Millisecond time source seen by actors. Scene clocks stop while their scene is inactive.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_ms(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachine<S> {
    current: S,
    started_at_ms: u64,
}

impl<S: Copy + Eq> StateMachine<S> {
    pub fn new(initial: S, now_ms: u64) -> Self {
        Self {
            current: initial,
            started_at_ms: now_ms,
        }
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_at_ms)
    }

    pub fn is(&self, state: S) -> bool {
        self.current == state
    }

    fn enter(&mut self, next: S, now_ms: u64) {
        self.current = next;
        self.started_at_ms = now_ms;
    }
}

/// Per-state hooks of an actor. Implementors never assign their state directly; every
/// change goes through [`StateGate::set_state`].
pub trait Stateful<Cx: ?Sized> {
    type State: Copy + Eq + Debug;

    fn state_machine(&self) -> &StateMachine<Self::State>;
    fn state_machine_mut(&mut self) -> &mut StateMachine<Self::State>;

    fn on_end_state(&mut self, _cx: &mut Cx, _current: Self::State, _next: Self::State) {}
    fn on_begin_state(&mut self, _cx: &mut Cx, _previous: Self::State, _next: Self::State) {}

    fn state(&self) -> Self::State {
        self.state_machine().current()
    }
}

pub trait StateGate<Cx: Clock + ?Sized>: Stateful<Cx> {
    /// Returns `false` (and runs no hook) when `next` is already the current state.
    fn set_state(&mut self, cx: &mut Cx, next: Self::State) -> bool;
    fn elapsed_in_state(&self, cx: &Cx) -> u64;
}

impl<T, Cx> StateGate<Cx> for T
where
    T: Stateful<Cx> + ?Sized,
    Cx: Clock + ?Sized,
{
    fn set_state(&mut self, cx: &mut Cx, next: Self::State) -> bool {
        let current = self.state_machine().current();
        if current == next {
            return false;
        }
        self.on_end_state(cx, current, next);
        let now_ms = cx.now_ms();
        self.state_machine_mut().enter(next, now_ms);
        self.on_begin_state(cx, current, next);
        true
    }

    fn elapsed_in_state(&self, cx: &Cx) -> u64 {
        self.state_machine().elapsed_ms(cx.now_ms())
    }
}
