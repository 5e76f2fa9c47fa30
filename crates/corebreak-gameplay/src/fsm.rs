//! Generic state machine core.
//!
//! A [`StateMachine`] only knows which state is current, which states were
//! declared and how many transitions have happened. What a state *does*
//! lives in a [`StateHandlers`] implementation: a behaviour table that the
//! machine dispatches into by state. Handlers receive an explicit context
//! (the actor record plus whatever collaborators the archetype needs), so a
//! machine never holds a reference back to its actor.
//!
//! `enter` and `update` may return the next state. The machine enters it
//! immediately, inside the same call; nothing is queued. Handlers must not
//! bounce between states forever within a single call.

use std::fmt::Debug;

use corebreak_common::FsmError;
use tracing::{error, trace, warn};

/// Upper bound on chained transitions within one call before a debug build
/// treats the chain as a handler bug.
const MAX_CHAIN: usize = 16;

/// Information handed to a state's `enter` handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateEntry<S> {
    /// State being entered
    pub state: S,
    /// State that was left, if any
    pub previous: Option<S>,
    /// Transition epoch of this entry
    pub epoch: u64,
}

/// Behaviour table for a family of states.
pub trait StateHandlers<C: ?Sized> {
    /// State identifier type.
    type State: Copy + Eq + Debug;
    /// Deferred events delivered back into the machine (timers).
    type Event: Debug;

    /// Label used in logs and errors.
    const LABEL: &'static str;

    /// Runs when a state is entered. Returning a state chains into it.
    fn enter(&self, _ctx: &mut C, _entry: StateEntry<Self::State>) -> Option<Self::State> {
        None
    }

    /// Runs once per tick for the current state.
    fn update(&self, _ctx: &mut C, _state: Self::State) -> Option<Self::State> {
        None
    }

    /// Runs when a state is left.
    fn exit(&self, _ctx: &mut C, _state: Self::State) {}

    /// Handles a deferred event while in `state`.
    fn event(
        &self,
        _ctx: &mut C,
        _state: Self::State,
        _event: Self::Event,
    ) -> Option<Self::State> {
        None
    }
}

/// State container with explicit transitions.
#[derive(Debug, Clone)]
pub struct StateMachine<S> {
    current: Option<S>,
    declared: Vec<S>,
    fallback: S,
    epoch: u64,
    strict: bool,
}

impl<S: Copy + Eq + Debug> StateMachine<S> {
    /// Creates a machine over `declared` states.
    ///
    /// `fallback` is entered instead of an undeclared target when the machine
    /// is not strict. Machines are strict in debug builds.
    #[must_use]
    pub fn new(declared: &[S], fallback: S) -> Self {
        debug_assert!(
            declared.contains(&fallback),
            "fallback state {fallback:?} must be declared"
        );
        Self {
            current: None,
            declared: declared.to_vec(),
            fallback,
            epoch: 0,
            strict: cfg!(debug_assertions),
        }
    }

    /// Overrides fail-fast behaviour for undeclared targets.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Current state, `None` before the first transition.
    #[must_use]
    pub fn current(&self) -> Option<S> {
        self.current
    }

    /// Checks whether the machine is in `state`.
    #[must_use]
    pub fn is(&self, state: S) -> bool {
        self.current == Some(state)
    }

    /// Number of transitions performed so far.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Checks whether `state` was declared.
    #[must_use]
    pub fn declares(&self, state: S) -> bool {
        self.declared.contains(&state)
    }

    /// Transitions to `next`, reporting an undeclared target as an error.
    ///
    /// Runs `exit` of the current state, switches, then runs `enter` of the
    /// new state, following any chained transitions it returns.
    pub fn try_goto<C, H>(&mut self, handlers: &H, ctx: &mut C, next: S) -> Result<(), FsmError>
    where
        C: ?Sized,
        H: StateHandlers<C, State = S>,
    {
        let mut next = next;
        let mut hops = 0usize;
        loop {
            if !self.declares(next) {
                return Err(FsmError::UndeclaredState {
                    machine: H::LABEL,
                    state: format!("{next:?}"),
                });
            }

            if let Some(current) = self.current {
                handlers.exit(ctx, current);
            }
            let previous = self.current.replace(next);
            self.epoch += 1;
            trace!(machine = H::LABEL, from = ?previous, to = ?next, "state transition");

            let entry = StateEntry {
                state: next,
                previous,
                epoch: self.epoch,
            };
            match handlers.enter(ctx, entry) {
                Some(chained) => {
                    hops += 1;
                    debug_assert!(
                        hops < MAX_CHAIN,
                        "{} machine chained {hops} transitions in one call",
                        H::LABEL
                    );
                    next = chained;
                },
                None => return Ok(()),
            }
        }
    }

    /// Transitions to `next`.
    ///
    /// An undeclared target panics on strict machines. Otherwise it is logged
    /// and the fallback state is entered instead.
    pub fn goto<C, H>(&mut self, handlers: &H, ctx: &mut C, next: S)
    where
        C: ?Sized,
        H: StateHandlers<C, State = S>,
    {
        if let Err(err) = self.try_goto(handlers, ctx, next) {
            if self.strict {
                panic!("{err}");
            }
            warn!(machine = H::LABEL, %err, fallback = ?self.fallback, "falling back");
            let fallback = self.fallback;
            if let Err(err) = self.try_goto(handlers, ctx, fallback) {
                error!(machine = H::LABEL, %err, "fallback transition failed");
            }
        }
    }

    /// Runs `update` of the current state and applies its transition.
    pub fn update<C, H>(&mut self, handlers: &H, ctx: &mut C)
    where
        C: ?Sized,
        H: StateHandlers<C, State = S>,
    {
        let Some(state) = self.current else {
            return;
        };
        if let Some(next) = handlers.update(ctx, state) {
            self.goto(handlers, ctx, next);
        }
    }

    /// Delivers a deferred event to the current state.
    pub fn dispatch<C, H>(&mut self, handlers: &H, ctx: &mut C, event: H::Event)
    where
        C: ?Sized,
        H: StateHandlers<C, State = S>,
    {
        let Some(state) = self.current else {
            return;
        };
        if let Some(next) = handlers.event(ctx, state, event) {
            self.goto(handlers, ctx, next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Off,
        On,
        Blink,
        Broken,
    }

    #[derive(Default)]
    struct Log {
        calls: Vec<String>,
        auto_off: bool,
    }

    struct LightTable;

    impl StateHandlers<Log> for LightTable {
        type State = Light;
        type Event = &'static str;
        const LABEL: &'static str = "light";

        fn enter(&self, ctx: &mut Log, entry: StateEntry<Light>) -> Option<Light> {
            ctx.calls.push(format!("enter {:?}", entry.state));
            if entry.state == Light::Blink {
                return Some(Light::Off);
            }
            None
        }

        fn update(&self, ctx: &mut Log, state: Light) -> Option<Light> {
            ctx.calls.push(format!("update {state:?}"));
            (ctx.auto_off && state == Light::On).then_some(Light::Off)
        }

        fn exit(&self, ctx: &mut Log, state: Light) {
            ctx.calls.push(format!("exit {state:?}"));
        }

        fn event(&self, ctx: &mut Log, _state: Light, event: &'static str) -> Option<Light> {
            ctx.calls.push(format!("event {event}"));
            (event == "toggle").then_some(Light::On)
        }
    }

    fn machine() -> StateMachine<Light> {
        StateMachine::new(&[Light::Off, Light::On, Light::Blink], Light::Off)
    }

    #[test]
    fn test_goto_runs_exit_then_enter() {
        let mut fsm = machine();
        let mut log = Log::default();
        fsm.goto(&LightTable, &mut log, Light::Off);
        fsm.goto(&LightTable, &mut log, Light::On);

        assert_eq!(log.calls, vec!["enter Off", "exit Off", "enter On"]);
        assert!(fsm.is(Light::On));
        assert_eq!(fsm.epoch(), 2);
    }

    #[test]
    fn test_update_transitions_within_same_call() {
        let mut fsm = machine();
        let mut log = Log {
            auto_off: true,
            ..Log::default()
        };
        fsm.goto(&LightTable, &mut log, Light::On);
        fsm.update(&LightTable, &mut log);

        assert!(fsm.is(Light::Off));
        assert_eq!(log.calls, vec!["enter On", "update On", "exit On", "enter Off"]);
    }

    #[test]
    fn test_enter_chains_immediately() {
        let mut fsm = machine();
        let mut log = Log::default();
        fsm.goto(&LightTable, &mut log, Light::Blink);

        assert!(fsm.is(Light::Off));
        assert_eq!(fsm.epoch(), 2);
    }

    #[test]
    fn test_event_dispatch() {
        let mut fsm = machine();
        let mut log = Log::default();
        fsm.goto(&LightTable, &mut log, Light::Off);
        fsm.dispatch(&LightTable, &mut log, "toggle");
        assert!(fsm.is(Light::On));

        fsm.dispatch(&LightTable, &mut log, "noop");
        assert!(fsm.is(Light::On));
    }

    #[test]
    fn test_update_before_start_is_noop() {
        let mut fsm = machine();
        let mut log = Log::default();
        fsm.update(&LightTable, &mut log);
        assert!(log.calls.is_empty());
        assert_eq!(fsm.current(), None);
    }

    #[test]
    fn test_try_goto_undeclared_errors() {
        let mut fsm = machine();
        let mut log = Log::default();
        let err = fsm.try_goto(&LightTable, &mut log, Light::Broken).expect_err("undeclared");
        assert!(matches!(err, FsmError::UndeclaredState { machine: "light", .. }));
        assert_eq!(fsm.current(), None);
    }

    #[test]
    fn test_lenient_machine_falls_back() {
        let mut fsm = machine().with_strict(false);
        let mut log = Log::default();
        fsm.goto(&LightTable, &mut log, Light::On);
        fsm.goto(&LightTable, &mut log, Light::Broken);
        assert!(fsm.is(Light::Off));
    }

    #[test]
    #[should_panic(expected = "undeclared state")]
    fn test_strict_machine_fails_fast() {
        let mut fsm = machine().with_strict(true);
        let mut log = Log::default();
        fsm.goto(&LightTable, &mut log, Light::Broken);
    }
}
