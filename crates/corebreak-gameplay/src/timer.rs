//! Deferred transitions on the simulated clock.
//!
//! Actors schedule timers instead of sleeping. A timer belongs to an owner
//! actor and is either bound to the state that scheduled it (it is dropped
//! if the owner has transitioned since) or to the actor itself (it fires
//! regardless of later transitions). Timers fire in due-time order, ties in
//! scheduling order.

use corebreak_common::{ActorId, Millis, TimerId};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::projectile::LaserHeight;

/// What a timer delivers back into its owner's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerEvent {
    /// Attack animation finished
    AttackFinished,
    /// Stun window after taking damage finished
    StunFinished,
    /// Death animation finished, actor may be reaped
    DeathFinished,
    /// Post-hit invulnerability window ended
    InvulnerabilityExpired,
    /// Boss intro finished
    IntroFinished,
    /// Boss idle cooldown elapsed
    CooldownElapsed,
    /// Boss slam connects with the ground
    SlamImpact,
    /// Boss slam recovery finished
    SlamFinished,
    /// Boss announces the next laser beam
    LaserWarning,
    /// Boss laser beam fires at an announced height
    LaserFire(LaserHeight),
    /// Boss laser sequence finished
    LaserFinished,
    /// Boss vulnerability window closed
    VulnerableExpired,
}

/// Validity rule for a pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerScope {
    /// Valid only while the owner's machine is still at this epoch
    State(u64),
    /// Valid until the owner dies or is reaped
    Actor,
}

/// A pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    /// Handle of this timer
    pub id: TimerId,
    /// Actor whose machine receives the event
    pub owner: ActorId,
    /// Simulated time at which it fires
    pub due: Millis,
    /// Validity rule
    pub scope: TimerScope,
    /// Event delivered on fire
    pub event: TimerEvent,
}

impl Timer {
    /// Checks whether the timer still applies to a machine at `epoch`.
    #[must_use]
    pub fn is_current(&self, epoch: u64) -> bool {
        match self.scope {
            TimerScope::State(scheduled) => scheduled == epoch,
            TimerScope::Actor => true,
        }
    }
}

/// Timer queue for one simulation.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    pending: Vec<Timer>,
    next_id: u64,
}

impl Scheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `event` for `owner`, due `delay` after `now`.
    pub fn schedule(
        &mut self,
        owner: ActorId,
        now: Millis,
        delay: Millis,
        scope: TimerScope,
        event: TimerEvent,
    ) -> TimerId {
        self.next_id += 1;
        let id = TimerId::from_raw(self.next_id);
        let due = now.saturating_add(delay);
        trace!(%owner, %id, due, ?event, ?scope, "timer scheduled");
        self.pending.push(Timer {
            id,
            owner,
            due,
            scope,
            event,
        });
        id
    }

    /// Cancels a single timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.id != id);
        self.pending.len() != before
    }

    /// Cancels every pending timer of `owner`, returning how many were dropped.
    pub fn cancel_owner(&mut self, owner: ActorId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|t| t.owner != owner);
        let cancelled = before - self.pending.len();
        if cancelled > 0 {
            trace!(%owner, cancelled, "timers cancelled");
        }
        cancelled
    }

    /// Number of pending timers owned by `owner`.
    #[must_use]
    pub fn pending_for(&self, owner: ActorId) -> usize {
        self.pending.iter().filter(|t| t.owner == owner).count()
    }

    /// Total number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Checks whether no timers are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Removes and returns the earliest timer due at or before `now`.
    ///
    /// Popping one at a time lets a fired timer schedule or cancel others
    /// before the next one is considered.
    pub fn pop_due(&mut self, now: Millis) -> Option<Timer> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by_key(|(_, t)| (t.due, t.id))
            .map(|(i, _)| i)?;
        Some(self.pending.remove(index))
    }
}
