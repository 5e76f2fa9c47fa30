//! Outbound notifications.
//!
//! The core reports gameplay facts through an [`EventSink`] (damage, kills,
//! pickups, level outcomes) and cosmetic requests through a
//! [`Presentation`] (animations, sounds, effects). Both are injected by the
//! host on every tick; nothing in the core reads them back.

use corebreak_common::{ActorId, Vec2};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::actor::ActorKind;
use crate::pickup::PickupKind;
use crate::projectile::LaserHeight;

// ============================================================================
// Gameplay events
// ============================================================================

/// Receiver of gameplay notifications.
pub trait EventSink {
    /// The player dealt `amount` damage (clamped to the target's remaining health).
    fn on_damage_dealt(&mut self, amount: f32);

    /// An actor of `kind` was killed.
    fn on_actor_killed(&mut self, kind: ActorKind);

    /// The player collected a pickup.
    fn on_pickup_collected(&mut self, kind: PickupKind);

    /// Every enemy of a level was defeated.
    fn on_level_completed(&mut self, level_id: &str);

    /// The boss encounter was won.
    fn on_encounter_completed(&mut self);

    /// The player died and the death sequence finished.
    fn on_level_failed(&mut self, _level_id: &str) {}

    /// The boss core opened or closed.
    fn on_boss_vulnerability(&mut self, _vulnerable: bool) {}
}

/// Gameplay notification as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// Damage dealt by the player
    DamageDealt {
        /// Amount actually removed from the target
        amount: f32,
    },
    /// Actor killed
    ActorKilled {
        /// Archetype of the victim
        kind: ActorKind,
    },
    /// Pickup collected
    PickupCollected {
        /// Pickup kind
        kind: PickupKind,
    },
    /// Level completed
    LevelCompleted {
        /// Level identifier
        level_id: String,
    },
    /// Boss encounter completed
    EncounterCompleted,
    /// Level failed
    LevelFailed {
        /// Level identifier
        level_id: String,
    },
    /// Boss vulnerability toggled
    BossVulnerability {
        /// Whether the core is exposed
        vulnerable: bool,
    },
}

/// Sink that keeps every event in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Vec<GameEvent>,
}

impl RecordingSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events in order.
    #[must_use]
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Number of kill notifications.
    #[must_use]
    pub fn kills(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, GameEvent::ActorKilled { .. }))
            .count()
    }

    /// Sum of damage notifications.
    #[must_use]
    pub fn total_damage(&self) -> f32 {
        self.events
            .iter()
            .filter_map(|e| match e {
                GameEvent::DamageDealt { amount } => Some(*amount),
                _ => None,
            })
            .sum()
    }

    /// Checks whether an event equal to `event` was recorded.
    #[must_use]
    pub fn contains(&self, event: &GameEvent) -> bool {
        self.events.contains(event)
    }

    /// Removes and returns all recorded events.
    pub fn take(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for RecordingSink {
    fn on_damage_dealt(&mut self, amount: f32) {
        self.events.push(GameEvent::DamageDealt { amount });
    }

    fn on_actor_killed(&mut self, kind: ActorKind) {
        self.events.push(GameEvent::ActorKilled { kind });
    }

    fn on_pickup_collected(&mut self, kind: PickupKind) {
        self.events.push(GameEvent::PickupCollected { kind });
    }

    fn on_level_completed(&mut self, level_id: &str) {
        self.events.push(GameEvent::LevelCompleted {
            level_id: level_id.to_string(),
        });
    }

    fn on_encounter_completed(&mut self) {
        self.events.push(GameEvent::EncounterCompleted);
    }

    fn on_level_failed(&mut self, level_id: &str) {
        self.events.push(GameEvent::LevelFailed {
            level_id: level_id.to_string(),
        });
    }

    fn on_boss_vulnerability(&mut self, vulnerable: bool) {
        self.events.push(GameEvent::BossVulnerability { vulnerable });
    }
}

/// Event bus for handing gameplay events to other threads.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<GameEvent>,
    receiver: Receiver<GameEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: GameEvent) {
        // Non-blocking send - if full, event is dropped
        if self.sender.try_send(event).is_err() {
            tracing::warn!(capacity = self.capacity, "event bus full, dropping event");
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a receiver handle for consuming events elsewhere.
    #[must_use]
    pub fn receiver(&self) -> Receiver<GameEvent> {
        self.receiver.clone()
    }
}

impl EventSink for EventBus {
    fn on_damage_dealt(&mut self, amount: f32) {
        self.publish(GameEvent::DamageDealt { amount });
    }

    fn on_actor_killed(&mut self, kind: ActorKind) {
        self.publish(GameEvent::ActorKilled { kind });
    }

    fn on_pickup_collected(&mut self, kind: PickupKind) {
        self.publish(GameEvent::PickupCollected { kind });
    }

    fn on_level_completed(&mut self, level_id: &str) {
        self.publish(GameEvent::LevelCompleted {
            level_id: level_id.to_string(),
        });
    }

    fn on_encounter_completed(&mut self) {
        self.publish(GameEvent::EncounterCompleted);
    }

    fn on_level_failed(&mut self, level_id: &str) {
        self.publish(GameEvent::LevelFailed {
            level_id: level_id.to_string(),
        });
    }

    fn on_boss_vulnerability(&mut self, vulnerable: bool) {
        self.publish(GameEvent::BossVulnerability { vulnerable });
    }
}

/// Forwards every event to two sinks.
pub struct Fanout<'a> {
    first: &'a mut dyn EventSink,
    second: &'a mut dyn EventSink,
}

impl<'a> Fanout<'a> {
    /// Combines two sinks.
    pub fn new(first: &'a mut dyn EventSink, second: &'a mut dyn EventSink) -> Self {
        Self { first, second }
    }
}

impl EventSink for Fanout<'_> {
    fn on_damage_dealt(&mut self, amount: f32) {
        self.first.on_damage_dealt(amount);
        self.second.on_damage_dealt(amount);
    }

    fn on_actor_killed(&mut self, kind: ActorKind) {
        self.first.on_actor_killed(kind);
        self.second.on_actor_killed(kind);
    }

    fn on_pickup_collected(&mut self, kind: PickupKind) {
        self.first.on_pickup_collected(kind);
        self.second.on_pickup_collected(kind);
    }

    fn on_level_completed(&mut self, level_id: &str) {
        self.first.on_level_completed(level_id);
        self.second.on_level_completed(level_id);
    }

    fn on_encounter_completed(&mut self) {
        self.first.on_encounter_completed();
        self.second.on_encounter_completed();
    }

    fn on_level_failed(&mut self, level_id: &str) {
        self.first.on_level_failed(level_id);
        self.second.on_level_failed(level_id);
    }

    fn on_boss_vulnerability(&mut self, vulnerable: bool) {
        self.first.on_boss_vulnerability(vulnerable);
        self.second.on_boss_vulnerability(vulnerable);
    }
}

// ============================================================================
// Presentation requests
// ============================================================================

/// Visual effects the core asks the host to show.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum EffectKind {
    /// Blood spray where an actor was hit
    Hit,
    /// Death burst
    Death,
    /// Camera shake
    CameraShake {
        /// Duration (ms)
        duration_ms: u64,
        /// Intensity
        intensity: f32,
    },
    /// Warning line for an upcoming boss laser
    LaserWarning {
        /// Announced beam height
        height: LaserHeight,
    },
    /// Boss core exposed
    CoreExposed,
    /// Boss core closed
    CoreHidden,
    /// Jetpack exhaust
    JetpackFlame,
}

/// Receiver of cosmetic requests.
pub trait Presentation {
    /// Play an animation on an actor.
    fn on_animation_request(&mut self, actor: ActorId, key: &'static str);

    /// Play a sound.
    fn on_sound_request(&mut self, key: &'static str);

    /// Show an effect at a position.
    fn on_effect_request(&mut self, kind: EffectKind, position: Vec2);
}

/// Presentation that ignores every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresentation;

impl Presentation for NullPresentation {
    fn on_animation_request(&mut self, _actor: ActorId, _key: &'static str) {}

    fn on_sound_request(&mut self, _key: &'static str) {}

    fn on_effect_request(&mut self, _kind: EffectKind, _position: Vec2) {}
}

/// A recorded presentation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum PresentationRequest {
    /// Animation
    Animation {
        /// Target actor
        actor: ActorId,
        /// Animation key
        key: String,
    },
    /// Sound
    Sound {
        /// Sound key
        key: String,
    },
    /// Effect
    Effect {
        /// Effect kind
        kind: EffectKind,
        /// World position
        position: [f32; 2],
    },
}

/// Presentation that records requests in order.
#[derive(Debug, Clone, Default)]
pub struct PresentationLog {
    requests: Vec<PresentationRequest>,
}

impl PresentationLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded requests.
    #[must_use]
    pub fn requests(&self) -> &[PresentationRequest] {
        &self.requests
    }

    /// Checks whether `actor` was asked to play `key`.
    #[must_use]
    pub fn played(&self, actor: ActorId, key: &str) -> bool {
        self.requests.iter().any(|r| {
            matches!(r, PresentationRequest::Animation { actor: a, key: k } if *a == actor && k == key)
        })
    }

    /// Removes and returns all recorded requests.
    pub fn take(&mut self) -> Vec<PresentationRequest> {
        std::mem::take(&mut self.requests)
    }
}

impl Presentation for PresentationLog {
    fn on_animation_request(&mut self, actor: ActorId, key: &'static str) {
        self.requests.push(PresentationRequest::Animation {
            actor,
            key: key.to_string(),
        });
    }

    fn on_sound_request(&mut self, key: &'static str) {
        self.requests.push(PresentationRequest::Sound {
            key: key.to_string(),
        });
    }

    fn on_effect_request(&mut self, kind: EffectKind, position: Vec2) {
        self.requests.push(PresentationRequest::Effect {
            kind,
            position: position.to_array(),
        });
    }
}

/// Requests raised outside a tick, held until the host's presentation is
/// available again.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Deferred {
    Animation(ActorId, &'static str),
    Sound(&'static str),
    Effect(EffectKind, Vec2),
}

/// Presentation that buffers requests and replays them in order.
#[derive(Debug, Clone, Default)]
pub(crate) struct DeferredPresentation {
    pending: Vec<Deferred>,
}

impl DeferredPresentation {
    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Forwards every buffered request to `fx`, oldest first.
    pub(crate) fn replay(&mut self, fx: &mut dyn Presentation) {
        for request in self.pending.drain(..) {
            match request {
                Deferred::Animation(actor, key) => fx.on_animation_request(actor, key),
                Deferred::Sound(key) => fx.on_sound_request(key),
                Deferred::Effect(kind, position) => fx.on_effect_request(kind, position),
            }
        }
    }
}

impl Presentation for DeferredPresentation {
    fn on_animation_request(&mut self, actor: ActorId, key: &'static str) {
        self.pending.push(Deferred::Animation(actor, key));
    }

    fn on_sound_request(&mut self, key: &'static str) {
        self.pending.push(Deferred::Sound(key));
    }

    fn on_effect_request(&mut self, kind: EffectKind, position: Vec2) {
        self.pending.push(Deferred::Effect(kind, position));
    }
}

// ============================================================================
// Internal signals
// ============================================================================

/// Outcomes raised by actor behaviours and forwarded to the sink by the
/// simulation at the end of the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The player's death sequence finished
    LevelFailed,
    /// The boss core opened or closed
    BossVulnerability(bool),
    /// The boss's death sequence finished
    EncounterCompleted,
}
