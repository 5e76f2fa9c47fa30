//! Actor records paired with their behaviour.
//!
//! The simulation owns every [`Combatant`]; behaviour tables borrow the
//! actor for one call at a time through the context types, so there is no
//! reference from a machine back to its actor.

use corebreak_common::ActorId;

use crate::actor::{Actor, ActorKind};
use crate::boss::{BossCtx, BossMachine, BossPhase, BossState};
use crate::config::CombatConfig;
use crate::context::{Env, TargetInfo};
use crate::enemy::{EnemyCtx, EnemyMachine, EnemyMemory, EnemyState};
use crate::input::InputState;
use crate::player::{PlayerCtx, PlayerGear, PlayerMachine, PlayerState};
use crate::timer::TimerEvent;

/// Behaviour attached to an actor.
#[derive(Debug, Clone)]
pub enum Brain {
    /// Player controller
    Player {
        /// State machine
        machine: PlayerMachine,
        /// Equipment
        gear: PlayerGear,
    },
    /// One of the enemy archetypes
    Enemy {
        /// State machine
        machine: EnemyMachine,
        /// Scratch state
        memory: EnemyMemory,
    },
    /// Encounter boss
    Boss {
        /// State machine
        machine: BossMachine,
        /// Encounter state
        phase: BossPhase,
    },
}

/// Entry points a behaviour can be driven through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drive {
    /// Enter the initial state
    Start,
    /// Per-tick update
    Tick,
    /// Deliver a fired timer
    Timer(TimerEvent),
    /// Damage landed
    Hurt,
    /// Killing blow landed
    Die,
    /// Encounter started (boss only)
    Activate,
}

/// Read-only inputs shared by every behaviour during a tick.
#[derive(Debug, Clone, Copy)]
pub struct Shared<'a> {
    /// Tuning
    pub config: &'a CombatConfig,
    /// Player input
    pub input: &'a InputState,
    /// The player, if one exists
    pub target: Option<TargetInfo>,
}

/// An actor and its behaviour.
#[derive(Debug, Clone)]
pub struct Combatant {
    /// Actor record
    pub actor: Actor,
    /// Behaviour
    pub brain: Brain,
}

impl Combatant {
    /// Handle.
    #[must_use]
    pub fn id(&self) -> ActorId {
        self.actor.id
    }

    /// Actor kind.
    #[must_use]
    pub fn kind(&self) -> ActorKind {
        self.actor.kind
    }

    /// Transition epoch of the behaviour's machine.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        match &self.brain {
            Brain::Player { machine, .. } => machine.epoch(),
            Brain::Enemy { machine, .. } => machine.epoch(),
            Brain::Boss { machine, .. } => machine.epoch(),
        }
    }

    /// Player state, if this is the player.
    #[must_use]
    pub fn player_state(&self) -> Option<PlayerState> {
        match &self.brain {
            Brain::Player { machine, .. } => machine.state(),
            _ => None,
        }
    }

    /// Enemy state, if this is an enemy.
    #[must_use]
    pub fn enemy_state(&self) -> Option<EnemyState> {
        match &self.brain {
            Brain::Enemy { machine, .. } => machine.state(),
            _ => None,
        }
    }

    /// Boss state, if this is the boss.
    #[must_use]
    pub fn boss_state(&self) -> Option<BossState> {
        match &self.brain {
            Brain::Boss { machine, .. } => machine.state(),
            _ => None,
        }
    }

    /// Player equipment, if this is the player.
    #[must_use]
    pub fn gear(&self) -> Option<&PlayerGear> {
        match &self.brain {
            Brain::Player { gear, .. } => Some(gear),
            _ => None,
        }
    }

    /// Mutable player equipment, if this is the player.
    pub fn gear_mut(&mut self) -> Option<&mut PlayerGear> {
        match &mut self.brain {
            Brain::Player { gear, .. } => Some(gear),
            _ => None,
        }
    }

    /// Boss encounter state, if this is the boss.
    #[must_use]
    pub fn phase(&self) -> Option<&BossPhase> {
        match &self.brain {
            Brain::Boss { phase, .. } => Some(phase),
            _ => None,
        }
    }

    /// Snapshot other behaviours use to track this actor.
    #[must_use]
    pub fn target_info(&self) -> TargetInfo {
        TargetInfo {
            id: self.actor.id,
            position: self.actor.position,
            is_dead: self.actor.is_dead(),
        }
    }

    /// Whether body contact with the player hurts right now.
    #[must_use]
    pub fn deals_contact(&self) -> bool {
        if self.actor.is_dead() || self.actor.contact_damage <= 0.0 {
            return false;
        }
        match &self.brain {
            Brain::Player { .. } => false,
            Brain::Enemy { .. } => true,
            Brain::Boss { phase, .. } => phase.is_active,
        }
    }

    /// Runs one entry point of the behaviour against this actor.
    pub fn drive(&mut self, shared: &Shared<'_>, mut env: Env<'_>, drive: Drive) {
        let actor = &mut self.actor;
        match &mut self.brain {
            Brain::Player { machine, gear } => {
                let mut ctx = PlayerCtx {
                    actor,
                    gear,
                    input: shared.input,
                    tuning: &shared.config.player,
                    bullet: &shared.config.projectiles.player_bullet,
                    env: env.reborrow(),
                };
                match drive {
                    Drive::Start => machine.start(&mut ctx),
                    Drive::Tick => machine.tick(&mut ctx),
                    Drive::Timer(event) => machine.dispatch(&mut ctx, event),
                    Drive::Hurt => machine.hurt(&mut ctx),
                    Drive::Die => machine.die(&mut ctx),
                    Drive::Activate => {},
                }
            },
            Brain::Enemy { machine, memory } => {
                let mut ctx = EnemyCtx {
                    actor,
                    memory,
                    target: shared.target,
                    config: shared.config,
                    env: env.reborrow(),
                };
                match drive {
                    Drive::Start => machine.start(&mut ctx),
                    Drive::Tick => machine.tick(&mut ctx),
                    Drive::Timer(event) => machine.dispatch(&mut ctx, event),
                    Drive::Hurt => machine.hurt(&mut ctx),
                    Drive::Die => machine.die(&mut ctx),
                    Drive::Activate => {},
                }
            },
            Brain::Boss { machine, phase } => {
                let mut ctx = BossCtx {
                    actor,
                    phase,
                    target: shared.target,
                    tuning: &shared.config.boss,
                    env: env.reborrow(),
                };
                match drive {
                    Drive::Start => machine.start(&mut ctx),
                    Drive::Tick => machine.tick(&mut ctx),
                    Drive::Timer(event) => machine.dispatch(&mut ctx, event),
                    Drive::Hurt => machine.hurt(&mut ctx),
                    Drive::Die => machine.die(&mut ctx),
                    Drive::Activate => machine.activate(&mut ctx),
                }
            },
        }
    }
}
