//! Combat resolution.
//!
//! Runs once per tick after every behaviour has updated and every zone has
//! moved. Each pass turns overlaps into hits:
//!
//! 1. body contact between the player and a hostile actor
//! 2. active melee zones against their candidate targets
//! 3. projectiles against actors of the opposing faction and level geometry
//! 4. the player against pickups
//!
//! Every hit goes through [`Scene::strike`], which applies damage and
//! knockback, reports to the sink and lets the victim's behaviour react.
//! Contact and melee may both land on the same pair in one tick; a single
//! melee activation never credits the same target twice.

use corebreak_common::ActorId;
use tracing::{debug, trace};

use crate::actor::{ActorKind, DamageOutcome};
use crate::combatant::{Brain, Combatant, Drive, Shared};
use crate::config::{CombatConfig, Knockback};
use crate::context::Env;
use crate::events::{EffectKind, EventSink};
use crate::pickup::Pickup;
use crate::projectile::{Faction, Projectile};

/// One hit about to be applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Damage before clamping to the victim's health
    pub damage: f32,
    /// Push applied to the victim
    pub knockback: Knockback,
    /// Horizontal position the victim is pushed away from
    pub source_x: f32,
    /// Dealt by the player or a player projectile
    pub by_player: bool,
}

/// Knockback an actor of `kind` deals with its body or melee.
#[must_use]
pub fn knockback_of(config: &CombatConfig, kind: ActorKind) -> Knockback {
    match kind {
        ActorKind::Player => config.player.melee_knockback,
        ActorKind::GroundMelee => config.ground_melee.hit_knockback,
        ActorKind::RangedCrawler => config.ranged_crawler.base.hit_knockback,
        ActorKind::FlyingSwooper => config.flying_swooper.base.hit_knockback,
        ActorKind::Boss => config.boss.contact_knockback,
    }
}

/// Everything combat resolution mutates during one tick.
pub struct Scene<'a> {
    /// Live actors
    pub roster: &'a mut [Combatant],
    /// Projectiles in flight
    pub projectiles: &'a mut Vec<Projectile>,
    /// Pickups lying in the level
    pub pickups: &'a mut Vec<Pickup>,
    /// Tuning, input and player snapshot for reactions
    pub shared: Shared<'a>,
    /// Shared collaborators
    pub env: Env<'a>,
    /// Gameplay notifications
    pub sink: &'a mut dyn EventSink,
}

impl Scene<'_> {
    /// Runs every resolution pass.
    pub fn resolve(&mut self) {
        let Some(player) = self
            .roster
            .iter()
            .position(|c| c.kind() == ActorKind::Player)
        else {
            return;
        };
        self.contact(player);
        self.melee(player);
        self.projectiles(player);
        self.pickups(player);
    }

    /// Applies `hit` to the combatant at `target` and lets it react.
    pub fn strike(&mut self, target: usize, hit: Hit) -> DamageOutcome {
        let shared = self.shared;
        let Some(victim) = self.roster.get_mut(target) else {
            return DamageOutcome::Ignored;
        };
        let outcome = victim.actor.take_damage(hit.damage);
        if !outcome.landed() {
            return outcome;
        }

        let kind = victim.kind();
        if kind != ActorKind::Boss {
            victim.actor.knock_back(hit.source_x, hit.knockback);
        }
        self.env.effect(EffectKind::Hit, victim.actor.body().center());
        if hit.by_player {
            self.sink.on_damage_dealt(outcome.dealt());
        }

        let drive = match outcome {
            DamageOutcome::Killed { .. } => {
                if kind != ActorKind::Player {
                    self.sink.on_actor_killed(kind);
                }
                Drive::Die
            },
            _ => Drive::Hurt,
        };
        victim.drive(&shared, self.env.reborrow(), drive);
        outcome
    }

    fn refuel(&mut self, player: usize) {
        let tuning = &self.shared.config.player;
        if let Some(gear) = self.roster.get_mut(player).and_then(Combatant::gear_mut) {
            gear.refuel(tuning);
        }
    }

    fn contact(&mut self, player: usize) {
        for source in 0..self.roster.len() {
            if source == player || !self.roster[source].deals_contact() {
                continue;
            }
            let toucher = &self.roster[source].actor;
            let victim = &self.roster[player].actor;
            if !victim.accepts_damage() || !victim.body().overlaps(&toucher.body()) {
                continue;
            }
            trace!(source = %toucher.id, "contact");
            let hit = Hit {
                damage: toucher.contact_damage,
                knockback: knockback_of(self.shared.config, toucher.kind),
                source_x: toucher.position.x,
                by_player: false,
            };
            self.strike(player, hit);
        }
    }

    /// Indices a zone owned by `owner` may hit.
    fn melee_candidates(&self, owner: usize, player: usize) -> Vec<usize> {
        if owner == player {
            (0..self.roster.len())
                .filter(|&i| i != player && self.roster[i].kind().is_hostile())
                .collect()
        } else {
            vec![player]
        }
    }

    fn melee(&mut self, player: usize) {
        for owner in 0..self.roster.len() {
            let Some(area) = self.roster[owner].actor.active_zone() else {
                continue;
            };
            for target in self.melee_candidates(owner, player) {
                let attacker = &self.roster[owner].actor;
                let victim = &self.roster[target].actor;
                let already = attacker
                    .zone
                    .as_ref()
                    .is_some_and(|z| z.has_credited(victim.id));
                if already || !victim.accepts_damage() || !area.overlaps(&victim.body()) {
                    continue;
                }

                let victim_id = victim.id;
                let victim_kind = victim.kind;
                let hit = Hit {
                    damage: attacker.attack_damage,
                    knockback: knockback_of(self.shared.config, attacker.kind),
                    source_x: attacker.position.x,
                    by_player: owner == player,
                };
                if let Some(zone) = self.roster[owner].actor.zone.as_mut() {
                    zone.credit(victim_id);
                }
                debug!(attacker = %self.roster[owner].id(), victim = %victim_id, "melee hit");
                let outcome = self.strike(target, hit);
                if outcome.landed() && owner == player && victim_kind == ActorKind::Boss {
                    self.refuel(player);
                }
            }
        }
    }

    /// First living actor on the opposing side of `faction` touching `index`'s projectile.
    fn projectile_target(&self, index: usize, player: usize) -> Option<usize> {
        let projectile = &self.projectiles[index];
        let area = projectile.bounds();
        match projectile.faction() {
            Faction::Player => self.roster.iter().enumerate().position(|(i, c)| {
                i != player
                    && c.kind().is_hostile()
                    && !c.actor.is_dead()
                    && c.actor.body().overlaps(&area)
            }),
            Faction::Hostile => {
                let victim = &self.roster[player].actor;
                (victim.accepts_damage() && victim.body().overlaps(&area)).then_some(player)
            },
        }
    }

    fn projectiles(&mut self, player: usize) {
        let mut index = 0;
        while index < self.projectiles.len() {
            let destroyed = match self.projectile_target(index, player) {
                Some(target) => {
                    let projectile = &self.projectiles[index];
                    let hit = Hit {
                        damage: projectile.body.damage,
                        knockback: projectile.body.knockback,
                        source_x: projectile.position().x,
                        by_player: projectile.faction() == Faction::Player,
                    };
                    // A shielded boss stops player projectiles without taking damage.
                    if self.roster[target].actor.accepts_damage() {
                        let outcome = self.strike(target, hit);
                        if outcome.landed()
                            && hit.by_player
                            && self.roster[target].kind() == ActorKind::Boss
                        {
                            self.refuel(player);
                        }
                    }
                    true
                },
                None => {
                    let projectile = &self.projectiles[index];
                    !projectile.kind().is_hazard() && self.env.world.is_solid(projectile.position())
                },
            };
            if destroyed {
                let gone = self.projectiles.remove(index);
                trace!(projectile = %gone.id, "projectile destroyed");
            } else {
                index += 1;
            }
        }
    }

    fn pickups(&mut self, player: usize) {
        let config = self.shared.config;
        let Some(combatant) = self.roster.get_mut(player) else {
            return;
        };
        if combatant.actor.is_dead() {
            return;
        }
        let body = combatant.actor.body();
        let mut index = 0;
        while index < self.pickups.len() {
            if !self.pickups[index].bounds().overlaps(&body) {
                index += 1;
                continue;
            }
            let pickup = self.pickups.remove(index);
            if let Brain::Player { gear, .. } = &mut combatant.brain {
                gear.collect(
                    &mut combatant.actor,
                    pickup.kind,
                    &config.player,
                    config.pickups.health_amount,
                );
            }
            debug!(pickup = %pickup.id, kind = ?pickup.kind, "pickup collected");
            self.env.sound(pickup.kind.sound_key());
            self.sink.on_pickup_collected(pickup.kind);
        }
    }
}

/// Handle of the first actor of `kind` in `roster`.
#[must_use]
pub fn find_kind(roster: &[Combatant], kind: ActorKind) -> Option<ActorId> {
    roster.iter().find(|c| c.kind() == kind).map(Combatant::id)
}
