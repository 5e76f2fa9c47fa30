//! Combat tuning.
//!
//! Every number the actors use lives here so a host can rebalance without
//! touching the behaviours. Tuning is plain TOML; missing keys take their
//! defaults, so a file only needs the values it changes.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use corebreak_common::{scale_duration, Millis};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Errors raised while loading tuning files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("config I/O error: {0}")]
    Io(#[from] io::Error),
    /// File is not valid tuning TOML
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

// ============================================================================
// Shared pieces
// ============================================================================

/// Velocity applied to an actor that gets hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Knockback {
    /// Horizontal speed away from the source (px/s)
    pub horizontal: f32,
    /// Vertical speed (px/s, negative is up). `None` keeps the current value.
    #[serde(default)]
    pub vertical: Option<f32>,
}

impl Knockback {
    /// Knockback with both components.
    #[must_use]
    pub const fn new(horizontal: f32, vertical: f32) -> Self {
        Self {
            horizontal,
            vertical: Some(vertical),
        }
    }

    /// Knockback that only pushes sideways.
    #[must_use]
    pub const fn horizontal(horizontal: f32) -> Self {
        Self {
            horizontal,
            vertical: None,
        }
    }
}

/// Straight-flying projectile parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileSpec {
    /// Damage on hit
    pub damage: f32,
    /// Speed (px/s)
    pub speed: f32,
    /// Time to live (ms)
    pub lifetime_ms: Millis,
    /// Half width of the hit box
    pub half_width: f32,
    /// Half height of the hit box
    pub half_height: f32,
    /// Distance past the level bounds before the projectile is culled
    pub cull_margin: f32,
    /// Knockback applied to the target
    pub knockback: Knockback,
}

impl Default for ProjectileSpec {
    fn default() -> Self {
        Self {
            damage: 25.0,
            speed: 600.0,
            lifetime_ms: 2000,
            half_width: 8.0,
            half_height: 4.0,
            cull_margin: 50.0,
            knockback: Knockback::horizontal(150.0),
        }
    }
}

// ============================================================================
// Player
// ============================================================================

/// Jetpack parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JetpackTuning {
    /// Full tank
    pub fuel_capacity: f32,
    /// Fuel burned per second of thrust
    pub drain_per_sec: f32,
    /// Fuel regained per second while grounded
    pub recharge_per_sec: f32,
    /// Upward acceleration while thrusting (px/s^2)
    pub thrust: f32,
    /// Maximum rise speed from thrust (px/s)
    pub max_rise_speed: f32,
}

impl Default for JetpackTuning {
    fn default() -> Self {
        Self {
            fuel_capacity: 100.0,
            drain_per_sec: 60.0,
            recharge_per_sec: 30.0,
            thrust: 3000.0,
            max_rise_speed: 300.0,
        }
    }
}

/// Player parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Body width
    pub body_width: f32,
    /// Standing body height
    pub body_height: f32,
    /// Body height multiplier while ducking
    pub duck_height_factor: f32,
    /// Horizontal speed (px/s)
    pub walk_speed: f32,
    /// Jump launch speed (px/s)
    pub jump_power: f32,
    /// Gravity (px/s^2)
    pub gravity: f32,
    /// Starting and maximum health
    pub max_health: f32,
    /// Melee damage
    pub attack_damage: f32,
    /// Melee reach in front of the body
    pub attack_range: f32,
    /// Melee zone height
    pub attack_width: f32,
    /// Melee swing duration (ms)
    pub attack_duration_ms: Millis,
    /// Input lock after taking damage (ms)
    pub hurt_duration_ms: Millis,
    /// Damage immunity after taking damage (ms)
    pub invulnerable_ms: Millis,
    /// Death animation duration before the level fails (ms)
    pub death_duration_ms: Millis,
    /// Distance below the level bottom that counts as a fatal fall
    pub fall_death_margin: f32,
    /// Knockback dealt to enemies by melee
    pub melee_knockback: Knockback,
    /// Minimum time between shots (ms)
    pub fire_cooldown_ms: Millis,
    /// Horizontal muzzle offset from the body center
    pub muzzle_offset: f32,
    /// Jetpack
    pub jetpack: JetpackTuning,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            body_width: 40.0,
            body_height: 128.0,
            duck_height_factor: 0.5,
            walk_speed: 200.0,
            jump_power: 600.0,
            gravity: 1200.0,
            max_health: 100.0,
            attack_damage: 40.0,
            attack_range: 80.0,
            attack_width: 100.0,
            attack_duration_ms: 400,
            hurt_duration_ms: 500,
            invulnerable_ms: 1000,
            death_duration_ms: 1000,
            fall_death_margin: 100.0,
            melee_knockback: Knockback::new(150.0, -100.0),
            fire_cooldown_ms: 300,
            muzzle_offset: 30.0,
            jetpack: JetpackTuning::default(),
        }
    }
}

// ============================================================================
// Enemies
// ============================================================================

/// Parameters shared by every enemy archetype.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    /// Body width
    pub body_width: f32,
    /// Body height
    pub body_height: f32,
    /// Gravity (px/s^2), zero for fliers
    pub gravity: f32,
    /// Patrol speed (px/s)
    pub walk_speed: f32,
    /// Chase speed relative to patrol speed
    pub chase_multiplier: f32,
    /// Distance at which the player is noticed
    pub detection_range: f32,
    /// Chase is abandoned beyond `detection_range` times this
    pub lose_interest_multiplier: f32,
    /// Melee damage
    pub attack_damage: f32,
    /// Melee reach
    pub attack_range: f32,
    /// Melee zone height
    pub attack_width: f32,
    /// Melee starts within `attack_range` times this
    pub attack_trigger_multiplier: f32,
    /// Minimum time between melee attacks (ms)
    pub attack_cooldown_ms: Millis,
    /// Melee swing duration (ms)
    pub attack_duration_ms: Millis,
    /// Damage dealt by touching the player
    pub contact_damage: f32,
    /// Knockback dealt to the player by touch or melee
    pub hit_knockback: Knockback,
    /// Starting and maximum health
    pub max_health: f32,
    /// Stun after taking damage (ms)
    pub stun_ms: Millis,
    /// Death animation duration before reaping (ms)
    pub death_ms: Millis,
    /// Minimum time between turns (ms)
    pub turn_delay_ms: Millis,
    /// Random patrol direction changes per second
    pub patrol_flip_rate: f32,
    /// How far past the leading edge to look for ground
    pub cliff_lookahead: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            body_width: 60.0,
            body_height: 60.0,
            gravity: 1200.0,
            walk_speed: 60.0,
            chase_multiplier: 1.2,
            detection_range: 300.0,
            lose_interest_multiplier: 1.5,
            attack_damage: 20.0,
            attack_range: 60.0,
            attack_width: 60.0,
            attack_trigger_multiplier: 1.5,
            attack_cooldown_ms: 1500,
            attack_duration_ms: 500,
            contact_damage: 15.0,
            hit_knockback: Knockback::new(200.0, -150.0),
            max_health: 100.0,
            stun_ms: 200,
            death_ms: 800,
            turn_delay_ms: 1000,
            patrol_flip_rate: 0.5,
            cliff_lookahead: 32.0,
        }
    }
}

impl EnemyTuning {
    /// Chase speed (px/s).
    #[must_use]
    pub fn chase_speed(&self) -> f32 {
        self.walk_speed * self.chase_multiplier
    }

    /// Distance beyond which a chase is abandoned.
    #[must_use]
    pub fn lose_interest_range(&self) -> f32 {
        self.detection_range * self.lose_interest_multiplier
    }

    /// Distance within which a melee attack may start.
    #[must_use]
    pub fn attack_trigger_range(&self) -> f32 {
        self.attack_range * self.attack_trigger_multiplier
    }
}

/// Ranged crawler parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerTuning {
    /// Shared enemy parameters
    pub base: EnemyTuning,
    /// Maximum distance for the eye laser
    pub ranged_range: f32,
    /// Minimum time between eye lasers (ms)
    pub ranged_cooldown_ms: Millis,
    /// Horizontal eye offset from the feet, along facing
    pub eye_offset: f32,
    /// Eye height as a fraction of body height
    pub eye_height_fraction: f32,
    /// Lunge speed (px/s)
    pub lunge_speed: f32,
    /// Lunge hop speed (px/s, upward)
    pub lunge_hop: f32,
}

impl Default for CrawlerTuning {
    fn default() -> Self {
        Self {
            base: EnemyTuning {
                body_width: 80.0,
                body_height: 50.0,
                walk_speed: 40.0,
                chase_multiplier: 1.0,
                detection_range: 240.0,
                attack_damage: 24.0,
                attack_range: 70.0,
                attack_width: 80.0,
                attack_trigger_multiplier: 1.0,
                attack_cooldown_ms: 2250,
                attack_duration_ms: 600,
                contact_damage: 18.0,
                max_health: 150.0,
                stun_ms: 300,
                turn_delay_ms: 1500,
                patrol_flip_rate: 0.0,
                ..EnemyTuning::default()
            },
            ranged_range: 400.0,
            ranged_cooldown_ms: 2500,
            eye_offset: 10.0,
            eye_height_fraction: 0.85,
            lunge_speed: 200.0,
            lunge_hop: 100.0,
        }
    }
}

/// Flying swooper parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwooperTuning {
    /// Shared enemy parameters; `walk_speed` is the flying speed
    pub base: EnemyTuning,
    /// Hover amplitude around the home height
    pub hover_amplitude: f32,
    /// Hover phase speed (rad/s)
    pub hover_rate: f32,
    /// Swoop speed relative to flying speed
    pub swoop_multiplier: f32,
    /// Chase aims this far above the player's feet
    pub aim_offset_y: f32,
    /// Home height counts as reached within this distance
    pub home_tolerance: f32,
    /// Downward speed when shot out of the air (px/s)
    pub death_fall_speed: f32,
    /// Gravity while falling dead (px/s^2)
    pub death_gravity: f32,
}

impl Default for SwooperTuning {
    fn default() -> Self {
        Self {
            base: EnemyTuning {
                body_width: 48.0,
                body_height: 40.0,
                gravity: 0.0,
                walk_speed: 80.0,
                chase_multiplier: 1.0,
                detection_range: 300.0,
                attack_damage: 16.0,
                attack_range: 80.0,
                attack_width: 60.0,
                attack_trigger_multiplier: 1.0,
                attack_duration_ms: 500,
                contact_damage: 15.0,
                max_health: 70.0,
                patrol_flip_rate: 0.0,
                ..EnemyTuning::default()
            },
            hover_amplitude: 20.0,
            hover_rate: 3.0,
            swoop_multiplier: 2.0,
            aim_offset_y: 30.0,
            home_tolerance: 10.0,
            death_fall_speed: 100.0,
            death_gravity: 1200.0,
        }
    }
}

// ============================================================================
// Boss
// ============================================================================

/// Boss attack moves, cycled from idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossMove {
    /// Ground slam releasing shockwaves
    Slam,
    /// Sequence of arena-wide laser beams
    Laser,
    /// Exposed core; the only window in which the boss takes damage
    Vulnerable,
}

/// Ground slam parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlamTuning {
    /// Delay until the shockwaves spawn (ms)
    pub impact_ms: Millis,
    /// Delay until the boss returns to idle (ms)
    pub recover_ms: Millis,
    /// Horizontal spawn distance from the boss
    pub spawn_offset: f32,
    /// Shockwave width
    pub width: f32,
    /// Shockwave height
    pub height: f32,
    /// Base shockwave speed, scaled by enrage (px/s)
    pub speed: f32,
    /// Shockwave damage
    pub damage: f32,
    /// Shockwave lifetime (ms)
    pub lifetime_ms: Millis,
    /// Knockback applied to the player
    pub knockback: Knockback,
}

impl Default for SlamTuning {
    fn default() -> Self {
        Self {
            impact_ms: 300,
            recover_ms: 1000,
            spawn_offset: 100.0,
            width: 200.0,
            height: 80.0,
            speed: 400.0,
            damage: 25.0,
            lifetime_ms: 2000,
            knockback: Knockback::new(250.0, -150.0),
        }
    }
}

/// Laser sequence parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaserTuning {
    /// Beams per sequence
    pub count: u32,
    /// Beams per sequence above `enraged_above`
    pub enraged_count: u32,
    /// Enrage multiplier above which `enraged_count` applies
    pub enraged_above: f32,
    /// Time between beam announcements (ms)
    pub spacing_ms: Millis,
    /// Time from announcement to beam (ms)
    pub warning_ms: Millis,
    /// Extra time after the last announcement slot before idling (ms)
    pub tail_ms: Millis,
    /// Beam thickness
    pub beam_height: f32,
    /// Beam damage
    pub damage: f32,
    /// Beam lifetime (ms)
    pub beam_ms: Millis,
    /// Beam heights above the boss's feet
    pub low: f32,
    /// Mid beam height
    pub mid: f32,
    /// High beam height
    pub high: f32,
    /// Knockback applied to the player
    pub knockback: Knockback,
}

impl Default for LaserTuning {
    fn default() -> Self {
        Self {
            count: 2,
            enraged_count: 3,
            enraged_above: 1.25,
            spacing_ms: 800,
            warning_ms: 1800,
            tail_ms: 600,
            beam_height: 30.0,
            damage: 20.0,
            beam_ms: 400,
            low: 40.0,
            mid: 100.0,
            high: 180.0,
            knockback: Knockback::new(250.0, -150.0),
        }
    }
}

impl LaserTuning {
    /// Number of beams for an enrage multiplier.
    #[must_use]
    pub fn beams(&self, enrage: f32) -> u32 {
        if enrage > self.enraged_above {
            self.enraged_count
        } else {
            self.count
        }
    }

    /// Duration of the whole laser state for `beams` beams.
    #[must_use]
    pub fn sequence_ms(&self, beams: u32) -> Millis {
        Millis::from(beams) * self.spacing_ms + self.tail_ms
    }
}

/// A health threshold below which the boss enrages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnrageStep {
    /// Health fraction strictly below which this step applies
    pub below: f32,
    /// Multiplier for speeds, divisor for cooldowns
    pub multiplier: f32,
}

/// Boss parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    /// Body width
    pub body_width: f32,
    /// Body height
    pub body_height: f32,
    /// Starting and maximum health
    pub max_health: f32,
    /// Damage dealt by touching the player
    pub contact_damage: f32,
    /// Knockback dealt to the player by touch
    pub contact_knockback: Knockback,
    /// Attack cycle, repeated from the start
    pub pattern: Vec<BossMove>,
    /// Intro duration (ms)
    pub intro_ms: Millis,
    /// Idle cooldown before the next move, divided by enrage (ms)
    pub idle_cooldown_ms: Millis,
    /// Vulnerability window, divided by enrage (ms)
    pub vulnerable_ms: Millis,
    /// Death duration before the encounter completes (ms)
    pub death_ms: Millis,
    /// Walking speed (px/s)
    pub move_speed: f32,
    /// Distance the boss keeps from the player
    pub keep_distance: f32,
    /// Movement stops within this distance of the target
    pub arrive_tolerance: f32,
    /// Inset of the walking lane from the arena edges
    pub lane_inset: f32,
    /// Hazards are culled this far outside the arena
    pub hazard_cull_margin: f32,
    /// Ground slam
    pub slam: SlamTuning,
    /// Laser sequence
    pub laser: LaserTuning,
    /// Enrage thresholds
    pub enrage: Vec<EnrageStep>,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            body_width: 160.0,
            body_height: 384.0,
            max_health: 300.0,
            contact_damage: 15.0,
            contact_knockback: Knockback::new(300.0, -200.0),
            pattern: vec![BossMove::Slam, BossMove::Laser, BossMove::Vulnerable],
            intro_ms: 2000,
            idle_cooldown_ms: 3000,
            vulnerable_ms: 4000,
            death_ms: 1500,
            move_speed: 80.0,
            keep_distance: 200.0,
            arrive_tolerance: 10.0,
            lane_inset: 300.0,
            hazard_cull_margin: 100.0,
            slam: SlamTuning::default(),
            laser: LaserTuning::default(),
            enrage: vec![
                EnrageStep {
                    below: 0.3,
                    multiplier: 1.5,
                },
                EnrageStep {
                    below: 0.6,
                    multiplier: 1.25,
                },
            ],
        }
    }
}

impl BossTuning {
    /// Enrage multiplier for a health fraction, ignoring history.
    #[must_use]
    pub fn enrage_for(&self, health_fraction: f32) -> f32 {
        self.enrage
            .iter()
            .filter(|step| health_fraction < step.below)
            .map(|step| step.multiplier)
            .fold(1.0, f32::max)
    }

    /// Idle cooldown under `enrage`.
    #[must_use]
    pub fn idle_cooldown(&self, enrage: f32) -> Millis {
        scale_duration(self.idle_cooldown_ms, enrage)
    }

    /// Vulnerability window under `enrage`.
    #[must_use]
    pub fn vulnerable_window(&self, enrage: f32) -> Millis {
        scale_duration(self.vulnerable_ms, enrage)
    }
}

// ============================================================================
// Projectiles and pickups
// ============================================================================

/// Parameters for straight-flying projectiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Player gun bullet
    pub player_bullet: ProjectileSpec,
    /// Crawler eye laser
    pub eye_laser: ProjectileSpec,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            player_bullet: ProjectileSpec::default(),
            eye_laser: ProjectileSpec {
                damage: 15.0,
                speed: 350.0,
                lifetime_ms: 3000,
                ..ProjectileSpec::default()
            },
        }
    }
}

/// Pickup parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupTuning {
    /// Health restored by a health pickup
    pub health_amount: f32,
    /// Pickup box size
    pub size: f32,
}

impl Default for PickupTuning {
    fn default() -> Self {
        Self {
            health_amount: 30.0,
            size: 40.0,
        }
    }
}

// ============================================================================
// Root
// ============================================================================

/// All combat tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Player
    pub player: PlayerTuning,
    /// Ground melee enemy
    pub ground_melee: EnemyTuning,
    /// Ranged crawler enemy
    pub ranged_crawler: CrawlerTuning,
    /// Flying swooper enemy
    pub flying_swooper: SwooperTuning,
    /// Boss
    pub boss: BossTuning,
    /// Projectiles
    pub projectiles: ProjectileTuning,
    /// Pickups
    pub pickups: PickupTuning,
    /// Maximum falling speed (px/s)
    pub terminal_velocity: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            player: PlayerTuning::default(),
            ground_melee: EnemyTuning::default(),
            ranged_crawler: CrawlerTuning::default(),
            flying_swooper: SwooperTuning::default(),
            boss: BossTuning::default(),
            projectiles: ProjectileTuning::default(),
            pickups: PickupTuning::default(),
            terminal_velocity: DEFAULT_TERMINAL_VELOCITY,
        }
    }
}

impl CombatConfig {
    /// Parses tuning from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(contents)?;
        config.validate();
        Ok(config)
    }

    /// Loads tuning from `path`, reporting any failure.
    pub fn try_load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut contents = String::new();
        fs::File::open(path.as_ref())?.read_to_string(&mut contents)?;
        Self::from_toml_str(&contents)
    }

    /// Loads tuning from `path`.
    /// Returns defaults if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Tuning file not found, using defaults");
            return Self::default();
        }

        match Self::try_load_from(path) {
            Ok(config) => {
                info!("Loaded tuning from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to load tuning file: {e}");
                Self::default()
            },
        }
    }

    /// Saves tuning to `path`.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved tuning to {}", path.display());
        Ok(())
    }

    /// Clamps values to ranges the behaviours can work with.
    pub fn validate(&mut self) {
        let p = &mut self.player;
        p.max_health = p.max_health.max(1.0);
        p.duck_height_factor = p.duck_height_factor.clamp(0.1, 1.0);
        p.walk_speed = p.walk_speed.max(0.0);
        p.attack_damage = p.attack_damage.max(0.0);
        p.jetpack.fuel_capacity = p.jetpack.fuel_capacity.max(0.0);

        for enemy in [
            &mut self.ground_melee,
            &mut self.ranged_crawler.base,
            &mut self.flying_swooper.base,
        ] {
            enemy.max_health = enemy.max_health.max(1.0);
            enemy.walk_speed = enemy.walk_speed.max(0.0);
            enemy.detection_range = enemy.detection_range.max(0.0);
            enemy.lose_interest_multiplier = enemy.lose_interest_multiplier.max(1.0);
            enemy.patrol_flip_rate = enemy.patrol_flip_rate.max(0.0);
        }

        let b = &mut self.boss;
        b.max_health = b.max_health.max(1.0);
        if b.pattern.is_empty() {
            warn!("Boss pattern is empty, restoring default cycle");
            b.pattern = BossTuning::default().pattern;
        }
        for step in &mut b.enrage {
            step.multiplier = step.multiplier.max(1.0);
        }
        b.laser.count = b.laser.count.max(1);
        b.laser.enraged_count = b.laser.enraged_count.max(1);

        if self.terminal_velocity <= 0.0 {
            self.terminal_velocity = DEFAULT_TERMINAL_VELOCITY;
        }
    }
}

const DEFAULT_TERMINAL_VELOCITY: f32 = 1000.0;
