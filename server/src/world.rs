//! Arena setup and the match clock
//!
//! The arena is a flat floor with a couple of cover walls, the enemy drop
//! ship, a jump pad and a man cannon. Player bots stand on the south side,
//! enemies spawn on the north side.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{
    AmmoType, CombatSim, GunType, Target, TargetId, TargetWorld, TriggerVolume, WeaponCatalog, WeaponId,
    FIXED_TIMESTEP_HZ,
};
use std::path::PathBuf;

use crate::persistence::{SavedStats, StatStore, STATS_VERSION};

/// Seconds the power-station ship keeps its hazard aura up.
pub const POWER_STATION_UPTIME: f32 = 20.0;

pub const ENEMY_SPAWN_Z: f32 = -30.0;

/// Server settings read from the environment.
#[derive(Resource, Clone, Debug)]
pub struct ArenaConfig {
    /// Optional RON weapon catalog (`ARENA_WEAPONS`)
    pub catalog_path: Option<PathBuf>,
    /// Match length in simulated seconds (`ARENA_DURATION_SECS`)
    pub duration_secs: f32,
    /// Where end-of-match ledgers go (`ARENA_STATS_DIR`)
    pub stats_dir: PathBuf,
    pub seed: u64,
    pub enemy_count: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            duration_secs: 60.0,
            stats_dir: PathBuf::from("arena_stats"),
            seed: 7,
            enemy_count: 6,
        }
    }
}

impl ArenaConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("ARENA_WEAPONS") {
            config.catalog_path = Some(PathBuf::from(path));
        }
        if let Ok(value) = std::env::var("ARENA_DURATION_SECS") {
            match value.parse::<f32>() {
                Ok(secs) if secs > 0.0 => config.duration_secs = secs,
                _ => warn!("Ignoring invalid ARENA_DURATION_SECS={:?}", value),
            }
        }
        if let Ok(dir) = std::env::var("ARENA_STATS_DIR") {
            config.stats_dir = PathBuf::from(dir);
        }
        config
    }

    /// The configured catalog, or the built-in tables when none is set or it fails to load.
    pub fn load_catalog(&self) -> WeaponCatalog {
        let Some(path) = &self.catalog_path else {
            return WeaponCatalog::default();
        };
        match WeaponCatalog::load_from_file(path) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("{}; falling back to built-in weapon tables", e);
                WeaponCatalog::default()
            }
        }
    }
}

/// A player character driven by the arena bot.
#[derive(Clone, Debug)]
pub struct PlayerBot {
    pub name: String,
    pub target: TargetId,
    pub weapon: WeaponId,
}

#[derive(Clone, Debug)]
pub struct EnemyBrain {
    pub target: TargetId,
    /// Seconds until the next swing may start
    pub swing_cooldown: f32,
    /// Seconds left in the current swing window
    pub swing_remaining: f32,
    pub dead_for: f32,
}

impl EnemyBrain {
    pub fn new(target: TargetId) -> Self {
        Self {
            target,
            swing_cooldown: 0.0,
            swing_remaining: 0.0,
            dead_for: 0.0,
        }
    }
}

/// Everyone in the arena, by role.
#[derive(Resource, Default)]
pub struct Roster {
    pub players: Vec<PlayerBot>,
    pub enemies: Vec<EnemyBrain>,
}

/// Server-side randomness (respawn jitter), seeded from `ArenaConfig::seed`
/// so a match replays identically.
#[derive(Resource)]
pub struct ArenaRng(pub StdRng);

impl ArenaRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

#[derive(Resource, Debug, Default)]
pub struct MatchClock {
    pub elapsed: f32,
    pub finished: bool,
}

/// Loadouts handed to the player bots, in spawn order.
pub const LOADOUTS: [(&str, GunType, AmmoType); 4] = [
    ("alpha", GunType::Pistol, AmmoType::Bullet),
    ("bravo", GunType::Shotgun, AmmoType::Piercing),
    ("charlie", GunType::Gatling, AmmoType::Chain),
    ("delta", GunType::SniperRifle, AmmoType::Grenade),
];

pub fn enemy_spawn_point(index: usize) -> Vec3 {
    let column = index % 6;
    Vec3::new(-10.0 + column as f32 * 4.0, 0.0, ENEMY_SPAWN_Z - (index / 6) as f32 * 3.0)
}

/// Build the combat sim and populate the arena.
pub fn setup_world(mut commands: Commands, config: Res<ArenaConfig>) {
    let catalog = config.load_catalog();
    let mut sim = CombatSim::new(catalog, TargetWorld::with_ground(0.0), config.seed);
    let mut roster = Roster::default();

    sim.spawn_target(Target::wall("cover_west", Vec3::new(-6.0, 1.0, -12.0), Vec3::new(1.5, 1.0, 0.5)));
    sim.spawn_target(Target::wall("cover_east", Vec3::new(6.0, 1.0, -12.0), Vec3::new(1.5, 1.0, 0.5)));
    sim.spawn_target(Target::spawner("drop_ship", Vec3::new(0.0, 6.0, -40.0), Vec3::new(4.0, 2.0, 3.0)));

    sim.add_jump_pad(
        TriggerVolume {
            center: Vec3::new(-14.0, 0.5, 4.0),
            half_extents: Vec3::new(1.0, 1.0, 1.0),
        },
        12.0,
        2.0,
    );
    sim.add_man_cannon(
        TriggerVolume {
            center: Vec3::new(14.0, 0.5, 4.0),
            half_extents: Vec3::new(1.0, 1.0, 1.0),
        },
        Vec3::new(0.0, 1.0, -1.0),
        18.0,
        0.5,
        4.0,
    );
    sim.set_power_station_active(true);

    for (index, (name, gun, ammo)) in LOADOUTS.iter().enumerate() {
        let position = Vec3::new(-4.5 + index as f32 * 3.0, 0.0, 0.0);
        let target = sim.spawn_target(Target::player(*name, position));
        match sim.equip_weapon(target, *gun, *ammo) {
            Ok(weapon) => roster.players.push(PlayerBot {
                name: name.to_string(),
                target,
                weapon,
            }),
            Err(e) => warn!("Failed to arm {}: {}", name, e),
        }
    }

    for index in 0..config.enemy_count {
        let target = sim.spawn_target(Target::enemy(format!("bot_{}", index), enemy_spawn_point(index)));
        roster.enemies.push(EnemyBrain::new(target));
    }

    info!(
        "Arena ready: {} players, {} enemies, {:.0}s match",
        roster.players.len(),
        roster.enemies.len(),
        config.duration_secs
    );
    commands.insert_resource(sim);
    commands.insert_resource(roster);
    // Separate stream from the sim rng.
    commands.insert_resource(ArenaRng::seeded(config.seed.wrapping_add(1)));
}

/// Advance the simulation one fixed tick.
pub fn tick_combat(mut sim: ResMut<CombatSim>, mut clock: ResMut<MatchClock>) {
    if clock.finished {
        return;
    }
    let dt = 1.0 / FIXED_TIMESTEP_HZ as f32;
    sim.tick(dt);
    clock.elapsed += dt;

    if sim.hazards().power_station_active && clock.elapsed >= POWER_STATION_UPTIME {
        sim.set_power_station_active(false);
    }
}

/// Save every ledger and stop the app once the match is over.
pub fn finish_match(
    sim: Res<CombatSim>,
    roster: Res<Roster>,
    config: Res<ArenaConfig>,
    mut clock: ResMut<MatchClock>,
    mut exit: MessageWriter<AppExit>,
) {
    if clock.finished || clock.elapsed < config.duration_secs {
        return;
    }
    clock.finished = true;

    let store = match StatStore::new(config.stats_dir.clone()) {
        Ok(store) => Some(store),
        Err(e) => {
            warn!("Stats will not be saved: {}", e);
            None
        }
    };

    for bot in &roster.players {
        let Some(ledger) = sim.ledger(bot.target) else {
            continue;
        };
        let summary: Vec<String> = ledger
            .summary()
            .iter()
            .map(|(label, value)| format!("{}: {}", label, value))
            .collect();
        info!("{} | {} | Accuracy: {:.2}", bot.name, summary.join(", "), ledger.accuracy());

        if let Some(store) = &store {
            let saved = SavedStats {
                version: STATS_VERSION,
                player_name: bot.name.clone(),
                match_seconds: clock.elapsed,
                ledger: ledger.clone(),
            };
            if let Err(e) = store.save(&saved) {
                warn!("Failed to save stats for {}: {}", bot.name, e);
            }
        }
    }

    info!("Match finished after {:.1}s", clock.elapsed);
    exit.write(AppExit::Success);
}
