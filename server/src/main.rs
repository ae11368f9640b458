//! Arena Server - Headless Bevy app that runs a bot-vs-bot combat match
//!
//! All combat rules live in `shared::CombatSim`; this app owns it as a
//! resource, feeds it bot decisions every fixed tick, and saves the stat
//! ledgers when the match clock runs out.

mod npc;
mod persistence;
mod weapons;
mod world;

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use shared::FIXED_TIMESTEP_HZ;
use std::time::Duration;

use world::{ArenaConfig, MatchClock};

fn tick_duration() -> Duration {
    Duration::from_secs_f64(1.0 / FIXED_TIMESTEP_HZ)
}

fn build_app(config: ArenaConfig) -> App {
    let mut app = App::new();

    // Headless plugins (no rendering). The main loop runs at the fixed tick
    // rate so every frame advances the sim exactly once.
    app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(tick_duration())));
    app.insert_resource(Time::<Fixed>::from_hz(FIXED_TIMESTEP_HZ));

    app.insert_resource(config);
    app.init_resource::<MatchClock>();

    app.add_systems(Startup, world::setup_world);

    // Fixed tick: bots decide, the sim resolves, then we react to what happened.
    app.add_systems(
        FixedUpdate,
        (
            npc::drive_enemies,
            weapons::drive_player_bots,
            world::tick_combat,
            weapons::handle_combat_events,
            npc::respawn_dead_enemies,
            world::finish_match,
        )
            .chain(),
    );

    app
}

fn main() {
    let config = ArenaConfig::from_env();
    let mut app = build_app(config);
    app.add_plugins(bevy::log::LogPlugin::default());

    info!("Starting arena at {} Hz", FIXED_TIMESTEP_HZ);
    app.run();
}
