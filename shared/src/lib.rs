//! Shared combat engine: weapons, targets, hit resolution and the simulation
//! that ties them together. Used by the headless arena server.

pub mod arena;
pub mod config;
pub mod events;
pub mod launchers;
pub mod melee;
pub mod physics;
pub mod scheduler;
pub mod sim;
pub mod spatial;
pub mod stats;
pub mod targets;
pub mod weapons;
pub mod world;

pub use arena::{Arena, Handle};
pub use config::{CombatTuning, WeaponCatalog};
pub use events::{CombatEvent, EventOutbox, Hazards, ImpactCue, Notice, StatusEffect, VoiceCue};
pub use launchers::{Launcher, LauncherId, TriggerVolume};
pub use physics::FIXED_TIMESTEP_HZ;
pub use sim::{CombatSim, TaskOwner};
pub use spatial::{Overlap, SpatialQuery, TraceHit};
pub use stats::{Stat, StatLedger, TrueStat};
pub use targets::{Target, TargetId, TargetKind};
pub use weapons::fire_gate::{FireGateState, FireOutcome, FireRejection};
pub use weapons::{AmmoType, GunType, ProfileStat, Weapon, WeaponId, WeaponMod, WeaponProfile};
pub use world::TargetWorld;
