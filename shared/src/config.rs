//! Weapon catalog and combat tuning.
//!
//! Built-in stat tables live on `GunType` / `AmmoType`; a RON catalog can
//! override any of them without touching code.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::weapons::recoil::RecoilParams;
use crate::weapons::{AmmoModifier, AmmoType, GunStats, GunType, WeaponMod, WeaponProfile};

/// Catalog format version understood by this build.
pub const CATALOG_VERSION: u32 = 1;

/// Global combat knobs that are not tied to one gun.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    pub crit_multiplier: f32,
    /// Max distance (m) from the critical point for a hit to count as a crit
    pub crit_distance: f32,
    pub chain_bounce_range: f32,
    /// Scale on bullet damage dealt to allies (0 disables friendly damage)
    pub friendly_fire_multiplier: f32,
    pub melee_knockback: f32,
    /// Muzzle distance in front of the owner's center
    pub muzzle_offset: f32,
    pub recoil: RecoilParams,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            crit_multiplier: 1.5,
            crit_distance: 0.2,
            chain_bounce_range: 10.0,
            friendly_fire_multiplier: 1.0,
            melee_knockback: 6.0,
            muzzle_offset: 0.5,
            recoil: RecoilParams::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponCatalog {
    pub version: u32,
    pub guns: HashMap<GunType, GunStats>,
    pub ammo: HashMap<AmmoType, AmmoModifier>,
    pub tuning: CombatTuning,
}

impl Default for WeaponCatalog {
    fn default() -> Self {
        Self {
            version: CATALOG_VERSION,
            guns: HashMap::new(),
            ammo: HashMap::new(),
            tuning: CombatTuning::default(),
        }
    }
}

impl WeaponCatalog {
    pub fn from_ron_str(text: &str) -> Result<Self, String> {
        let catalog: WeaponCatalog =
            ron::from_str(text).map_err(|e| format!("Failed to parse weapon catalog: {}", e))?;

        if catalog.version != CATALOG_VERSION {
            return Err(format!(
                "Unsupported catalog version {} (expected {})",
                catalog.version, CATALOG_VERSION
            ));
        }
        Ok(catalog)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let catalog = Self::from_ron_str(&text).map_err(|e| format!("{}: {}", path.display(), e))?;

        info!(
            "Loaded weapon catalog from {:?} ({} gun overrides, {} ammo overrides)",
            path,
            catalog.guns.len(),
            catalog.ammo.len()
        );
        Ok(catalog)
    }

    /// Stats for `gun`, falling back to the built-in table.
    pub fn gun_stats(&self, gun: GunType) -> GunStats {
        self.guns.get(&gun).cloned().unwrap_or_else(|| gun.base_stats())
    }

    pub fn ammo_modifier(&self, ammo: AmmoType) -> AmmoModifier {
        self.ammo.get(&ammo).cloned().unwrap_or_else(|| ammo.modifier())
    }

    pub fn profile(&self, gun: GunType, ammo: AmmoType, mods: &[WeaponMod]) -> WeaponProfile {
        WeaponProfile::compose(
            gun,
            ammo,
            &self.gun_stats(gun),
            &self.ammo_modifier(ammo),
            mods,
            &self.tuning,
        )
    }
}
