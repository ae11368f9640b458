//! Stat persistence - disk I/O for end-of-match stat ledgers
//!
//! One bincode file per player. Uses atomic writes (temp file + rename) so a
//! crash mid-write never leaves a truncated ledger behind.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use shared::StatLedger;
use std::path::PathBuf;

/// Bump when `SavedStats` changes shape.
pub const STATS_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedStats {
    pub version: u32,
    pub player_name: String,
    /// Simulated seconds the match lasted
    pub match_seconds: f32,
    pub ledger: StatLedger,
}

/// Directory of saved ledgers
pub struct StatStore {
    pub storage_dir: PathBuf,
}

impl StatStore {
    pub fn new(storage_dir: PathBuf) -> Result<Self, String> {
        std::fs::create_dir_all(&storage_dir)
            .map_err(|e| format!("Failed to create {}: {}", storage_dir.display(), e))?;
        info!("Match stats will be saved to: {:?}", storage_dir);
        Ok(Self { storage_dir })
    }

    fn path_for(&self, name: &str, extension: &str) -> PathBuf {
        self.storage_dir.join(format!("{}.{}", name.to_lowercase(), extension))
    }

    pub fn load(&self, name: &str) -> Result<SavedStats, String> {
        let path = self.path_for(name, "bin");
        if !path.exists() {
            return Err(format!("Stats for '{}' not found", name));
        }

        let bytes = std::fs::read(&path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let saved: SavedStats = bincode::deserialize(&bytes)
            .map_err(|e| format!("Failed to deserialize {}: {}", path.display(), e))?;

        if saved.version != STATS_VERSION {
            return Err(format!(
                "Stats version mismatch: found v{}, expected v{}",
                saved.version, STATS_VERSION
            ));
        }
        Ok(saved)
    }

    /// Save (atomic write via temp file)
    pub fn save(&self, saved: &SavedStats) -> Result<(), String> {
        let final_path = self.path_for(&saved.player_name, "bin");
        let temp_path = self.path_for(&saved.player_name, "tmp");

        let bytes = bincode::serialize(saved).map_err(|e| format!("Serialize error: {}", e))?;
        std::fs::write(&temp_path, &bytes).map_err(|e| format!("Write temp file error: {}", e))?;
        std::fs::rename(&temp_path, &final_path).map_err(|e| format!("Rename error: {}", e))?;

        info!("Saved stats: {} ({} bytes)", saved.player_name, bytes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Stat;

    fn temp_store(tag: &str) -> StatStore {
        let dir = std::env::temp_dir().join(format!("arena_stats_{}_{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        StatStore::new(dir).unwrap()
    }

    #[test]
    fn test_save_then_load() {
        let store = temp_store("roundtrip");
        let mut ledger = StatLedger::new();
        ledger.set(Stat::ShotsFired, 12);
        ledger.set(Stat::BotHits, 9);
        ledger.update_accuracy();
        let saved = SavedStats {
            version: STATS_VERSION,
            player_name: "Bravo".to_string(),
            match_seconds: 30.0,
            ledger,
        };

        store.save(&saved).unwrap();
        assert!(!store.path_for("bravo", "tmp").exists());
        let loaded = store.load("BRAVO").unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.ledger.accuracy(), 0.75);

        let _ = std::fs::remove_dir_all(&store.storage_dir);
    }

    #[test]
    fn test_missing_and_stale_files() {
        let store = temp_store("stale");
        assert!(store.load("nobody").unwrap_err().contains("not found"));

        let stale = SavedStats {
            version: STATS_VERSION + 1,
            player_name: "old".to_string(),
            match_seconds: 0.0,
            ledger: StatLedger::new(),
        };
        store.save(&stale).unwrap();
        assert!(store.load("old").unwrap_err().contains("version mismatch"));

        let _ = std::fs::remove_dir_all(&store.storage_dir);
    }
}
