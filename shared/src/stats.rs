//! Per-player combat stats.
//!
//! End-of-match stats are integer counters; "true" stats are the float values
//! shown on the scoreboard, including the derived accuracy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// End-of-match counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stat {
    ShotsFired,
    BotHits,
    FriendHits,
    CriticalHits,
    BotKills,
}

impl Stat {
    pub const ALL: [Stat; 5] = [
        Stat::ShotsFired,
        Stat::BotHits,
        Stat::FriendHits,
        Stat::CriticalHits,
        Stat::BotKills,
    ];

    /// Scoreboard label.
    pub fn label(&self) -> &'static str {
        match self {
            Stat::ShotsFired => "Shots Fired",
            Stat::BotHits => "Bot Hits",
            Stat::FriendHits => "Friend Hits",
            Stat::CriticalHits => "Critical Hits",
            Stat::BotKills => "Bot Kills",
        }
    }

    /// The displayed stat that mirrors this counter, if any.
    pub fn true_stat(&self) -> Option<TrueStat> {
        match self {
            Stat::FriendHits => Some(TrueStat::FriendHits),
            Stat::CriticalHits => Some(TrueStat::CriticalHits),
            Stat::BotKills => Some(TrueStat::BotKills),
            Stat::ShotsFired | Stat::BotHits => None,
        }
    }
}

/// Displayed ("true") stats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrueStat {
    Accuracy,
    CriticalHits,
    BotKills,
    FriendHits,
}

impl TrueStat {
    pub fn label(&self) -> &'static str {
        match self {
            TrueStat::Accuracy => "Accuracy",
            TrueStat::CriticalHits => "Critical Hits",
            TrueStat::BotKills => "Bot Kills",
            TrueStat::FriendHits => "Friend Hits",
        }
    }
}

/// One player's stats, owned by the simulation and mutated through `&mut`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatLedger {
    end_stats: BTreeMap<Stat, u32>,
    true_stats: BTreeMap<TrueStat, f32>,
}

impl StatLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stat: Stat) -> u32 {
        self.end_stats.get(&stat).copied().unwrap_or(0)
    }

    pub fn set(&mut self, stat: Stat, value: u32) {
        self.end_stats.insert(stat, value);
    }

    /// Bump a counter and its displayed mirror.
    pub fn increment(&mut self, stat: Stat) -> u32 {
        let value = self.get(stat).saturating_add(1);
        self.set(stat, value);
        if let Some(mirror) = stat.true_stat() {
            let shown = self.true_stat(mirror) + 1.0;
            self.set_true_stat(mirror, shown);
        }
        value
    }

    pub fn true_stat(&self, stat: TrueStat) -> f32 {
        self.true_stats.get(&stat).copied().unwrap_or(0.0)
    }

    pub fn set_true_stat(&mut self, stat: TrueStat, value: f32) {
        self.true_stats.insert(stat, value);
    }

    /// Recompute `Accuracy = BotHits / ShotsFired`. Zero shots reads as zero.
    pub fn update_accuracy(&mut self) -> f32 {
        let shots = self.get(Stat::ShotsFired);
        let accuracy = if shots == 0 {
            0.0
        } else {
            self.get(Stat::BotHits) as f32 / shots as f32
        };
        self.set_true_stat(TrueStat::Accuracy, accuracy);
        accuracy
    }

    pub fn accuracy(&self) -> f32 {
        self.true_stat(TrueStat::Accuracy)
    }

    /// Labelled counters in scoreboard order.
    pub fn summary(&self) -> Vec<(&'static str, u32)> {
        Stat::ALL.iter().map(|s| (s.label(), self.get(*s))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_zero_without_shots() {
        let mut ledger = StatLedger::new();
        ledger.increment(Stat::BotHits);
        assert_eq!(ledger.update_accuracy(), 0.0);
    }

    #[test]
    fn test_accuracy_ratio() {
        let mut ledger = StatLedger::new();
        ledger.set(Stat::ShotsFired, 4);
        ledger.set(Stat::BotHits, 3);
        assert!((ledger.update_accuracy() - 0.75).abs() < 1e-6);
        assert!((ledger.accuracy() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_increment_mirrors_true_stat() {
        let mut ledger = StatLedger::new();
        ledger.increment(Stat::CriticalHits);
        ledger.increment(Stat::CriticalHits);
        ledger.increment(Stat::ShotsFired);
        assert_eq!(ledger.get(Stat::CriticalHits), 2);
        assert_eq!(ledger.true_stat(TrueStat::CriticalHits), 2.0);
        assert_eq!(ledger.true_stat(TrueStat::Accuracy), 0.0);
    }

    #[test]
    fn test_summary_labels() {
        let mut ledger = StatLedger::new();
        ledger.increment(Stat::BotKills);
        let summary = ledger.summary();
        assert_eq!(summary[0], ("Shots Fired", 0));
        assert_eq!(summary[4], ("Bot Kills", 1));
    }
}
