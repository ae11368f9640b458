//! Fire-rate gating state machine.
//!
//! ```text
//!   Idle --fire--> Recoiling --delay elapsed--> Idle | Disabled
//!   Idle | Recoiling --begin_reload--> Reloading --finish--> Idle | Disabled
//!   Idle <--conditions clear/hold--> Disabled
//! ```
//! Timers live in the scheduler; the gate only records state.

use serde::{Deserialize, Serialize};

use super::ammo::AmmoState;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FireGateState {
    #[default]
    Idle,
    /// Post-fire cooldown.
    Recoiling,
    Reloading,
    /// Owner is dead, gliding or launched.
    Disabled,
}

/// External signals that keep a weapon from firing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisableConditions {
    pub dead: bool,
    pub gliding: bool,
    pub launched: bool,
}

impl DisableConditions {
    pub fn any(&self) -> bool {
        self.dead || self.gliding || self.launched
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FireRejection {
    Cooldown,
    Reloading,
    Disabled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FireOutcome {
    /// One round consumed; `remaining` are still loaded.
    Fired { remaining: u32 },
    /// Empty magazine. Nothing was consumed.
    ReloadRequested,
    Rejected(FireRejection),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FireGate {
    state: FireGateState,
}

impl FireGate {
    pub fn state(&self) -> FireGateState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == FireGateState::Idle
    }

    pub fn try_fire(&mut self, ammo: &mut AmmoState) -> FireOutcome {
        match self.state {
            FireGateState::Reloading => return FireOutcome::Rejected(FireRejection::Reloading),
            FireGateState::Disabled => return FireOutcome::Rejected(FireRejection::Disabled),
            FireGateState::Recoiling => return FireOutcome::Rejected(FireRejection::Cooldown),
            FireGateState::Idle => {}
        }

        if !ammo.consume() {
            return FireOutcome::ReloadRequested;
        }

        self.state = FireGateState::Recoiling;
        FireOutcome::Fired {
            remaining: ammo.loaded(),
        }
    }

    /// Fire-delay continuation. Returns true when the state changed.
    pub fn on_fire_delay_elapsed(&mut self, conditions: DisableConditions) -> bool {
        if self.state != FireGateState::Recoiling {
            return false;
        }
        self.state = Self::rest_state(conditions);
        true
    }

    /// Per-tick re-evaluation of the disable conditions. Returns true when the
    /// state changed.
    pub fn refresh(&mut self, conditions: DisableConditions) -> bool {
        let next = match self.state {
            FireGateState::Idle if conditions.any() => FireGateState::Disabled,
            FireGateState::Disabled if !conditions.any() => FireGateState::Idle,
            other => other,
        };
        let changed = next != self.state;
        self.state = next;
        changed
    }

    /// Force the gate shut (launched by a man cannon).
    pub fn disable(&mut self) {
        if self.state != FireGateState::Reloading {
            self.state = FireGateState::Disabled;
        }
    }

    pub fn can_begin_reload(&self) -> bool {
        matches!(self.state, FireGateState::Idle | FireGateState::Recoiling)
    }

    pub fn begin_reload(&mut self) -> bool {
        if !self.can_begin_reload() {
            return false;
        }
        self.state = FireGateState::Reloading;
        true
    }

    pub fn finish_reload(&mut self, conditions: DisableConditions) {
        if self.state == FireGateState::Reloading {
            self.state = Self::rest_state(conditions);
        }
    }

    fn rest_state(conditions: DisableConditions) -> FireGateState {
        if conditions.any() {
            FireGateState::Disabled
        } else {
            FireGateState::Idle
        }
    }
}
