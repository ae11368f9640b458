//! Procedural camera recoil.
//!
//! Every shot extends the recoil window; while it is open the camera pitch
//! climbs along a damped curve with Perlin jitter on pitch and yaw. Outside
//! the window the accumulated duration bleeds off.

use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

/// Seed for the recoil noise field.
pub const RECOIL_NOISE_SEED: u32 = 2025;

/// Offset into the noise field so yaw jitter is decorrelated from pitch.
const YAW_NOISE_OFFSET: f32 = 1000.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoilParams {
    /// Window added per shot (seconds)
    pub step_duration: f32,
    pub max_duration: f32,
    /// Exponential damping rate of the kick
    pub dampen: f32,
    /// Pitch climb per second of recoil
    pub curve_strength: f32,
    pub noise_frequency: f32,
    pub pitch_intensity: f32,
    pub yaw_intensity: f32,
    /// Duration decays by `dt / decay_divisor` while not recoiling
    pub decay_divisor: f32,
}

impl Default for RecoilParams {
    fn default() -> Self {
        Self {
            step_duration: 0.05,
            max_duration: 0.3,
            dampen: 3.5,
            curve_strength: 5.0,
            noise_frequency: 5.0,
            pitch_intensity: 1.75,
            yaw_intensity: 1.75,
            decay_divisor: 6.0,
        }
    }
}

/// Camera rotation change for one tick, in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RecoilKick {
    pub pitch: f32,
    pub yaw: f32,
}

pub struct RecoilModel {
    params: RecoilParams,
    noise: Perlin,
    recoiling: bool,
    elapsed: f32,
    duration: f32,
    last_pitch: f32,
    last_yaw: f32,
}

impl RecoilModel {
    pub fn new(params: RecoilParams) -> Self {
        Self {
            params,
            noise: Perlin::new(RECOIL_NOISE_SEED),
            recoiling: false,
            elapsed: 0.0,
            duration: 0.0,
            last_pitch: 0.0,
            last_yaw: 0.0,
        }
    }

    pub fn is_recoiling(&self) -> bool {
        self.recoiling
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn params(&self) -> &RecoilParams {
        &self.params
    }

    /// A shot was fired.
    pub fn on_fire(&mut self) {
        if !self.recoiling {
            self.reset_window();
        }
        self.recoiling = true;
        self.duration = (self.duration + self.params.step_duration).min(self.params.max_duration);
    }

    fn reset_window(&mut self) {
        self.elapsed = 0.0;
        self.last_pitch = 0.0;
        self.last_yaw = 0.0;
    }

    fn noise_1d(&self, x: f32) -> f32 {
        self.noise.get([x as f64, 0.0]) as f32
    }

    /// Advance the recoil curve. Returns the rotation delta to apply while
    /// recoiling.
    pub fn tick(&mut self, dt: f32) -> Option<RecoilKick> {
        if !self.recoiling {
            self.duration = (self.duration - dt / self.params.decay_divisor).max(0.0);
            return None;
        }

        let p = &self.params;
        self.elapsed += dt;
        let t = self.elapsed;

        let damping = (-p.dampen * t).exp();
        let base_pitch = p.curve_strength * t;
        let pitch_noise = self.noise_1d(t * p.noise_frequency);
        let yaw_noise = self.noise_1d((t + YAW_NOISE_OFFSET) * p.noise_frequency);

        let pitch = (base_pitch + pitch_noise * p.pitch_intensity) * damping;
        let yaw = yaw_noise * p.yaw_intensity * (damping * 2.0);

        let kick = RecoilKick {
            pitch: pitch - self.last_pitch,
            yaw: yaw - self.last_yaw,
        };
        self.last_pitch = pitch;
        self.last_yaw = yaw;

        if self.elapsed >= self.duration {
            self.recoiling = false;
            self.reset_window();
        }

        Some(kick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_grows_per_shot_up_to_max() {
        let mut recoil = RecoilModel::new(RecoilParams::default());
        for _ in 0..3 {
            recoil.on_fire();
        }
        assert!((recoil.duration() - 0.15).abs() < 1e-5);
        for _ in 0..10 {
            recoil.on_fire();
        }
        assert!((recoil.duration() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_window_closes_then_decays() {
        let mut recoil = RecoilModel::new(RecoilParams::default());
        recoil.on_fire();

        let mut kicks = 0;
        while recoil.tick(0.01).is_some() {
            kicks += 1;
            assert!(kicks < 100);
        }
        assert!(!recoil.is_recoiling());
        // Window of 0.05s at 0.01s steps.
        assert!((4..=6).contains(&kicks));

        let before = recoil.duration();
        recoil.tick(0.6);
        assert!((recoil.duration() - (before - 0.1).max(0.0)).abs() < 1e-6);
    }

    #[test]
    fn test_kicks_climb_without_pitch_noise() {
        let mut recoil = RecoilModel::new(RecoilParams {
            pitch_intensity: 0.0,
            ..Default::default()
        });
        recoil.on_fire();
        recoil.on_fire();

        let mut total_pitch = 0.0;
        let mut last = RecoilKick::default();
        while let Some(kick) = recoil.tick(1.0 / 60.0) {
            total_pitch += kick.pitch;
            last = kick;
        }
        let t = 6.0 / 60.0;
        let expected = 5.0 * t * (-3.5_f32 * t).exp();
        assert!(total_pitch > 0.0);
        assert!((total_pitch - expected).abs() < 0.05);
        assert!(last.pitch.is_finite() && last.yaw.is_finite());
    }
}
