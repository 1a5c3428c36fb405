//! Data-driven tuning
//!
//! Speeds, thresholds and fall limits. Every rate is per second and scaled by
//! the tick's `dt`, so the same tuning behaves identically at any step size.

use serde::{Deserialize, Serialize};

/// Simulation tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Input ===
    /// An intent axis must reach this magnitude to count as a move
    pub intent_threshold: f32,

    // === Rolling ===
    /// Main cube roll speed (degrees per second)
    pub roll_speed: f32,
    /// Unit cube roll speed (degrees per second)
    pub small_roll_speed: f32,
    /// Pause after each unit cube roll before it accepts input again (seconds)
    pub small_move_cooldown: f32,

    // === Falling ===
    /// Edge-pivot rotation speed while tipping off a ledge (degrees per second)
    pub fall_rot_speed: f32,
    /// How fast the supporting edge sinks during an edge pivot (units per second)
    pub pivot_sink_rate: f32,
    /// Free-fall acceleration (units per second squared)
    pub gravity: f32,
    /// Tumble rate while free falling (degrees per second)
    pub fall_spin_rate: f32,
    /// Sideways drift while tumbling (units per second)
    pub fall_drift: f32,
    /// Main cube is lost once its center drops below this height
    pub main_fall_floor: f32,
    /// Unit cubes are lost once their center drops below this height
    pub small_fall_floor: f32,

    // === Tiles ===
    /// Max horizontal offset for a hazard tile to count a cube as resting on it
    pub hazard_tolerance: f32,
    /// Center height of freshly split unit cubes
    pub small_spawn_height: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            intent_threshold: 0.99,

            roll_speed: 300.0,
            small_roll_speed: 180.0,
            small_move_cooldown: 0.1,

            fall_rot_speed: 540.0,
            pivot_sink_rate: 0.5,
            gravity: 20.0,
            fall_spin_rate: 360.0,
            fall_drift: 1.0,
            main_fall_floor: -10.0,
            small_fall_floor: -5.0,

            hazard_tolerance: 0.3,
            small_spawn_height: 0.5,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse tuning from JSON, falling back to defaults on error
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(tuning) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Err(e) => {
                log::warn!("Invalid tuning ({}), using defaults", e);
                Self::default()
            }
        }
    }
}
