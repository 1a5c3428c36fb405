//! Cube Roller - rolling-block puzzle simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (orientation table, rolling, falling, split/merge)
//! - `level`: Pre-parsed level description and validation
//! - `tuning`: Data-driven speeds and thresholds
//! - `moves`: Move counter fed by simulation events

pub mod level;
pub mod moves;
pub mod sim;
pub mod tuning;

pub use level::{LevelError, LevelSpec};
pub use moves::MoveCounter;
pub use tuning::Tuning;

use glam::{IVec2, Vec3};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Center height of the 1x2x1 cube standing upright on a tile
    pub const TALL_VERTICAL_HEIGHT: f32 = 1.0;
    /// Center height of the 1x2x1 cube lying down, and of a unit cube
    pub const LYING_HEIGHT: f32 = 0.5;

    /// Every roll is a quarter turn
    pub const ROLL_ANGLE: f32 = 90.0;
}

/// Grid cell under a world point. Cells are `(x, z)` packed into an `IVec2`.
#[inline]
pub fn cell_of(point: Vec3) -> IVec2 {
    IVec2::new(point.x.round() as i32, point.z.round() as i32)
}

/// World-space center of a cell at the given height
#[inline]
pub fn cell_center(cell: IVec2, height: f32) -> Vec3 {
    Vec3::new(cell.x as f32, height, cell.y as f32)
}

/// Snap every component to the nearest half unit
#[inline]
pub fn snap_half(v: Vec3) -> Vec3 {
    (v * 2.0).round() / 2.0
}
