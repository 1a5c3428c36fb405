//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Stable iteration order (main cube, or unit cube A then B)
//! - No rendering or platform dependencies

pub mod body;
pub mod fall;
pub mod formation;
pub mod grid;
pub mod orientation;
pub mod state;
pub mod switches;
pub mod tick;

pub use body::{Body, BodyKind, FreeFall, Motion, Spin, StepOutcome};
pub use fall::{FallPlan, resolve_fall};
pub use formation::{Controlled, Formation, Layout, Merge, SplitPair};
pub use grid::{CellKind, Grid, Half, LevelGrid, Support, cell_count};
pub use orientation::{Direction, Orientation, PivotSpec, RollPlan, plan_roll, plan_unit_roll};
pub use state::{EventSink, GameEvent, LevelPhase, Simulation};
pub use switches::{Switch, SwitchChange, SwitchKind, SwitchMode};
pub use tick::{TickInput, tick};
