//! Simulation state and events
//!
//! Everything needed to resume a level lives here, so a snapshot taken with
//! serde evolves exactly like the original.

use glam::{IVec2, Vec3};
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::formation::{Controlled, Formation};
use super::grid::{Grid, LevelGrid};
use super::orientation::{Direction, Orientation};
use super::switches::Switch;
use crate::tuning::Tuning;

/// Current phase of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelPhase {
    /// Accepting input
    Playing,
    /// Main cube dropped into the goal
    Complete,
    /// A cube fell off the grid; the host resets the level
    Failed,
}

/// Notifications raised by the simulation, each at most once per cause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A body started a roll
    Moved { body: u32, direction: Direction },
    /// A body dropped below its fall floor
    CubeFell { body: u32 },
    GoalReached,
    Split { a: u32, b: u32 },
    Merged { position: Vec3, orientation: Orientation },
    ControlSwitched { controlled: Controlled },
    HazardConsumed { cell: IVec2 },
    SwitchPressed { cell: IVec2 },
    SwitchReleased { cell: IVec2 },
    BridgeToggled { cell: IVec2, open: bool },
}

/// Receiver for simulation events
pub trait EventSink {
    fn emit(&mut self, event: GameEvent);
}

impl EventSink for Vec<GameEvent> {
    fn emit(&mut self, event: GameEvent) {
        self.push(event);
    }
}

/// A level in progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation<G = Grid> {
    /// Level geometry
    pub grid: G,
    pub tuning: Tuning,
    pub formation: Formation,
    pub switches: Vec<Switch>,
    pub phase: LevelPhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Latched once the goal fires
    pub goal_reached: bool,
    /// Next body ID
    next_id: u32,
}

impl<G: LevelGrid> Simulation<G> {
    /// Start a level with the main cube upright on the grid's spawn cell
    pub fn new(grid: G, tuning: Tuning) -> Self {
        let main = Body::tall(1, grid.spawn_cell());
        log::info!("Level started, cube at {}", main.position);
        Self {
            grid,
            tuning,
            formation: Formation::new(main),
            switches: Vec::new(),
            phase: LevelPhase::Playing,
            time_ticks: 0,
            goal_reached: false,
            next_id: 2,
        }
    }

    pub fn with_switches(mut self, switches: Vec<Switch>) -> Self {
        self.switches = switches;
        self
    }

    /// Allocate a new body ID
    pub fn next_body_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Body currently under player control
    pub fn controlled_body(&self) -> &Body {
        self.formation.controlled_body()
    }

    pub fn live_bodies(&self) -> Vec<&Body> {
        self.formation.live_bodies()
    }

    /// Orientation of the controlled body
    pub fn current_orientation(&self) -> Orientation {
        self.controlled_body().orientation
    }

    /// Cells under the controlled body
    pub fn footprint_cells(&self) -> Vec<IVec2> {
        self.controlled_body().footprint_cells()
    }

    /// Whether the controlled body is rolling or falling
    pub fn is_moving(&self) -> bool {
        self.controlled_body().is_moving()
    }

    pub fn is_split(&self) -> bool {
        self.formation.is_split()
    }
}
