//! Level description and validation
//!
//! Levels arrive already parsed into an integer grid. Columns are mirrored
//! into world X (`x = width - 1 - col`) so that an East move walks toward the
//! next column.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::sim::{CellKind, Grid, cell_count, LevelGrid, Simulation, Switch, SwitchKind, SwitchMode};
use crate::tuning::Tuning;

/// Problems found while validating a level
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("Level must be at least 1x1, got {width}x{depth}")]
    EmptyGrid { width: i32, depth: i32 },

    #[error("Level {width}x{depth} is too large")]
    TooLarge { width: i32, depth: i32 },

    #[error("Expected {expected} cells for the level size, got {actual}")]
    WrongCellCount { expected: usize, actual: usize },

    #[error("Unknown cell code {code} at column {col}, row {row}")]
    UnknownCell { code: i32, col: i32, row: i32 },

    #[error("Level has no goal tile")]
    MissingGoal,

    #[error("Spawn [{col}, {row}] is outside the level")]
    SpawnOutOfBounds { col: i32, row: i32 },

    #[error("Spawn [{col}, {row}] is not on a supporting tile")]
    SpawnUnsupported { col: i32, row: i32 },

    #[error("Split trigger needs both split spawn tiles")]
    IncompleteSplit,

    #[error("More than one {kind} tile")]
    DuplicateSplitSpawn { kind: &'static str },

    #[error("Switch at [{col}, {row}] is not on a button tile")]
    SwitchNotOnButton { col: i32, row: i32 },

    #[error("Switch target [{col}, {row}] is not a bridge tile")]
    NotABridge { col: i32, row: i32 },

    #[error("Invalid level JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read level file: {0}")]
    Io(#[from] std::io::Error),
}

/// A button and the bridges it drives, in map coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchSpec {
    /// `[col, row]` of the button tile
    pub cell: [i32; 2],
    #[serde(default)]
    pub mode: SwitchMode,
    /// `[col, row]` of each controlled bridge
    pub bridges: Vec<[i32; 2]>,
}

/// Pre-parsed level data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSpec {
    pub width: i32,
    pub depth: i32,
    /// Row-major cell codes, `depth` rows of `width` columns
    pub cells: Vec<i32>,
    /// `[col, row]` where the cube starts upright
    pub spawn: [i32; 2],
    #[serde(default)]
    pub switches: Vec<SwitchSpec>,
}

/// Tile for a map cell code
fn cell_from_code(code: i32) -> Option<CellKind> {
    Some(match code {
        0 => CellKind::Empty,
        2 => CellKind::Floor,
        3 => CellKind::Hazard,
        4 => CellKind::Goal,
        5 => CellKind::SplitTrigger,
        6 => CellKind::SplitSpawnA,
        7 => CellKind::SplitSpawnB,
        8 => CellKind::RoundButton,
        9 => CellKind::CrossButton,
        10 => CellKind::Bridge { open: false },
        11 => CellKind::Bridge { open: true },
        _ => return None,
    })
}

impl LevelSpec {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a level from a JSON file
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, LevelError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// World cell for a `[col, row]` map position
    pub fn world_cell(&self, [col, row]: [i32; 2]) -> IVec2 {
        IVec2::new(self.width - 1 - col, row)
    }

    fn in_map(&self, [col, row]: [i32; 2]) -> bool {
        (0..self.width).contains(&col) && (0..self.depth).contains(&row)
    }

    /// Validate and build the level grid
    pub fn build(&self) -> Result<Grid, LevelError> {
        if self.width <= 0 || self.depth <= 0 {
            return Err(LevelError::EmptyGrid {
                width: self.width,
                depth: self.depth,
            });
        }
        let expected = cell_count(self.width, self.depth).ok_or(LevelError::TooLarge {
            width: self.width,
            depth: self.depth,
        })?;
        if self.cells.len() != expected {
            return Err(LevelError::WrongCellCount {
                expected,
                actual: self.cells.len(),
            });
        }

        let mut kinds = vec![CellKind::Empty; expected];
        for (i, &code) in self.cells.iter().enumerate() {
            let (col, row) = (i as i32 % self.width, i as i32 / self.width);
            let kind = cell_from_code(code).ok_or(LevelError::UnknownCell { code, col, row })?;
            let x = self.width - 1 - col;
            kinds[(row * self.width + x) as usize] = kind;
        }

        let count = |kind: CellKind| kinds.iter().filter(|&&k| k == kind).count();
        if count(CellKind::Goal) == 0 {
            return Err(LevelError::MissingGoal);
        }
        for (kind, name) in [(CellKind::SplitSpawnA, "split spawn A"), (CellKind::SplitSpawnB, "split spawn B")] {
            if count(kind) > 1 {
                return Err(LevelError::DuplicateSplitSpawn { kind: name });
            }
        }
        if count(CellKind::SplitTrigger) > 0 && (count(CellKind::SplitSpawnA) == 0 || count(CellKind::SplitSpawnB) == 0) {
            return Err(LevelError::IncompleteSplit);
        }

        let [col, row] = self.spawn;
        if !self.in_map(self.spawn) {
            return Err(LevelError::SpawnOutOfBounds { col, row });
        }
        let spawn = self.world_cell(self.spawn);
        let grid = Grid::new(self.width, self.depth, kinds, spawn);
        if !grid.supports(spawn) {
            return Err(LevelError::SpawnUnsupported { col, row });
        }

        log::info!(
            "Built {}x{} level, spawn at {}, {} switch(es)",
            self.width,
            self.depth,
            spawn,
            self.switches.len()
        );
        Ok(grid)
    }

    /// Validate the switches against a grid built from this level
    pub fn build_switches(&self, grid: &Grid) -> Result<Vec<Switch>, LevelError> {
        self.switches
            .iter()
            .map(|spec| -> Result<Switch, LevelError> {
                let [col, row] = spec.cell;
                let cell = self.world_cell(spec.cell);
                let kind = SwitchKind::from_cell(grid.cell_kind_at(cell))
                    .filter(|_| self.in_map(spec.cell))
                    .ok_or(LevelError::SwitchNotOnButton { col, row })?;

                let bridges = spec
                    .bridges
                    .iter()
                    .map(|&target| {
                        let bridge = self.world_cell(target);
                        match grid.cell_kind_at(bridge) {
                            CellKind::Bridge { .. } if self.in_map(target) => Ok(bridge),
                            _ => Err(LevelError::NotABridge {
                                col: target[0],
                                row: target[1],
                            }),
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(Switch::new(cell, kind, spec.mode, bridges))
            })
            .collect()
    }

    /// Build a ready-to-play simulation
    pub fn simulation(&self, tuning: Tuning) -> Result<Simulation, LevelError> {
        let grid = self.build()?;
        let switches = self.build_switches(&grid)?;
        Ok(Simulation::new(grid, tuning).with_switches(switches))
    }
}
