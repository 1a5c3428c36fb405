//! Tile grid and support queries
//!
//! The grid is static level geometry plus two kinds of mutable tiles:
//! hazard tiles that drop away once consumed, and bridges that open/close.

use glam::{IVec2, Vec3};
use serde::{Deserialize, Serialize};

use super::orientation::Orientation;
use crate::cell_of;

/// What occupies a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellKind {
    #[default]
    Empty,
    Floor,
    /// Drops away under an upright, resting main cube
    Hazard,
    Goal,
    /// Splits an upright main cube into two unit cubes
    SplitTrigger,
    SplitSpawnA,
    SplitSpawnB,
    /// Pressed by any cube
    RoundButton,
    /// Pressed only by the upright main cube
    CrossButton,
    Bridge { open: bool },
}

impl CellKind {
    /// Whether a cube can rest on this cell
    pub fn supports(&self) -> bool {
        match self {
            CellKind::Empty => false,
            CellKind::Bridge { open } => *open,
            _ => true,
        }
    }
}

/// Which half of a lying cube, along its long axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Half {
    /// Half toward the negative end of the long axis
    Low,
    /// Half toward the positive end of the long axis
    High,
}

/// Result of probing the cells under a cube
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    /// Every probed cell has a tile
    Full,
    /// Lying cube with exactly one half over a tile
    Partial { grounded: Half },
    /// Nothing underneath
    None,
}

impl Support {
    pub fn is_grounded(&self) -> bool {
        matches!(self, Support::Full)
    }
}

/// Level geometry as seen by the simulation
///
/// Implemented by [`Grid`]; hosts with their own spatial structures can
/// provide a different implementation.
pub trait LevelGrid {
    /// Classify a cell; cells off the grid are `Empty`
    fn cell_kind_at(&self, cell: IVec2) -> CellKind;

    /// Where the main cube starts
    fn spawn_cell(&self) -> IVec2;

    fn split_spawn_a(&self) -> Option<IVec2>;

    fn split_spawn_b(&self) -> Option<IVec2>;

    /// Permanently remove a hazard tile. Returns false if the cell is not an
    /// intact hazard.
    fn consume_hazard_at(&mut self, cell: IVec2) -> bool;

    /// Open or close a bridge tile. Returns false if the cell is not a bridge.
    fn set_bridge_open(&mut self, cell: IVec2, open: bool) -> bool;

    fn supports(&self, cell: IVec2) -> bool {
        self.cell_kind_at(cell).supports()
    }

    /// Probe the tiles under a cube centered at `position`.
    ///
    /// Upright cubes probe one point; lying cubes probe both halves at ±0.5
    /// along their long axis.
    fn support_under(&self, position: Vec3, orientation: Orientation) -> Support {
        let offset = match orientation {
            Orientation::Vertical => {
                return if self.supports(cell_of(position)) {
                    Support::Full
                } else {
                    Support::None
                };
            }
            Orientation::HorizontalX => Vec3::new(0.5, 0.0, 0.0),
            Orientation::HorizontalZ => Vec3::new(0.0, 0.0, 0.5),
        };

        let low = self.supports(cell_of(position - offset));
        let high = self.supports(cell_of(position + offset));
        match (low, high) {
            (true, true) => Support::Full,
            (true, false) => Support::Partial { grounded: Half::Low },
            (false, true) => Support::Partial { grounded: Half::High },
            (false, false) => Support::None,
        }
    }

    fn is_supported(&self, position: Vec3, orientation: Orientation) -> bool {
        self.support_under(position, orientation).is_grounded()
    }
}

/// Rectangular tile grid indexed by world cell `(x, z)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    depth: i32,
    cells: Vec<CellKind>,
    spawn: IVec2,
    split_a: Option<IVec2>,
    split_b: Option<IVec2>,
}

/// Number of cells in a `width` x `depth` grid, `None` if negative or too large
pub fn cell_count(width: i32, depth: i32) -> Option<usize> {
    if width < 0 || depth < 0 {
        return None;
    }
    width.checked_mul(depth).and_then(|n| usize::try_from(n).ok())
}

impl Grid {
    /// Build a grid from row-major cells (`cells[z * width + x]`).
    ///
    /// Split spawn positions are taken from the `SplitSpawnA`/`SplitSpawnB`
    /// cells. Validation of the layout belongs to the level loader; here a
    /// cell list of the wrong length is padded with `Empty` or truncated, and
    /// a negative or oversized grid comes out empty.
    pub fn new(width: i32, depth: i32, mut cells: Vec<CellKind>, spawn: IVec2) -> Self {
        let (width, depth, len) = match cell_count(width, depth) {
            Some(len) => (width, depth, len),
            None => (0, 0, 0),
        };
        if cells.len() != len {
            log::warn!(
                "Grid {}x{} given {} cells, resizing to {}",
                width,
                depth,
                cells.len(),
                len
            );
            cells.resize(len, CellKind::Empty);
        }

        let mut grid = Self {
            width,
            depth,
            cells,
            spawn,
            split_a: None,
            split_b: None,
        };
        grid.split_a = grid.cells_of(CellKind::SplitSpawnA).first().copied();
        grid.split_b = grid.cells_of(CellKind::SplitSpawnB).first().copied();
        grid
    }

    /// Grid of plain floor, handy for tests and demos
    pub fn filled(width: i32, depth: i32, spawn: IVec2) -> Self {
        let cells = vec![CellKind::Floor; cell_count(width, depth).unwrap_or(0)];
        Self::new(width, depth, cells, spawn)
    }

    pub fn in_bounds(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.depth
    }

    fn index(&self, cell: IVec2) -> Option<usize> {
        self.in_bounds(cell)
            .then(|| (cell.y * self.width + cell.x) as usize)
    }

    /// Overwrite a cell (level editing and tests)
    pub fn set(&mut self, cell: IVec2, kind: CellKind) {
        if let Some(i) = self.index(cell) {
            self.cells[i] = kind;
        }
    }

    /// All cells of a given kind, in row-major order
    pub fn cells_of(&self, kind: CellKind) -> Vec<IVec2> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == kind)
            .map(|(i, _)| IVec2::new(i as i32 % self.width, i as i32 / self.width))
            .collect()
    }
}

impl LevelGrid for Grid {
    fn cell_kind_at(&self, cell: IVec2) -> CellKind {
        self.index(cell).map(|i| self.cells[i]).unwrap_or_default()
    }

    fn spawn_cell(&self) -> IVec2 {
        self.spawn
    }

    fn split_spawn_a(&self) -> Option<IVec2> {
        self.split_a
    }

    fn split_spawn_b(&self) -> Option<IVec2> {
        self.split_b
    }

    fn consume_hazard_at(&mut self, cell: IVec2) -> bool {
        match self.index(cell) {
            Some(i) if self.cells[i] == CellKind::Hazard => {
                self.cells[i] = CellKind::Empty;
                true
            }
            _ => false,
        }
    }

    fn set_bridge_open(&mut self, cell: IVec2, open: bool) -> bool {
        match self.index(cell) {
            Some(i) if matches!(self.cells[i], CellKind::Bridge { .. }) => {
                self.cells[i] = CellKind::Bridge { open };
                true
            }
            _ => false,
        }
    }
}
