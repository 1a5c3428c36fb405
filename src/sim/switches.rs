//! Floor buttons and the bridges they drive

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::body::{Body, BodyKind};
use super::grid::{CellKind, LevelGrid};

/// Which cubes can press a button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchKind {
    /// Any cube, any orientation
    Round,
    /// Only the main cube standing upright
    Cross,
}

impl SwitchKind {
    pub fn from_cell(kind: CellKind) -> Option<Self> {
        match kind {
            CellKind::RoundButton => Some(SwitchKind::Round),
            CellKind::CrossButton => Some(SwitchKind::Cross),
            _ => None,
        }
    }

    fn pressed_by(&self, body: &Body) -> bool {
        match self {
            SwitchKind::Round => true,
            SwitchKind::Cross => body.kind == BodyKind::Tall && body.is_vertical(),
        }
    }
}

/// What a press does to the controlled bridges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SwitchMode {
    /// Each press flips every bridge
    #[default]
    Toggle,
    /// Bridges flip on press and flip back on release
    Hold,
}

/// Change produced by evaluating a switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchChange {
    Pressed { cell: IVec2, bridges: Vec<(IVec2, bool)> },
    Released { cell: IVec2, bridges: Vec<(IVec2, bool)> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Switch {
    pub cell: IVec2,
    pub kind: SwitchKind,
    pub mode: SwitchMode,
    pub bridges: Vec<IVec2>,
    /// A qualifying body was resting on the button last evaluation
    pub pressed: bool,
}

impl Switch {
    pub fn new(cell: IVec2, kind: SwitchKind, mode: SwitchMode, bridges: Vec<IVec2>) -> Self {
        Self {
            cell,
            kind,
            mode,
            bridges,
            pressed: false,
        }
    }

    /// Whether any idle, qualifying body covers the button
    fn covered(&self, bodies: &[&Body]) -> bool {
        bodies.iter().any(|b| {
            b.is_idle() && !b.fell && self.kind.pressed_by(b) && b.footprint_cells().contains(&self.cell)
        })
    }

    /// Flip every controlled bridge, reporting new states
    fn flip_bridges<G: LevelGrid>(&self, grid: &mut G) -> Vec<(IVec2, bool)> {
        let mut flipped = Vec::with_capacity(self.bridges.len());
        for &bridge in &self.bridges {
            if let CellKind::Bridge { open } = grid.cell_kind_at(bridge) {
                if grid.set_bridge_open(bridge, !open) {
                    flipped.push((bridge, !open));
                }
            }
        }
        flipped
    }

    /// Edge-detect presses and releases, driving bridges as configured
    pub fn update<G: LevelGrid>(&mut self, bodies: &[&Body], grid: &mut G) -> Option<SwitchChange> {
        let covered = self.covered(bodies);
        if covered == self.pressed {
            return None;
        }
        self.pressed = covered;

        if covered {
            let bridges = self.flip_bridges(grid);
            log::info!("Switch at {} pressed, {} bridge(s) flipped", self.cell, bridges.len());
            Some(SwitchChange::Pressed {
                cell: self.cell,
                bridges,
            })
        } else {
            let bridges = match self.mode {
                SwitchMode::Toggle => Vec::new(),
                SwitchMode::Hold => self.flip_bridges(grid),
            };
            log::debug!("Switch at {} released", self.cell);
            Some(SwitchChange::Released {
                cell: self.cell,
                bridges,
            })
        }
    }
}
