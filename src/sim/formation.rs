//! Split/merge bookkeeping
//!
//! Owns every body. While unified only the main cube is live; while split the
//! main cube is parked and two unit cubes take over, one of them under player
//! control.

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::orientation::Orientation;

/// Which unit cube receives input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Controlled {
    A,
    B,
}

impl Controlled {
    pub fn other(&self) -> Self {
        match self {
            Controlled::A => Controlled::B,
            Controlled::B => Controlled::A,
        }
    }
}

/// The two unit cubes of a split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitPair {
    pub a: Body,
    pub b: Body,
    pub controlled: Controlled,
}

impl SplitPair {
    pub fn controlled_body(&self) -> &Body {
        match self.controlled {
            Controlled::A => &self.a,
            Controlled::B => &self.b,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Layout {
    Unified,
    Split(SplitPair),
}

/// Result of a successful merge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub position: Vec3,
    pub orientation: Orientation,
}

/// All bodies of a level and how they are grouped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formation {
    /// The 1x2x1 cube; parked while split
    pub main: Body,
    pub layout: Layout,
}

impl Formation {
    pub fn new(main: Body) -> Self {
        Self {
            main,
            layout: Layout::Unified,
        }
    }

    pub fn is_split(&self) -> bool {
        matches!(self.layout, Layout::Split(_))
    }

    pub fn pair(&self) -> Option<&SplitPair> {
        match &self.layout {
            Layout::Split(pair) => Some(pair),
            Layout::Unified => None,
        }
    }

    /// The body that currently receives input
    pub fn controlled_body(&self) -> &Body {
        match &self.layout {
            Layout::Unified => &self.main,
            Layout::Split(pair) => pair.controlled_body(),
        }
    }

    /// Bodies currently in play
    pub fn live_bodies(&self) -> Vec<&Body> {
        match &self.layout {
            Layout::Unified => vec![&self.main],
            Layout::Split(pair) => vec![&pair.a, &pair.b],
        }
    }

    /// Split the main cube into unit cubes at `pos_a` and `pos_b`.
    ///
    /// No-op unless unified with the main cube upright and idle. Unit cube A
    /// starts under control.
    pub fn split(&mut self, pos_a: Vec3, pos_b: Vec3, ids: (u32, u32)) -> bool {
        if self.is_split() || !self.main.is_vertical() || !self.main.is_idle() {
            return false;
        }
        self.layout = Layout::Split(SplitPair {
            a: Body::unit(ids.0, pos_a),
            b: Body::unit(ids.1, pos_b),
            controlled: Controlled::A,
        });
        log::info!("Cube split at {} -> {} / {}", self.main.position, pos_a, pos_b);
        true
    }

    /// Hand control to the other unit cube.
    ///
    /// No-op unless split and the controlled cube is idle.
    pub fn switch_control(&mut self) -> Option<Controlled> {
        let Layout::Split(pair) = &mut self.layout else {
            return None;
        };
        if pair.controlled_body().is_moving() {
            return None;
        }
        pair.controlled = pair.controlled.other();
        log::debug!("Control switched to unit cube {:?}", pair.controlled);
        Some(pair.controlled)
    }

    /// Rejoin the unit cubes if both are idle and exactly one cell apart
    /// along X or Z at the same height.
    ///
    /// The main cube comes back lying between them along the join axis.
    pub fn check_merge(&mut self) -> Option<Merge> {
        let Layout::Split(pair) = &self.layout else {
            return None;
        };
        if !pair.a.is_idle() || !pair.b.is_idle() {
            return None;
        }

        let offset = (pair.b.position - pair.a.position).round();
        let offset = IVec3::new(offset.x as i32, offset.y as i32, offset.z as i32);
        let orientation = match (offset.x.abs(), offset.y, offset.z.abs()) {
            (1, 0, 0) => Orientation::HorizontalX,
            (0, 0, 1) => Orientation::HorizontalZ,
            _ => return None,
        };

        let position = (pair.a.position + pair.b.position) / 2.0;
        self.main = Body::lying(self.main.id, position, orientation);
        self.layout = Layout::Unified;
        log::info!("Cubes merged at {} ({:?})", self.main.position, orientation);
        Some(Merge {
            position: self.main.position,
            orientation,
        })
    }

    /// Mutable access to every live body, main cube first when unified
    pub fn live_bodies_mut(&mut self) -> Vec<&mut Body> {
        match &mut self.layout {
            Layout::Unified => vec![&mut self.main],
            Layout::Split(pair) => vec![&mut pair.a, &mut pair.b],
        }
    }
}
