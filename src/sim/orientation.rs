//! Orientation state machine and roll table
//!
//! A 1x2x1 cube is either upright or lying along X or Z. Each cardinal move
//! is a 90° turn about one bottom edge of the cube; the table below says which
//! edge, about which axis, in which sense, and what orientation results.
//!
//! Positive intent rolls the cube toward the negative world axis (East goes
//! to -X, North to -Z). The level loader mirrors map columns the same way,
//! so on the map East still means "next column".

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::ROLL_ANGLE;

/// Resting pose of the 1x2x1 cube
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Upright, one-cell footprint
    #[default]
    Vertical,
    /// Lying with its long axis along X
    HorizontalX,
    /// Lying with its long axis along Z
    HorizontalZ,
}

impl Orientation {
    pub fn is_vertical(&self) -> bool {
        *self == Orientation::Vertical
    }

    /// Number of cells under the cube
    pub fn footprint_len(&self) -> usize {
        match self {
            Orientation::Vertical => 1,
            _ => 2,
        }
    }

    /// Unit vector along the long axis, if lying down
    pub fn long_axis(&self) -> Option<Vec3> {
        match self {
            Orientation::Vertical => None,
            Orientation::HorizontalX => Some(Vec3::X),
            Orientation::HorizontalZ => Some(Vec3::Z),
        }
    }
}

/// Cardinal move, named by intent: East/West is ±x of the intent vector,
/// North/South is ±y
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    East,
    West,
    North,
    South,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::East,
        Direction::West,
        Direction::North,
        Direction::South,
    ];

    /// Snap an intent vector to a move.
    ///
    /// Exactly one component must reach `threshold` in magnitude; weak and
    /// diagonal intents yield `None`.
    pub fn from_intent(intent: Vec2, threshold: f32) -> Option<Self> {
        let x = intent.x.abs() >= threshold;
        let y = intent.y.abs() >= threshold;
        match (x, y) {
            (true, false) if intent.x > 0.0 => Some(Direction::East),
            (true, false) => Some(Direction::West),
            (false, true) if intent.y > 0.0 => Some(Direction::North),
            (false, true) => Some(Direction::South),
            _ => None,
        }
    }

    /// Direction whose roll carries a cube along `travel` (a signed world axis)
    pub fn from_travel(travel: Vec3) -> Self {
        if travel.x.abs() >= travel.z.abs() {
            if travel.x < 0.0 {
                Direction::East
            } else {
                Direction::West
            }
        } else if travel.z < 0.0 {
            Direction::North
        } else {
            Direction::South
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
        }
    }

    /// Unit intent vector that produces this move
    pub fn intent(&self) -> Vec2 {
        match self {
            Direction::East => Vec2::X,
            Direction::West => Vec2::NEG_X,
            Direction::North => Vec2::Y,
            Direction::South => Vec2::NEG_Y,
        }
    }

    /// Rotation axis of a roll in this direction
    pub fn axis(&self) -> Vec3 {
        match self {
            Direction::East | Direction::West => Vec3::Z,
            Direction::North | Direction::South => Vec3::X,
        }
    }

    /// Sense of rotation about [`Direction::axis`]
    pub fn sign(&self) -> f32 {
        match self {
            Direction::East | Direction::South => 1.0,
            Direction::West | Direction::North => -1.0,
        }
    }

    /// World displacement direction of a roll
    pub fn travel(&self) -> Vec3 {
        match self {
            Direction::East => Vec3::NEG_X,
            Direction::West => Vec3::X,
            Direction::North => Vec3::NEG_Z,
            Direction::South => Vec3::Z,
        }
    }
}

/// An in-progress rotation about a line in space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotSpec {
    /// A point on the pivot line
    pub pivot_point: Vec3,
    /// Unit direction of the pivot line
    pub axis: Vec3,
    /// Full sweep in degrees
    pub total_angle: f32,
    /// Degrees left to sweep (never negative)
    pub remaining_angle: f32,
    /// +1 or -1
    pub direction: f32,
}

impl PivotSpec {
    pub fn quarter_turn(pivot_point: Vec3, axis: Vec3, direction: f32) -> Self {
        Self {
            pivot_point,
            axis,
            total_angle: ROLL_ANGLE,
            remaining_angle: ROLL_ANGLE,
            direction,
        }
    }

    /// Consume up to `amount` degrees.
    ///
    /// Returns the signed angle to apply this step and whether the sweep is
    /// finished. The last step is clamped to the exact remainder.
    pub fn advance(&mut self, amount: f32) -> (f32, bool) {
        if amount >= self.remaining_angle {
            let step = self.remaining_angle;
            self.remaining_angle = 0.0;
            (step * self.direction, true)
        } else {
            self.remaining_angle -= amount;
            (amount * self.direction, false)
        }
    }

    pub fn swept(&self) -> f32 {
        self.total_angle - self.remaining_angle
    }
}

/// A planned roll: how to rotate and the orientation once done
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollPlan {
    pub pivot: PivotSpec,
    pub next: Orientation,
}

/// Pivot offset (from the cube center) and resulting orientation for a
/// 1x2x1 cube
fn tall_edge(orientation: Orientation, direction: Direction) -> (Vec3, Orientation) {
    use Direction::*;
    use Orientation::*;
    match (orientation, direction) {
        (Vertical, East) => (Vec3::new(-0.5, -1.0, 0.0), HorizontalX),
        (Vertical, West) => (Vec3::new(0.5, -1.0, 0.0), HorizontalX),
        (Vertical, North) => (Vec3::new(0.0, -1.0, -0.5), HorizontalZ),
        (Vertical, South) => (Vec3::new(0.0, -1.0, 0.5), HorizontalZ),

        (HorizontalX, East) => (Vec3::new(-1.0, -0.5, 0.0), Vertical),
        (HorizontalX, West) => (Vec3::new(1.0, -0.5, 0.0), Vertical),
        (HorizontalX, North) => (Vec3::new(0.0, -0.5, -0.5), HorizontalX),
        (HorizontalX, South) => (Vec3::new(0.0, -0.5, 0.5), HorizontalX),

        (HorizontalZ, East) => (Vec3::new(-0.5, -0.5, 0.0), HorizontalZ),
        (HorizontalZ, West) => (Vec3::new(0.5, -0.5, 0.0), HorizontalZ),
        (HorizontalZ, North) => (Vec3::new(0.0, -0.5, -1.0), Vertical),
        (HorizontalZ, South) => (Vec3::new(0.0, -0.5, 1.0), Vertical),
    }
}

/// Roll table for the 1x2x1 cube
pub fn plan_roll(orientation: Orientation, direction: Direction, position: Vec3) -> RollPlan {
    let (offset, next) = tall_edge(orientation, direction);
    RollPlan {
        pivot: PivotSpec::quarter_turn(position + offset, direction.axis(), direction.sign()),
        next,
    }
}

/// Roll table for a unit cube; it is upright in every pose
pub fn plan_unit_roll(direction: Direction, position: Vec3) -> RollPlan {
    let offset = match direction {
        Direction::East => Vec3::new(-0.5, -0.5, 0.0),
        Direction::West => Vec3::new(0.5, -0.5, 0.0),
        Direction::North => Vec3::new(0.0, -0.5, -0.5),
        Direction::South => Vec3::new(0.0, -0.5, 0.5),
    };
    RollPlan {
        pivot: PivotSpec::quarter_turn(position + offset, direction.axis(), direction.sign()),
        next: Orientation::Vertical,
    }
}
