//! Rollable bodies and their motion state machine
//!
//! The main 1x2x1 cube and the two unit cubes share one executor. A body is
//! always in exactly one [`Motion`] state; multi-tick rotations and falls keep
//! their progress inside the state and resume on the next tick.

use glam::{IVec2, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::orientation::{Direction, Orientation, PivotSpec, RollPlan, plan_roll, plan_unit_roll};
use crate::consts::{LYING_HEIGHT, TALL_VERTICAL_HEIGHT};
use crate::tuning::Tuning;
use crate::{cell_center, cell_of, snap_half};

/// Which roll table a body uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// The 1x2x1 cube
    Tall,
    /// A 1x1x1 half produced by a split
    Unit,
}

impl BodyKind {
    pub fn plan_roll(&self, orientation: Orientation, direction: Direction, position: Vec3) -> RollPlan {
        match self {
            BodyKind::Tall => plan_roll(orientation, direction, position),
            BodyKind::Unit => plan_unit_roll(direction, position),
        }
    }

    pub fn roll_speed(&self, tuning: &Tuning) -> f32 {
        match self {
            BodyKind::Tall => tuning.roll_speed,
            BodyKind::Unit => tuning.small_roll_speed,
        }
    }

    pub fn fall_floor(&self, tuning: &Tuning) -> f32 {
        match self {
            BodyKind::Tall => tuning.main_fall_floor,
            BodyKind::Unit => tuning.small_fall_floor,
        }
    }

    pub fn move_cooldown(&self, tuning: &Tuning) -> f32 {
        match self {
            BodyKind::Tall => 0.0,
            BodyKind::Unit => tuning.small_move_cooldown,
        }
    }
}

/// Continuous tumble while falling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spin {
    pub axis: Vec3,
    /// +1 or -1
    pub direction: f32,
}

impl Spin {
    /// Keep turning the way a roll in `direction` turns
    pub fn rolling(direction: Direction) -> Self {
        Self {
            axis: direction.axis(),
            direction: direction.sign(),
        }
    }
}

/// Free-fall progress
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreeFall {
    /// Downward speed (units per second)
    pub speed: f32,
    pub spin: Option<Spin>,
    /// Horizontal drift direction (unit or zero)
    pub drift: Vec3,
}

impl FreeFall {
    pub fn straight() -> Self {
        Self {
            speed: 0.0,
            spin: None,
            drift: Vec3::ZERO,
        }
    }

    /// Tumble toward the side a roll in `direction` travels
    pub fn tumbling(direction: Direction) -> Self {
        Self {
            speed: 0.0,
            spin: Some(Spin::rolling(direction)),
            drift: direction.travel(),
        }
    }
}

/// Motion sub-state; exactly one holds at any time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    Idle,
    /// Rolling a quarter turn; `next` is committed on completion
    Rotating { pivot: PivotSpec, next: Orientation },
    /// Tipping over the one supported edge before free fall
    EdgePivoting { pivot: PivotSpec, then: FreeFall },
    FreeFalling(FreeFall),
}

/// What a motion step produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Still mid-motion, or idle
    Continuing,
    /// A roll just finished; the body is idle again
    RollFinished,
    /// The edge pivot finished and free fall began
    TippedOver,
    /// Crossed the low-water mark for the first time
    Fell,
}

/// A cube that rolls across the grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: u32,
    pub kind: BodyKind,
    /// Center of the body
    pub position: Vec3,
    pub rotation: Quat,
    pub orientation: Orientation,
    pub motion: Motion,
    /// Intent of the most recent roll, if any
    pub last_move: Option<Vec2>,
    /// Orientation before the most recent roll started
    pub orientation_before_move: Orientation,
    /// Seconds until a unit cube accepts input again
    pub move_cooldown: f32,
    /// Latched once the body drops below its fall floor
    pub fell: bool,
}

impl Body {
    /// Upright main cube standing on `cell`
    pub fn tall(id: u32, cell: IVec2) -> Self {
        Self::new(id, BodyKind::Tall, cell_center(cell, TALL_VERTICAL_HEIGHT), Orientation::Vertical)
    }

    /// Unit cube centered at `position`
    pub fn unit(id: u32, position: Vec3) -> Self {
        Self::new(id, BodyKind::Unit, position, Orientation::Vertical)
    }

    /// Main cube lying at `position`
    pub fn lying(id: u32, position: Vec3, orientation: Orientation) -> Self {
        let mut body = Self::new(id, BodyKind::Tall, position, orientation);
        body.position.y = match orientation {
            Orientation::Vertical => TALL_VERTICAL_HEIGHT,
            _ => LYING_HEIGHT,
        };
        body.rotation = resting_rotation(orientation);
        body
    }

    fn new(id: u32, kind: BodyKind, position: Vec3, orientation: Orientation) -> Self {
        Self {
            id,
            kind,
            position,
            rotation: resting_rotation(orientation),
            orientation,
            motion: Motion::Idle,
            last_move: None,
            orientation_before_move: orientation,
            move_cooldown: 0.0,
            fell: false,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.motion, Motion::Idle)
    }

    /// True unless idle
    pub fn is_moving(&self) -> bool {
        !self.is_idle()
    }

    pub fn is_falling(&self) -> bool {
        matches!(self.motion, Motion::EdgePivoting { .. } | Motion::FreeFalling(_))
    }

    pub fn is_vertical(&self) -> bool {
        self.orientation.is_vertical()
    }

    /// Orientation used for support probes; unit cubes always probe one point
    pub fn support_orientation(&self) -> Orientation {
        match self.kind {
            BodyKind::Tall => self.orientation,
            BodyKind::Unit => Orientation::Vertical,
        }
    }

    /// Cells under the body (one or two)
    pub fn footprint_cells(&self) -> Vec<IVec2> {
        match self.support_orientation().long_axis() {
            None => vec![cell_of(self.position)],
            Some(axis) => vec![
                cell_of(self.position - axis * 0.5),
                cell_of(self.position + axis * 0.5),
            ],
        }
    }

    /// Begin a roll if idle, off cooldown, and the intent is a clean cardinal.
    pub fn try_start_roll(&mut self, intent: Vec2, tuning: &Tuning) -> Option<Direction> {
        if !self.is_idle() || self.move_cooldown > 0.0 {
            return None;
        }
        let direction = Direction::from_intent(intent, tuning.intent_threshold)?;

        self.orientation_before_move = self.orientation;
        self.last_move = Some(direction.intent());
        let plan = self.kind.plan_roll(self.orientation, direction, self.position);
        self.motion = Motion::Rotating {
            pivot: plan.pivot,
            next: plan.next,
        };
        log::debug!("Body {} rolling {:?} from {:?}", self.id, direction, self.orientation);
        Some(direction)
    }

    /// Rotate the whole body about a line through `pivot` along `axis`
    fn rotate_about(&mut self, pivot: Vec3, axis: Vec3, degrees: f32) {
        let q = Quat::from_axis_angle(axis, degrees.to_radians());
        self.position = pivot + q * (self.position - pivot);
        self.rotation = (q * self.rotation).normalize();
    }

    /// Advance whichever multi-tick motion is active. Idle bodies are left
    /// alone; the idle logic lives with the caller, which owns the grid.
    pub fn step(&mut self, dt: f32, tuning: &Tuning) -> StepOutcome {
        if self.move_cooldown > 0.0 {
            self.move_cooldown = (self.move_cooldown - dt).max(0.0);
        }

        match self.motion {
            Motion::Idle => StepOutcome::Continuing,

            Motion::Rotating { mut pivot, next } => {
                let (angle, done) = pivot.advance(self.kind.roll_speed(tuning) * dt);
                self.rotate_about(pivot.pivot_point, pivot.axis, angle);
                if done {
                    self.orientation = next;
                    self.position = snap_half(self.position);
                    self.rotation = snap_rotation(self.rotation);
                    self.motion = Motion::Idle;
                    self.move_cooldown = self.kind.move_cooldown(tuning);
                    StepOutcome::RollFinished
                } else {
                    self.motion = Motion::Rotating { pivot, next };
                    StepOutcome::Continuing
                }
            }

            Motion::EdgePivoting { mut pivot, then } => {
                pivot.pivot_point.y -= tuning.pivot_sink_rate * dt;
                let (angle, done) = pivot.advance(tuning.fall_rot_speed * dt);
                self.rotate_about(pivot.pivot_point, pivot.axis, angle);
                if done {
                    self.motion = Motion::FreeFalling(then);
                    StepOutcome::TippedOver
                } else {
                    self.motion = Motion::EdgePivoting { pivot, then };
                    StepOutcome::Continuing
                }
            }

            Motion::FreeFalling(mut fall) => {
                if self.fell {
                    return StepOutcome::Continuing;
                }
                fall.speed += tuning.gravity * dt;
                self.position.y -= fall.speed * dt;
                self.position += fall.drift * tuning.fall_drift * dt;
                if let Some(spin) = fall.spin {
                    let q = Quat::from_axis_angle(
                        spin.axis,
                        (spin.direction * tuning.fall_spin_rate * dt).to_radians(),
                    );
                    self.rotation = (q * self.rotation).normalize();
                }
                self.motion = Motion::FreeFalling(fall);

                if self.position.y < self.kind.fall_floor(tuning) {
                    self.fell = true;
                    StepOutcome::Fell
                } else {
                    StepOutcome::Continuing
                }
            }
        }
    }
}

/// Body rotation for a resting orientation
pub fn resting_rotation(orientation: Orientation) -> Quat {
    match orientation {
        Orientation::Vertical => Quat::IDENTITY,
        Orientation::HorizontalX => Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        Orientation::HorizontalZ => Quat::from_rotation_x(std::f32::consts::FRAC_PI_2),
    }
}

/// Remove float drift from a rotation built from quarter turns
fn snap_rotation(q: Quat) -> Quat {
    // Quarter-turn compositions only ever have components in {0, ±1/2, ±√2/2, ±1}
    let snap = |c: f32| {
        const CANDIDATES: [f32; 4] = [0.0, 0.5, std::f32::consts::FRAC_1_SQRT_2, 1.0];
        let magnitude = CANDIDATES
            .iter()
            .copied()
            .min_by(|a, b| (c.abs() - a).abs().total_cmp(&(c.abs() - b).abs()))
            .unwrap_or(0.0);
        magnitude.copysign(c)
    };
    Quat::from_xyzw(snap(q.x), snap(q.y), snap(q.z), snap(q.w)).normalize()
}
