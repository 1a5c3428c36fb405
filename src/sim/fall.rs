//! Fall resolution
//!
//! When an idle body loses support this picks how it goes down:
//! - lying cube with one half still on a tile: tip over that edge, then fall
//! - anything else: free fall, tumbling the way the last roll was turning
//!   when that can be recovered, otherwise straight down

use glam::Vec3;

use super::body::{Body, BodyKind, FreeFall, Motion};
use super::grid::{Half, Support};
use super::orientation::{Direction, Orientation, PivotSpec};

/// How an unsupported body leaves the grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FallPlan {
    /// Rotate 90° about the supported edge, then free fall
    EdgePivot { pivot: PivotSpec, then: FreeFall },
    Free(FreeFall),
}

impl FallPlan {
    pub fn into_motion(self) -> Motion {
        match self {
            FallPlan::EdgePivot { pivot, then } => Motion::EdgePivoting { pivot, then },
            FallPlan::Free(fall) => Motion::FreeFalling(fall),
        }
    }
}

/// Choose the fall for `body` given what the support probe found.
///
/// Returns `None` when the body is actually supported.
pub fn resolve_fall(body: &Body, support: Support) -> Option<FallPlan> {
    match support {
        Support::Full => None,
        Support::Partial { grounded } => Some(match body.support_orientation().long_axis() {
            Some(long) => edge_pivot(body.position, long, grounded),
            // Single-point probes never report a partial result
            None => FallPlan::Free(spin_from_last_move(body)),
        }),
        Support::None => Some(FallPlan::Free(spin_from_last_move(body))),
    }
}

/// Tip a lying cube off the side away from its grounded half
fn edge_pivot(position: Vec3, long_axis: Vec3, grounded: Half) -> FallPlan {
    let away = match grounded {
        Half::Low => long_axis,
        Half::High => -long_axis,
    };
    let direction = Direction::from_travel(away);
    // Bottom edge under the center, where the two halves meet
    let pivot_point = position - Vec3::Y * 0.5;
    FallPlan::EdgePivot {
        pivot: PivotSpec::quarter_turn(pivot_point, direction.axis(), direction.sign()),
        then: FreeFall::tumbling(direction),
    }
}

/// Free fall for a body with nothing underneath
fn spin_from_last_move(body: &Body) -> FreeFall {
    let Some(last) = body.last_move else {
        return FreeFall::straight();
    };

    let direction = match (body.kind, body.orientation) {
        (BodyKind::Unit, _) | (BodyKind::Tall, Orientation::Vertical) => {
            // Whichever intent component dominated picks the axis
            if last.x.abs() >= last.y.abs() {
                if last.x > 0.0 { Direction::East } else { Direction::West }
            } else if last.y > 0.0 {
                Direction::North
            } else {
                Direction::South
            }
        }
        (BodyKind::Tall, lying) => {
            let Some(long) = lying.long_axis() else {
                return FreeFall::straight();
            };
            if body.orientation_before_move == Orientation::Vertical {
                // Toppled from upright: keep tumbling end over end along the
                // long axis, in the sense of the x/z intent that caused it
                let along = if long == Vec3::X { last.x } else { last.y };
                if along == 0.0 {
                    return FreeFall::straight();
                }
                toward(long, along)
            } else if body.orientation_before_move == lying {
                // Rolled sideways: keep rolling about the long axis
                let across = if long == Vec3::X { last.y } else { last.x };
                if across == 0.0 {
                    return FreeFall::straight();
                }
                toward(if long == Vec3::X { Vec3::Z } else { Vec3::X }, across)
            } else {
                return FreeFall::straight();
            }
        }
    };

    log::debug!("Body {} tumbling {:?} off the grid", body.id, direction);
    FreeFall::tumbling(direction)
}

/// Roll direction for an intent component along a world axis
fn toward(axis: Vec3, component: f32) -> Direction {
    match (axis == Vec3::X, component > 0.0) {
        (true, true) => Direction::East,
        (true, false) => Direction::West,
        (false, true) => Direction::North,
        (false, false) => Direction::South,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::Spin;
    use glam::{IVec2, Vec2};

    fn lying_x(x: f32) -> Body {
        Body::lying(1, Vec3::new(x, 0.5, 0.0), Orientation::HorizontalX)
    }

    #[test]
    fn test_supported_body_does_not_fall() {
        assert_eq!(resolve_fall(&lying_x(2.5), Support::Full), None);
    }

    #[test]
    fn test_edge_pivot_away_from_grounded_low_half() {
        // Spanning cells 2 and 3 with only cell 2 under it
        let body = lying_x(2.5);
        let plan = resolve_fall(&body, Support::Partial { grounded: Half::Low }).unwrap();
        let FallPlan::EdgePivot { pivot, then } = plan else {
            panic!("expected edge pivot, got {:?}", plan);
        };
        assert_eq!(pivot.pivot_point, Vec3::new(2.5, 0.0, 0.0));
        assert_eq!(pivot.axis, Vec3::Z);
        // Tipping toward +X turns negatively about Z
        assert_eq!(pivot.direction, -1.0);
        assert_eq!(pivot.total_angle, 90.0);
        assert_eq!(then.spin, Some(Spin { axis: Vec3::Z, direction: -1.0 }));
        assert_eq!(then.drift, Vec3::X);
    }

    #[test]
    fn test_edge_pivot_away_from_grounded_high_half() {
        let body = Body::lying(1, Vec3::new(1.0, 0.5, 4.5), Orientation::HorizontalZ);
        let plan = resolve_fall(&body, Support::Partial { grounded: Half::High }).unwrap();
        let FallPlan::EdgePivot { pivot, then } = plan else {
            panic!("expected edge pivot");
        };
        assert_eq!(pivot.axis, Vec3::X);
        // Tipping toward -Z turns negatively about X
        assert_eq!(pivot.direction, -1.0);
        assert_eq!(then.drift, Vec3::NEG_Z);
    }

    #[test]
    fn test_vertical_fall_uses_dominant_intent_axis() {
        let mut body = Body::tall(1, IVec2::new(0, 0));
        body.last_move = Some(Vec2::new(0.0, -1.0));
        let Some(FallPlan::Free(fall)) = resolve_fall(&body, Support::None) else {
            panic!("expected free fall");
        };
        assert_eq!(fall.spin, Some(Spin { axis: Vec3::X, direction: 1.0 }));
        assert_eq!(fall.drift, Vec3::Z);
    }

    #[test]
    fn test_no_last_move_falls_straight() {
        let body = Body::tall(1, IVec2::new(0, 0));
        assert_eq!(
            resolve_fall(&body, Support::None),
            Some(FallPlan::Free(FreeFall::straight()))
        );
        // Freshly merged cubes have no history either
        assert_eq!(
            resolve_fall(&lying_x(0.5), Support::None),
            Some(FallPlan::Free(FreeFall::straight()))
        );
    }

    #[test]
    fn test_toppled_cube_keeps_tumbling_forward() {
        let mut body = lying_x(3.5);
        body.orientation_before_move = Orientation::Vertical;
        body.last_move = Some(Vec2::X);
        let Some(FallPlan::Free(fall)) = resolve_fall(&body, Support::None) else {
            panic!("expected free fall");
        };
        assert_eq!(fall, FreeFall::tumbling(Direction::East));
    }

    #[test]
    fn test_sideways_roll_keeps_rolling() {
        let mut body = lying_x(3.5);
        body.orientation_before_move = Orientation::HorizontalX;
        body.last_move = Some(Vec2::Y);
        let Some(FallPlan::Free(fall)) = resolve_fall(&body, Support::None) else {
            panic!("expected free fall");
        };
        assert_eq!(fall, FreeFall::tumbling(Direction::North));
        assert_eq!(fall.spin.map(|s| s.axis), Some(Vec3::X));
    }

    #[test]
    fn test_unit_cube_tumbles_like_upright_cube() {
        let mut body = Body::unit(2, Vec3::new(1.0, 0.5, 1.0));
        body.last_move = Some(Vec2::NEG_X);
        let Some(FallPlan::Free(fall)) = resolve_fall(&body, Support::None) else {
            panic!("expected free fall");
        };
        assert_eq!(fall, FreeFall::tumbling(Direction::West));
    }
}
