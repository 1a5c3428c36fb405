//! Simulation tick
//!
//! Advances every live body by one step. Idle bodies check their support,
//! then the tile they rest on, then input; moving bodies resume their roll or
//! fall. Bodies are independent within a tick apart from the merge check.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{Body, FreeFall, Motion, StepOutcome};
use super::fall::resolve_fall;
use super::formation::{Controlled, Layout};
use super::grid::{CellKind, LevelGrid};
use super::state::{EventSink, GameEvent, LevelPhase, Simulation};
use super::switches::SwitchChange;
use crate::tuning::Tuning;
use crate::{cell_center, cell_of};

/// Input for a single tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickInput {
    /// Movement intent, components in [-1, 1]
    pub intent: Vec2,
    /// Hand control to the other unit cube
    pub switch_control: bool,
}

impl TickInput {
    pub fn intent(intent: Vec2) -> Self {
        Self {
            intent,
            ..Default::default()
        }
    }
}

/// Advance the simulation by `dt` seconds
pub fn tick<G: LevelGrid, S: EventSink>(sim: &mut Simulation<G>, input: &TickInput, dt: f32, sink: &mut S) {
    // The main cube is retired once it reaches the goal
    if sim.phase == LevelPhase::Complete {
        return;
    }
    sim.time_ticks += 1;

    if input.switch_control && sim.phase == LevelPhase::Playing {
        if let Some(controlled) = sim.formation.switch_control() {
            sink.emit(GameEvent::ControlSwitched { controlled });
        }
    }

    if sim.formation.is_split() {
        tick_split(sim, input.intent, dt, sink);
    } else {
        tick_unified(sim, input.intent, dt, sink);
    }

    if sim.phase != LevelPhase::Complete {
        update_switches(sim, sink);
    }
}

/// Report what a motion step produced
fn report_step<S: EventSink>(body: &Body, outcome: StepOutcome, phase: &mut LevelPhase, sink: &mut S) {
    match outcome {
        StepOutcome::Fell => {
            log::info!("Body {} fell off the level", body.id);
            if *phase == LevelPhase::Playing {
                *phase = LevelPhase::Failed;
            }
            sink.emit(GameEvent::CubeFell { body: body.id });
        }
        StepOutcome::TippedOver => log::debug!("Body {} tipped over the edge", body.id),
        StepOutcome::RollFinished | StepOutcome::Continuing => {}
    }
}

/// Start a fall if nothing holds the body up. Returns true if it is falling.
fn start_fall_if_unsupported<G: LevelGrid>(body: &mut Body, grid: &G) -> bool {
    let support = grid.support_under(body.position, body.support_orientation());
    match resolve_fall(body, support) {
        Some(plan) => {
            log::info!("Body {} lost support ({:?})", body.id, support);
            body.motion = plan.into_motion();
            true
        }
        None => false,
    }
}

fn start_roll<S: EventSink>(body: &mut Body, intent: Vec2, tuning: &Tuning, sink: &mut S) {
    if let Some(direction) = body.try_start_roll(intent, tuning) {
        sink.emit(GameEvent::Moved {
            body: body.id,
            direction,
        });
    }
}

fn tick_unified<G: LevelGrid, S: EventSink>(sim: &mut Simulation<G>, intent: Vec2, dt: f32, sink: &mut S) {
    let was_idle = sim.formation.main.is_idle();
    let outcome = sim.formation.main.step(dt, &sim.tuning);
    report_step(&sim.formation.main, outcome, &mut sim.phase, sink);

    // Support is only checked between moves
    if !was_idle || start_fall_if_unsupported(&mut sim.formation.main, &sim.grid) {
        return;
    }
    if sim.phase != LevelPhase::Playing {
        return;
    }

    let main = &sim.formation.main;
    if main.is_vertical() {
        let cell = cell_of(main.position);
        match sim.grid.cell_kind_at(cell) {
            CellKind::Goal if !sim.goal_reached => {
                log::info!("Goal reached at {}", cell);
                sim.goal_reached = true;
                sim.phase = LevelPhase::Complete;
                sink.emit(GameEvent::GoalReached);
                return;
            }
            CellKind::Hazard => {
                let offset = (main.position - cell_center(cell, main.position.y)).abs();
                let tolerance = sim.tuning.hazard_tolerance;
                if offset.x < tolerance && offset.z < tolerance && sim.grid.consume_hazard_at(cell) {
                    log::info!("Hazard tile at {} gave way", cell);
                    sim.formation.main.motion = Motion::FreeFalling(FreeFall::straight());
                    sink.emit(GameEvent::HazardConsumed { cell });
                    return;
                }
            }
            CellKind::SplitTrigger => {
                if let (Some(a), Some(b)) = (sim.grid.split_spawn_a(), sim.grid.split_spawn_b()) {
                    let height = sim.tuning.small_spawn_height;
                    let ids = (sim.next_body_id(), sim.next_body_id());
                    if sim.formation.split(cell_center(a, height), cell_center(b, height), ids) {
                        sink.emit(GameEvent::Split { a: ids.0, b: ids.1 });
                        return;
                    }
                }
            }
            _ => {}
        }
    }

    start_roll(&mut sim.formation.main, intent, &sim.tuning, sink);
}

fn tick_split<G: LevelGrid, S: EventSink>(sim: &mut Simulation<G>, intent: Vec2, dt: f32, sink: &mut S) {
    let Simulation {
        grid,
        tuning,
        formation,
        phase,
        ..
    } = sim;
    let Layout::Split(pair) = &mut formation.layout else {
        return;
    };

    let controlled = pair.controlled;
    for (which, body) in [(Controlled::A, &mut pair.a), (Controlled::B, &mut pair.b)] {
        let was_idle = body.is_idle();
        let outcome = body.step(dt, tuning);
        report_step(body, outcome, phase, sink);

        // A cube that just landed is checked now so it cannot merge over a gap
        let landed = outcome == StepOutcome::RollFinished;
        if !(was_idle || landed) || start_fall_if_unsupported(body, grid) {
            continue;
        }
        // Only the controlled cube listens to input
        if was_idle && which == controlled && *phase == LevelPhase::Playing {
            start_roll(body, intent, tuning, sink);
        }
    }

    if let Some(merge) = formation.check_merge() {
        sink.emit(GameEvent::Merged {
            position: merge.position,
            orientation: merge.orientation,
        });
    }
}

fn update_switches<G: LevelGrid, S: EventSink>(sim: &mut Simulation<G>, sink: &mut S) {
    let bodies = sim.formation.live_bodies();
    for switch in &mut sim.switches {
        let (event, bridges) = match switch.update(&bodies, &mut sim.grid) {
            Some(SwitchChange::Pressed { cell, bridges }) => (GameEvent::SwitchPressed { cell }, bridges),
            Some(SwitchChange::Released { cell, bridges }) => (GameEvent::SwitchReleased { cell }, bridges),
            None => continue,
        };
        sink.emit(event);
        for (cell, open) in bridges {
            sink.emit(GameEvent::BridgeToggled { cell, open });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::body::Spin;
    use crate::sim::grid::Grid;
    use crate::sim::orientation::{Direction, Orientation};
    use crate::sim::switches::{Switch, SwitchKind, SwitchMode};
    use glam::{IVec2, Vec3};
    use proptest::prelude::*;

    fn strip(width: i32, spawn: i32) -> Grid {
        Grid::filled(width, 1, IVec2::new(spawn, 0))
    }

    fn sim(grid: Grid) -> Simulation {
        Simulation::new(grid, Tuning::default())
    }

    /// Tick with no input until the controlled body is idle again
    fn settle(sim: &mut Simulation, events: &mut Vec<GameEvent>) {
        let idle = TickInput::default();
        for _ in 0..1_000 {
            tick(sim, &idle, SIM_DT, events);
            if !sim.is_moving() && sim.controlled_body().move_cooldown == 0.0 {
                return;
            }
        }
        panic!("simulation never settled");
    }

    /// Issue one move and let it finish
    fn roll(sim: &mut Simulation, dir: Direction, events: &mut Vec<GameEvent>) {
        tick(sim, &TickInput::intent(dir.intent()), SIM_DT, events);
        assert!(sim.is_moving(), "{:?} did not start", dir);
        settle(sim, events);
    }

    fn count(events: &[GameEvent], pred: impl Fn(&GameEvent) -> bool) -> usize {
        events.iter().filter(|e| pred(*e)).count()
    }

    #[test]
    fn test_weak_intent_does_not_move() {
        let mut sim = sim(strip(8, 4));
        let mut events = Vec::new();
        tick(&mut sim, &TickInput::intent(Vec2::new(0.98, 0.0)), SIM_DT, &mut events);
        assert!(!sim.is_moving());
        assert!(events.is_empty());

        tick(&mut sim, &TickInput::intent(Vec2::new(0.99, 0.0)), SIM_DT, &mut events);
        assert!(sim.is_moving());
        assert_eq!(events, vec![GameEvent::Moved { body: 1, direction: Direction::East }]);
        settle(&mut sim, &mut events);
        assert_eq!(sim.current_orientation(), Orientation::HorizontalX);
    }

    #[test]
    fn test_roll_lands_exactly_on_two_cells() {
        let mut sim = sim(strip(8, 4));
        let mut events = Vec::new();
        tick(&mut sim, &TickInput::intent(Vec2::X), SIM_DT, &mut events);

        let idle = TickInput::default();
        while sim.is_moving() {
            if let Motion::Rotating { pivot, .. } = sim.formation.main.motion {
                assert!(pivot.remaining_angle >= 0.0 && pivot.remaining_angle <= 90.0);
            }
            tick(&mut sim, &idle, SIM_DT, &mut events);
        }
        assert_eq!(sim.current_orientation(), Orientation::HorizontalX);
        assert_eq!(sim.footprint_cells(), vec![IVec2::new(2, 0), IVec2::new(3, 0)]);
        assert_eq!(sim.formation.main.position, Vec3::new(2.5, 0.5, 0.0));
    }

    #[test]
    fn test_input_ignored_mid_roll() {
        let mut sim = sim(strip(8, 4));
        let mut events = Vec::new();
        tick(&mut sim, &TickInput::intent(Vec2::X), SIM_DT, &mut events);
        for _ in 0..5 {
            tick(&mut sim, &TickInput::intent(Vec2::Y), SIM_DT, &mut events);
        }
        assert_eq!(count(&events, |e| matches!(e, GameEvent::Moved { .. })), 1);
    }

    #[test]
    fn test_edge_pivot_then_free_fall() {
        // Floor on 0..=2, gap at 3, floor at 4
        let mut grid = strip(5, 0);
        grid.set(IVec2::new(3, 0), CellKind::Empty);
        let mut sim = sim(grid);
        sim.formation.main = Body::lying(1, Vec3::new(2.5, 0.5, 0.0), Orientation::HorizontalX);

        let mut events = Vec::new();
        let idle = TickInput::default();
        tick(&mut sim, &idle, SIM_DT, &mut events);
        let Motion::EdgePivoting { pivot, then } = sim.formation.main.motion else {
            panic!("expected edge pivot, got {:?}", sim.formation.main.motion);
        };
        assert_eq!(pivot.axis, Vec3::Z);
        assert_eq!(pivot.direction, -1.0);
        assert_eq!(then.spin, Some(Spin { axis: Vec3::Z, direction: -1.0 }));

        // Input is ignored while falling
        tick(&mut sim, &TickInput::intent(Vec2::X), SIM_DT, &mut events);
        assert!(events.is_empty());

        let mut ticks = 0;
        while matches!(sim.formation.main.motion, Motion::EdgePivoting { .. }) {
            tick(&mut sim, &idle, SIM_DT, &mut events);
            ticks += 1;
            assert!(ticks < 1_000);
        }
        let Motion::FreeFalling(fall) = sim.formation.main.motion else {
            panic!("expected free fall");
        };
        assert_eq!(fall.spin, Some(Spin { axis: Vec3::Z, direction: -1.0 }));
        assert_eq!(fall.drift, Vec3::X);

        for _ in 0..2_000 {
            tick(&mut sim, &idle, SIM_DT, &mut events);
        }
        assert_eq!(events, vec![GameEvent::CubeFell { body: 1 }]);
        assert_eq!(sim.phase, LevelPhase::Failed);
        // Drifted away from the grounded half
        assert!(sim.formation.main.position.x > 2.5);
    }

    #[test]
    fn test_rolling_off_the_edge_tumbles_forward() {
        let mut sim = sim(strip(3, 0));
        let mut events = Vec::new();
        // East from x = 0 lies over x = -1, -2: nothing underneath
        roll_no_settle(&mut sim, Direction::East, &mut events);
        let idle = TickInput::default();
        tick(&mut sim, &idle, SIM_DT, &mut events);
        let Motion::FreeFalling(fall) = sim.formation.main.motion else {
            panic!("expected free fall, got {:?}", sim.formation.main.motion);
        };
        assert_eq!(fall, FreeFall::tumbling(Direction::East));
    }

    fn roll_no_settle(sim: &mut Simulation, dir: Direction, events: &mut Vec<GameEvent>) {
        let idle = TickInput::default();
        tick(sim, &TickInput::intent(dir.intent()), SIM_DT, events);
        while matches!(sim.formation.main.motion, Motion::Rotating { .. }) {
            tick(sim, &idle, SIM_DT, events);
        }
    }

    #[test]
    fn test_goal_fires_once() {
        let mut grid = strip(6, 4);
        grid.set(IVec2::new(1, 0), CellKind::Goal);
        let mut sim = sim(grid);
        let mut events = Vec::new();

        roll(&mut sim, Direction::East, &mut events);
        roll_no_settle(&mut sim, Direction::East, &mut events);
        assert_eq!(sim.formation.main.position, Vec3::new(1.0, 1.0, 0.0));

        for _ in 0..10 {
            tick(&mut sim, &TickInput::intent(Vec2::X), SIM_DT, &mut events);
        }
        assert_eq!(count(&events, |e| *e == GameEvent::GoalReached), 1);
        assert_eq!(sim.phase, LevelPhase::Complete);
        assert!(!sim.is_moving());
        assert_eq!(sim.formation.main.position, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_lying_on_goal_does_not_finish() {
        let mut grid = strip(6, 4);
        grid.set(IVec2::new(3, 0), CellKind::Goal);
        let mut sim = sim(grid);
        let mut events = Vec::new();
        roll(&mut sim, Direction::East, &mut events);
        for _ in 0..5 {
            tick(&mut sim, &TickInput::default(), SIM_DT, &mut events);
        }
        assert!(!sim.goal_reached);
        assert_eq!(sim.phase, LevelPhase::Playing);
    }

    #[test]
    fn test_hazard_gives_way_under_upright_cube() {
        let mut grid = strip(6, 4);
        grid.set(IVec2::new(3, 0), CellKind::Hazard);
        grid.set(IVec2::new(1, 0), CellKind::Hazard);
        let mut sim = sim(grid);
        let mut events = Vec::new();

        // Lying across the hazard at 3 is safe
        roll(&mut sim, Direction::East, &mut events);
        tick(&mut sim, &TickInput::default(), SIM_DT, &mut events);
        assert_eq!(sim.grid.cell_kind_at(IVec2::new(3, 0)), CellKind::Hazard);

        // Standing on the one at 1 is not
        roll_no_settle(&mut sim, Direction::East, &mut events);
        tick(&mut sim, &TickInput::default(), SIM_DT, &mut events);
        assert_eq!(sim.grid.cell_kind_at(IVec2::new(1, 0)), CellKind::Empty);
        assert_eq!(sim.formation.main.motion, Motion::FreeFalling(FreeFall::straight()));

        for _ in 0..2_000 {
            tick(&mut sim, &TickInput::default(), SIM_DT, &mut events);
        }
        assert_eq!(count(&events, |e| matches!(e, GameEvent::HazardConsumed { .. })), 1);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::CubeFell { .. })), 1);
        assert_eq!(sim.formation.main.position.x, 1.0);
    }

    fn split_level() -> Grid {
        let mut grid = Grid::filled(9, 1, IVec2::new(5, 0));
        grid.set(IVec2::new(5, 0), CellKind::SplitTrigger);
        grid.set(IVec2::new(3, 0), CellKind::SplitSpawnA);
        grid.set(IVec2::new(7, 0), CellKind::SplitSpawnB);
        // Rebuild so the spawn cells are picked up
        let cells = (0..9).map(|x| grid.cell_kind_at(IVec2::new(x, 0))).collect();
        Grid::new(9, 1, cells, IVec2::new(5, 0))
    }

    #[test]
    fn test_split_on_trigger() {
        let mut sim = sim(split_level());
        let mut events = Vec::new();
        tick(&mut sim, &TickInput::default(), SIM_DT, &mut events);

        assert_eq!(events, vec![GameEvent::Split { a: 2, b: 3 }]);
        let pair = sim.formation.pair().unwrap();
        assert_eq!(pair.a.position, Vec3::new(3.0, 0.5, 0.0));
        assert_eq!(pair.b.position, Vec3::new(7.0, 0.5, 0.0));
        assert_eq!(pair.controlled, Controlled::A);
        assert_eq!(sim.live_bodies().len(), 2);
        assert!(sim.live_bodies().iter().all(|b| b.id != 1));

        // Staying split; the trigger does not fire again
        tick(&mut sim, &TickInput::default(), SIM_DT, &mut events);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::Split { .. })), 1);
    }

    #[test]
    fn test_only_controlled_cube_moves() {
        let mut sim = sim(split_level());
        let mut events = Vec::new();
        tick(&mut sim, &TickInput::default(), SIM_DT, &mut events);

        roll(&mut sim, Direction::West, &mut events);
        let pair = sim.formation.pair().unwrap();
        assert_eq!(pair.a.position, Vec3::new(4.0, 0.5, 0.0));
        assert_eq!(pair.b.position, Vec3::new(7.0, 0.5, 0.0));
    }

    #[test]
    fn test_switch_refused_mid_move() {
        let mut sim = sim(split_level());
        let mut events = Vec::new();
        tick(&mut sim, &TickInput::default(), SIM_DT, &mut events);
        tick(&mut sim, &TickInput::intent(Vec2::NEG_X), SIM_DT, &mut events);
        assert!(sim.is_moving());

        let switch = TickInput {
            switch_control: true,
            ..Default::default()
        };
        tick(&mut sim, &switch, SIM_DT, &mut events);
        assert_eq!(sim.formation.pair().unwrap().controlled, Controlled::A);

        settle(&mut sim, &mut events);
        tick(&mut sim, &switch, SIM_DT, &mut events);
        assert_eq!(sim.formation.pair().unwrap().controlled, Controlled::B);
        assert!(events.contains(&GameEvent::ControlSwitched { controlled: Controlled::B }));
    }

    #[test]
    fn test_walk_together_and_merge() {
        let mut sim = sim(split_level());
        let mut events = Vec::new();
        tick(&mut sim, &TickInput::default(), SIM_DT, &mut events);

        // A: 3 -> 4
        roll(&mut sim, Direction::West, &mut events);
        // B: 7 -> 6 -> 5
        let switch = TickInput {
            switch_control: true,
            ..Default::default()
        };
        tick(&mut sim, &switch, SIM_DT, &mut events);
        roll(&mut sim, Direction::East, &mut events);
        assert!(sim.is_split());
        tick(&mut sim, &TickInput::intent(Vec2::X), SIM_DT, &mut events);
        for _ in 0..200 {
            if !sim.is_split() {
                break;
            }
            tick(&mut sim, &TickInput::default(), SIM_DT, &mut events);
        }

        assert!(!sim.is_split());
        assert_eq!(
            events.last(),
            Some(&GameEvent::Merged { position: Vec3::new(4.5, 0.5, 0.0), orientation: Orientation::HorizontalX })
        );
        assert_eq!(sim.current_orientation(), Orientation::HorizontalX);
        assert_eq!(sim.footprint_cells(), vec![IVec2::new(4, 0), IVec2::new(5, 0)]);

        // The merged cube rolls with the main table again
        roll(&mut sim, Direction::West, &mut events);
        assert_eq!(sim.formation.main.position, Vec3::new(6.0, 1.0, 0.0));
        assert_eq!(sim.current_orientation(), Orientation::Vertical);
    }

    #[test]
    fn test_no_merge_when_landing_over_a_gap() {
        // A at (3, 0), B at (4, 1); the cell south of A is a hole
        let mut grid = Grid::filled(9, 2, IVec2::new(5, 0));
        grid.set(IVec2::new(5, 0), CellKind::SplitTrigger);
        grid.set(IVec2::new(3, 0), CellKind::SplitSpawnA);
        grid.set(IVec2::new(4, 1), CellKind::SplitSpawnB);
        grid.set(IVec2::new(3, 1), CellKind::Empty);
        let cells = (0..2)
            .flat_map(|z| (0..9).map(move |x| IVec2::new(x, z)))
            .map(|cell| grid.cell_kind_at(cell))
            .collect();
        let mut sim = sim(Grid::new(9, 2, cells, IVec2::new(5, 0)));
        let mut events = Vec::new();
        tick(&mut sim, &TickInput::default(), SIM_DT, &mut events);
        assert!(sim.is_split());

        // Rolling A south lands it beside B, over the hole
        tick(&mut sim, &TickInput::intent(Direction::South.intent()), SIM_DT, &mut events);
        for _ in 0..2_000 {
            tick(&mut sim, &TickInput::default(), SIM_DT, &mut events);
        }

        assert_eq!(count(&events, |e| matches!(e, GameEvent::Merged { .. })), 0);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::CubeFell { body: 2 })), 1);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::CubeFell { body: 1 })), 0);
        assert!(sim.is_split());
        assert_eq!(sim.phase, LevelPhase::Failed);
        let pair = sim.formation.pair().unwrap();
        assert_eq!(pair.b.position, Vec3::new(4.0, 0.5, 1.0));
    }

    #[test]
    fn test_unit_cube_falls_and_fails_level() {
        let mut sim = sim(split_level());
        let mut events = Vec::new();
        tick(&mut sim, &TickInput::default(), SIM_DT, &mut events);

        // Roll A north off the strip
        roll_unit_off(&mut sim, &mut events);
        for _ in 0..2_000 {
            tick(&mut sim, &TickInput::default(), SIM_DT, &mut events);
        }
        assert_eq!(count(&events, |e| matches!(e, GameEvent::CubeFell { body: 2 })), 1);
        assert_eq!(sim.phase, LevelPhase::Failed);
        // Other cube untouched and no longer takes input
        let pair = sim.formation.pair().unwrap();
        assert_eq!(pair.b.position, Vec3::new(7.0, 0.5, 0.0));
    }

    fn roll_unit_off(sim: &mut Simulation, events: &mut Vec<GameEvent>) {
        tick(sim, &TickInput::intent(Vec2::Y), SIM_DT, events);
        settle_rotation(sim, events);
        tick(sim, &TickInput::default(), SIM_DT, events);
        let pair = sim.formation.pair().unwrap();
        assert!(pair.a.is_falling());
    }

    fn settle_rotation(sim: &mut Simulation, events: &mut Vec<GameEvent>) {
        while matches!(sim.controlled_body().motion, Motion::Rotating { .. }) {
            tick(sim, &TickInput::default(), SIM_DT, events);
        }
    }

    #[test]
    fn test_round_button_opens_bridge() {
        let mut grid = strip(6, 4);
        grid.set(IVec2::new(3, 0), CellKind::RoundButton);
        grid.set(IVec2::new(0, 0), CellKind::Bridge { open: false });
        let mut sim = sim(grid).with_switches(vec![Switch::new(
            IVec2::new(3, 0),
            SwitchKind::Round,
            SwitchMode::Toggle,
            vec![IVec2::new(0, 0)],
        )]);
        let mut events = Vec::new();

        roll(&mut sim, Direction::East, &mut events);
        assert!(events.contains(&GameEvent::SwitchPressed { cell: IVec2::new(3, 0) }));
        assert!(events.contains(&GameEvent::BridgeToggled { cell: IVec2::new(0, 0), open: true }));
        assert!(sim.grid.supports(IVec2::new(0, 0)));

        // Walking off releases without closing it again
        roll(&mut sim, Direction::East, &mut events);
        assert!(events.contains(&GameEvent::SwitchReleased { cell: IVec2::new(3, 0) }));
        assert!(sim.grid.supports(IVec2::new(0, 0)));
    }

    #[test]
    fn test_snapshot_resumes_identically() {
        let mut original = sim(Grid::filled(8, 8, IVec2::new(4, 4)));
        let mut events = Vec::new();
        tick(&mut original, &TickInput::intent(Vec2::NEG_Y), SIM_DT, &mut events);
        for _ in 0..7 {
            tick(&mut original, &TickInput::default(), SIM_DT, &mut events);
        }

        let json = serde_json::to_string(&original).unwrap();
        let mut restored: Simulation = serde_json::from_str(&json).unwrap();

        let inputs = [Vec2::ZERO, Vec2::X, Vec2::ZERO, Vec2::NEG_X, Vec2::Y];
        for intent in inputs.iter().cycle().take(300) {
            let input = TickInput::intent(*intent);
            tick(&mut original, &input, SIM_DT, &mut Vec::new());
            tick(&mut restored, &input, SIM_DT, &mut Vec::new());
        }
        assert_eq!(original.time_ticks, restored.time_ticks);
        assert_eq!(original.formation.main.position, restored.formation.main.position);
        assert_eq!(original.formation.main.orientation, restored.formation.main.orientation);
    }

    fn intent_strategy() -> impl Strategy<Value = Vec2> {
        prop_oneof![
            Just(Vec2::ZERO),
            Just(Vec2::X),
            Just(Vec2::NEG_X),
            Just(Vec2::Y),
            Just(Vec2::NEG_Y),
            Just(Vec2::new(0.7, 0.7)),
        ]
    }

    proptest! {
        #[test]
        fn prop_idle_bodies_rest_on_their_footprint(
            intents in prop::collection::vec(intent_strategy(), 1..200),
            dt in 0.004f32..0.05,
        ) {
            let mut sim = sim(Grid::filled(120, 120, IVec2::new(60, 60)));
            let mut events = Vec::new();
            for intent in intents {
                tick(&mut sim, &TickInput::intent(intent), dt, &mut events);
                let body = &sim.formation.main;
                if body.is_idle() {
                    let expected_height = if body.is_vertical() { 1.0 } else { 0.5 };
                    prop_assert_eq!(body.footprint_cells().len(), body.orientation.footprint_len());
                    prop_assert_eq!(body.position.y, expected_height);
                }
                if let Motion::Rotating { pivot, .. } = body.motion {
                    prop_assert!(pivot.remaining_angle > 0.0 && pivot.remaining_angle <= 90.0);
                }
            }
            // Too far from the edge to roll off in 200 ticks
            prop_assert!(!events.iter().any(|e| matches!(e, GameEvent::CubeFell { .. })), "cube fell during random walk");
        }
    }
}
