/*
 * Copyright (C) 2023 Asim Ihsan
 * SPDX-License-Identifier: AGPL-3.0-only
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU Affero General Public License as published by the Free
 * Software Foundation, version 3.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A
 * PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License along
 * with this program. If not, see <https://www.gnu.org/licenses/>
 */

//! The vacuum world as a search problem: a robot on an n×n grid and a set of dirty cells.
//!
//! See Chapter 3: Solving Problems by Searching, section 3.2.1 (the vacuum world).

use std::collections::BTreeSet;
use std::fmt::Display;
use std::mem::size_of;

use graph_search::{Cost, Heuristic, Successor};
use serde::{Deserialize, Serialize};

/// Every action costs the same.
pub const STEP_COST: Cost = 1;

/// A cell of the grid, row first. Ordered row-major so sets of positions have a canonical order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Whether the position lies on an n×n grid.
    pub fn in_bounds(&self, grid_size: i32) -> bool {
        (0..grid_size).contains(&self.row) && (0..grid_size).contains(&self.col)
    }

    /// Moves needed to walk from one cell to the other. Exact for any pair of `i32` coordinates.
    pub fn manhattan_distance(&self, other: &Position) -> Cost {
        Cost::from(self.row.abs_diff(other.row)) + Cost::from(self.col.abs_diff(other.col))
    }

    fn offset(&self, (d_row, d_col): (i32, i32)) -> Position {
        Position::new(self.row + d_row, self.col + d_col)
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(i32, i32)> for Position {
    fn from((row, col): (i32, i32)) -> Self {
        Position::new(row, col)
    }
}

/// Robot action. `Up` decreases the row, `Left` decreases the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VacuumAction {
    Up,
    Down,
    Left,
    Right,
    Suck,
}

impl graph_search::Action for VacuumAction {}

impl VacuumAction {
    /// All actions, in the order successors are generated.
    pub const ALL: [VacuumAction; 5] = [
        VacuumAction::Up,
        VacuumAction::Down,
        VacuumAction::Left,
        VacuumAction::Right,
        VacuumAction::Suck,
    ];

    /// Row and column change of a move, `None` for `Suck`.
    pub fn offset(&self) -> Option<(i32, i32)> {
        match self {
            VacuumAction::Up => Some((-1, 0)),
            VacuumAction::Down => Some((1, 0)),
            VacuumAction::Left => Some((0, -1)),
            VacuumAction::Right => Some((0, 1)),
            VacuumAction::Suck => None,
        }
    }
}

impl Display for VacuumAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VacuumAction::Up => write!(f, "Up"),
            VacuumAction::Down => write!(f, "Down"),
            VacuumAction::Left => write!(f, "Left"),
            VacuumAction::Right => write!(f, "Right"),
            VacuumAction::Suck => write!(f, "Suck"),
        }
    }
}

/// An invalid grid configuration. Detected before any state is built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// The grid must have at least one cell.
    #[error("invalid grid size: {0}")]
    InvalidGridSize(i32),

    /// The robot is not on the grid.
    #[error("robot position {position} is outside the {grid_size}x{grid_size} grid")]
    RobotOutOfBounds { position: Position, grid_size: i32 },

    /// A dirty cell is not on the grid.
    #[error("dirty cell {position} is outside the {grid_size}x{grid_size} grid")]
    DirtOutOfBounds { position: Position, grid_size: i32 },
}

/// Robot position plus the set of dirty cells.
///
/// Immutable: transitions build new states. Equality and hashing use the robot position and the
/// dirty set, which is kept sorted, so equal states always hash the same.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VacuumState {
    robot: Position,
    dirty: BTreeSet<Position>,
}

impl VacuumState {
    // Callers outside this module go through `initial_state`.
    pub(crate) fn new_unchecked(robot: Position, dirty: BTreeSet<Position>) -> Self {
        Self { robot, dirty }
    }

    pub fn robot(&self) -> Position {
        self.robot
    }

    pub fn dirty(&self) -> &BTreeSet<Position> {
        &self.dirty
    }

    pub fn is_dirty(&self, position: &Position) -> bool {
        self.dirty.contains(position)
    }

    /// Check the state against an n×n grid.
    pub fn validate(&self, grid_size: i32) -> Result<(), ConfigurationError> {
        if grid_size < 1 {
            return Err(ConfigurationError::InvalidGridSize(grid_size));
        }
        if !self.robot.in_bounds(grid_size) {
            return Err(ConfigurationError::RobotOutOfBounds {
                position: self.robot,
                grid_size,
            });
        }
        match self.dirty.iter().find(|cell| !cell.in_bounds(grid_size)) {
            Some(cell) => Err(ConfigurationError::DirtOutOfBounds {
                position: *cell,
                grid_size,
            }),
            None => Ok(()),
        }
    }
}

impl graph_search::State for VacuumState {
    fn heap_size(&self) -> usize {
        self.dirty.len() * size_of::<Position>()
    }
}

/// Build a validated initial state. Fails without building anything if the grid size is not
/// positive or the robot or any dirty cell lies outside the grid.
pub fn initial_state<I>(
    grid_size: i32,
    robot: Position,
    dirty: I,
) -> Result<VacuumState, ConfigurationError>
where
    I: IntoIterator<Item = Position>,
{
    let state = VacuumState::new_unchecked(robot, dirty.into_iter().collect());
    state.validate(grid_size)?;
    Ok(state)
}

/// The goal is a clean grid, wherever the robot is.
pub fn goal_test(state: &VacuumState) -> bool {
    state.dirty.is_empty()
}

/// The successor reached by `action`, or `None` if the action is a move off the grid.
///
/// `Suck` is always legal. On a clean cell it still costs [`STEP_COST`] and returns an identical
/// state.
pub fn apply(
    state: &VacuumState,
    action: VacuumAction,
    grid_size: i32,
) -> Option<Successor<VacuumState, VacuumAction>> {
    let next = match action.offset() {
        Some(offset) => {
            let robot = state.robot.offset(offset);
            if !robot.in_bounds(grid_size) {
                return None;
            }
            VacuumState::new_unchecked(robot, state.dirty.clone())
        }
        None => {
            let mut dirty = state.dirty.clone();
            dirty.remove(&state.robot);
            VacuumState::new_unchecked(state.robot, dirty)
        }
    };
    Some(Successor {
        action,
        state: next,
        step_cost: STEP_COST,
    })
}

/// Legal successors of `state`, always in the order Up, Down, Left, Right, Suck.
pub fn successors(
    state: &VacuumState,
    grid_size: i32,
) -> Vec<Successor<VacuumState, VacuumAction>> {
    VacuumAction::ALL
        .iter()
        .filter_map(|action| apply(state, *action, grid_size))
        .collect()
}

/// Replay `path` from `initial`, returning every state visited including the first. An illegal
/// move leaves the state unchanged.
pub fn state_path(initial: &VacuumState, path: &[VacuumAction], grid_size: i32) -> Vec<VacuumState> {
    let mut states = Vec::with_capacity(path.len() + 1);
    states.push(initial.clone());
    let mut current = initial.clone();
    for action in path {
        if let Some(successor) = apply(&current, *action, grid_size) {
            current = successor.state;
        }
        states.push(current.clone());
    }
    states
}

/// Heuristics for the informed strategies. Both are admissible and consistent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VacuumHeuristic {
    /// Number of dirty cells: each needs one `Suck`.
    DirtCount,

    /// Number of dirty cells plus the Manhattan distance to the nearest one.
    #[default]
    NearestDirt,
}

impl Heuristic<VacuumState> for VacuumHeuristic {
    fn estimate(&self, state: &VacuumState) -> Cost {
        match self {
            VacuumHeuristic::DirtCount => state.dirty.len() as Cost,
            VacuumHeuristic::NearestDirt => heuristic(state),
        }
    }
}

/// Dirty cells remaining plus the distance to the nearest of them; zero on a clean grid.
pub fn heuristic(state: &VacuumState) -> Cost {
    let nearest = state
        .dirty
        .iter()
        .map(|cell| state.robot.manhattan_distance(cell))
        .min()
        .unwrap_or(0);
    state.dirty.len() as Cost + nearest
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn cells(cells: &[(i32, i32)]) -> Vec<Position> {
        cells.iter().copied().map(Position::from).collect()
    }

    fn arb_state(max_size: i32) -> impl Strategy<Value = (i32, VacuumState)> {
        (1..=max_size).prop_flat_map(|n| {
            let cell = (0..n, 0..n).prop_map(Position::from);
            (
                Just(n),
                cell.clone(),
                prop::collection::btree_set(cell, 0..(n * n) as usize),
            )
                .prop_map(|(n, robot, dirty)| (n, VacuumState::new_unchecked(robot, dirty)))
        })
    }

    #[test]
    fn test_initial_state_rejects_bad_grid_size() {
        assert_eq!(
            initial_state(0, Position::new(0, 0), []),
            Err(ConfigurationError::InvalidGridSize(0))
        );
    }

    #[test]
    fn test_initial_state_rejects_robot_off_grid() {
        for robot in cells(&[(-1, 0), (0, 3), (3, 3)]) {
            assert_eq!(
                initial_state(3, robot, []),
                Err(ConfigurationError::RobotOutOfBounds {
                    position: robot,
                    grid_size: 3
                })
            );
        }
    }

    #[test]
    fn test_initial_state_rejects_dirt_off_grid() {
        let result = initial_state(2, Position::new(0, 0), cells(&[(1, 1), (2, 0)]));
        assert_eq!(
            result,
            Err(ConfigurationError::DirtOutOfBounds {
                position: Position::new(2, 0),
                grid_size: 2
            })
        );
    }

    #[test]
    fn test_dirt_order_does_not_matter() {
        let a = initial_state(3, Position::new(1, 1), cells(&[(0, 0), (2, 1)])).unwrap();
        let b = initial_state(3, Position::new(1, 1), cells(&[(2, 1), (0, 0), (0, 0)])).unwrap();
        assert_eq!(a, b);

        let mut explored = graph_search::HashSet::default();
        explored.insert(a);
        assert!(explored.contains(&b));
    }

    #[test]
    fn test_goal_test() {
        let clean = initial_state(2, Position::new(0, 1), []).unwrap();
        assert!(goal_test(&clean));
        let dirty = initial_state(2, Position::new(0, 1), cells(&[(1, 0)])).unwrap();
        assert!(!goal_test(&dirty));
    }

    #[test]
    fn test_corner_has_two_moves_and_suck() {
        let state = initial_state(3, Position::new(0, 0), []).unwrap();
        let actions: Vec<VacuumAction> = successors(&state, 3).iter().map(|s| s.action).collect();
        assert_eq!(
            actions,
            vec![VacuumAction::Down, VacuumAction::Right, VacuumAction::Suck]
        );
    }

    #[test]
    fn test_centre_has_all_actions_in_order() {
        let state = initial_state(3, Position::new(1, 1), []).unwrap();
        let actions: Vec<VacuumAction> = successors(&state, 3).iter().map(|s| s.action).collect();
        assert_eq!(actions, VacuumAction::ALL);
    }

    #[test]
    fn test_single_cell_grid_only_sucks() {
        let state = initial_state(1, Position::new(0, 0), cells(&[(0, 0)])).unwrap();
        let successors = successors(&state, 1);
        assert_eq!(successors.len(), 1);
        assert_eq!(successors[0].action, VacuumAction::Suck);
        assert!(goal_test(&successors[0].state));
    }

    #[test]
    fn test_suck_on_clean_cell_is_a_costed_no_op() {
        let state = initial_state(2, Position::new(0, 0), cells(&[(1, 1)])).unwrap();
        let successor = apply(&state, VacuumAction::Suck, 2).unwrap();
        assert_eq!(successor.state, state);
        assert_eq!(successor.step_cost, 1);
    }

    #[test]
    fn test_move_off_grid_is_omitted() {
        let state = initial_state(2, Position::new(0, 0), []).unwrap();
        assert!(apply(&state, VacuumAction::Up, 2).is_none());
        assert!(apply(&state, VacuumAction::Left, 2).is_none());
    }

    #[test]
    fn test_state_path_keeps_state_on_illegal_move() {
        let initial = initial_state(2, Position::new(0, 0), cells(&[(0, 1)])).unwrap();
        let path = [VacuumAction::Up, VacuumAction::Right, VacuumAction::Suck];
        let states = state_path(&initial, &path, 2);
        assert_eq!(states.len(), 4);
        assert_eq!(states[1], initial);
        assert_eq!(states[2].robot(), Position::new(0, 1));
        assert!(goal_test(&states[3]));
    }

    #[test]
    fn test_heuristic_values() {
        let state = initial_state(4, Position::new(0, 0), cells(&[(3, 3), (1, 2)])).unwrap();
        assert_eq!(VacuumHeuristic::DirtCount.estimate(&state), 2);
        assert_eq!(VacuumHeuristic::NearestDirt.estimate(&state), 2 + 3);
        let clean = initial_state(4, Position::new(2, 2), []).unwrap();
        assert_eq!(heuristic(&clean), 0);
    }

    #[test]
    fn test_heuristic_on_largest_grid() {
        let far = i32::MAX - 1;
        let state = initial_state(i32::MAX, Position::new(0, 0), cells(&[(far, far)])).unwrap();
        let distance = 2 * far as Cost;
        assert_eq!(Position::new(0, 0).manhattan_distance(&Position::new(far, far)), distance);
        assert_eq!(heuristic(&state), 1 + distance);
        assert_eq!(VacuumHeuristic::DirtCount.estimate(&state), 1);
    }

    proptest! {
        #[test]
        fn test_successors_change_only_what_the_action_says((n, state) in arb_state(5)) {
            for successor in successors(&state, n) {
                prop_assert_eq!(successor.step_cost, 1);
                prop_assert!(successor.state.robot().in_bounds(n));
                match successor.action.offset() {
                    Some((d_row, d_col)) => {
                        prop_assert_eq!(successor.state.dirty(), state.dirty());
                        prop_assert_eq!(
                            successor.state.robot(),
                            Position::new(state.robot().row + d_row, state.robot().col + d_col)
                        );
                    }
                    None => {
                        prop_assert_eq!(successor.state.robot(), state.robot());
                        let mut expected = state.dirty().clone();
                        expected.remove(&state.robot());
                        prop_assert_eq!(successor.state.dirty(), &expected);
                    }
                }
                prop_assert_eq!(goal_test(&successor.state), successor.state.dirty().is_empty());
            }
        }

        #[test]
        fn test_successors_are_deterministic((n, state) in arb_state(5)) {
            prop_assert_eq!(successors(&state, n), successors(&state, n));
        }

        #[test]
        fn test_heuristic_is_consistent((n, state) in arb_state(4)) {
            let h = heuristic(&state);
            for successor in successors(&state, n) {
                prop_assert!(h <= successor.step_cost + heuristic(&successor.state));
            }
        }
    }
}
