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

//! Entry points that plan a cleaning route for a vacuum-world configuration.

use std::collections::BTreeSet;
use std::mem::size_of;
use std::time::Instant;

use graph_search::{
    Budget, Cost, Heuristic, Problem, SearchError, SearchResult, SearchStats, SearchStatus,
    Strategy, Successor,
};
use log::debug;

use crate::state_space::{
    goal_test, successors, ConfigurationError, Position, VacuumAction, VacuumHeuristic,
    VacuumState,
};

/// Name reported by [`nearest_neighbor`].
pub const NEAREST_NEIGHBOR: &str = "Nearest Neighbor";

/// Error from one of the planning entry points.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VacuumError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Search(#[from] SearchError),
}

/// A validated vacuum-world configuration seen as a [`Problem`].
#[derive(Debug, Clone)]
pub struct VacuumProblem {
    initial: VacuumState,
    grid_size: i32,
}

impl VacuumProblem {
    pub fn new(initial: VacuumState, grid_size: i32) -> Result<Self, ConfigurationError> {
        initial.validate(grid_size)?;
        Ok(Self { initial, grid_size })
    }

    pub fn grid_size(&self) -> i32 {
        self.grid_size
    }
}

impl Problem for VacuumProblem {
    type State = VacuumState;
    type Action = VacuumAction;

    fn initial_state(&self) -> &VacuumState {
        &self.initial
    }

    fn is_goal(&self, state: &VacuumState) -> bool {
        goal_test(state)
    }

    fn successors(&self, state: &VacuumState) -> Vec<Successor<VacuumState, VacuumAction>> {
        successors(state, self.grid_size)
    }
}

/// Search for a cleaning plan from `initial` on an n×n grid.
///
/// `heuristic` is only needed by greedy best-first and A*. A run that ends without a plan is
/// still `Ok`; check [`SearchResult::status`].
pub fn search(
    initial: &VacuumState,
    grid_size: i32,
    strategy: Strategy,
    heuristic: Option<VacuumHeuristic>,
    budget: &Budget,
) -> Result<SearchResult<VacuumAction>, VacuumError> {
    let problem = VacuumProblem::new(initial.clone(), grid_size)?;
    let heuristic = heuristic
        .as_ref()
        .map(|h| h as &dyn Heuristic<VacuumState>);
    let result = graph_search::search(&problem, strategy, heuristic, budget)?;
    debug!("{}", result);
    Ok(result)
}

/// Run each strategy in turn on the same configuration, with identical instrumentation, so the
/// results can be compared side by side. Every run starts from scratch.
pub fn compare_strategies(
    initial: &VacuumState,
    grid_size: i32,
    strategies: &[Strategy],
    heuristic: VacuumHeuristic,
    budget: &Budget,
) -> Result<Vec<SearchResult<VacuumAction>>, VacuumError> {
    strategies
        .iter()
        .map(|strategy| search(initial, grid_size, *strategy, Some(heuristic), budget))
        .collect()
}

/// Fast, non-optimal plan for large boards: walk to the nearest dirty cell (columns first, then
/// rows), suck, repeat. Ties between equally near cells go to the first in row-major order.
///
/// Always succeeds on a valid configuration. Each step counts as one expansion.
pub fn nearest_neighbor(
    initial: &VacuumState,
    grid_size: i32,
) -> Result<SearchResult<VacuumAction>, ConfigurationError> {
    initial.validate(grid_size)?;
    let start = Instant::now();

    let mut robot = initial.robot();
    let mut remaining: BTreeSet<Position> = initial.dirty().clone();
    let mut path = Vec::new();
    let mut stats = SearchStats {
        nodes_generated: 1,
        max_frontier_size: 1,
        ..SearchStats::default()
    };

    while let Some(target) = nearest(robot, &remaining) {
        debug!("nearest neighbor: heading for {}", target);
        loop {
            let action = step_toward(robot, target);
            stats.nodes_generated += legal_action_count(robot, grid_size);
            stats.nodes_expanded += 1;
            path.push(action);
            match action.offset() {
                Some((d_row, d_col)) => {
                    robot = Position::new(robot.row + d_row, robot.col + d_col);
                }
                None => break,
            }
        }
        remaining.remove(&target);
    }

    stats.elapsed_time = start.elapsed();
    stats.peak_memory = size_of::<VacuumState>()
        + initial.dirty().len() * 2 * size_of::<Position>()
        + path.capacity() * size_of::<VacuumAction>();
    let path_cost = path.len() as Cost;
    let result = SearchResult::new(NEAREST_NEIGHBOR, SearchStatus::Success, path, path_cost, stats);
    debug!("{}", result);
    Ok(result)
}

/// Columns first, then rows. `Suck` once on the target.
fn step_toward(robot: Position, target: Position) -> VacuumAction {
    if robot.col < target.col {
        VacuumAction::Right
    } else if robot.col > target.col {
        VacuumAction::Left
    } else if robot.row < target.row {
        VacuumAction::Down
    } else if robot.row > target.row {
        VacuumAction::Up
    } else {
        VacuumAction::Suck
    }
}

fn legal_action_count(robot: Position, grid_size: i32) -> usize {
    VacuumAction::ALL
        .iter()
        .filter(|action| {
            action.offset().map_or(true, |(d_row, d_col)| {
                Position::new(robot.row + d_row, robot.col + d_col).in_bounds(grid_size)
            })
        })
        .count()
}

fn nearest(from: Position, cells: &BTreeSet<Position>) -> Option<Position> {
    // min_by_key keeps the first of equal keys, and the set iterates in row-major order.
    cells
        .iter()
        .min_by_key(|cell| from.manhattan_distance(cell))
        .copied()
}
