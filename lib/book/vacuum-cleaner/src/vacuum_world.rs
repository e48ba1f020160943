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

use std::collections::BTreeSet;
use std::fmt::Display;

use graph_search::{Cost, Playback, SearchResult};
use log::debug;
use rand::Rng;

use crate::state_space::{
    apply, state_path, ConfigurationError, Position, VacuumAction, VacuumState, STEP_COST,
};
use crate::{Agent, Environment};

pub const DEFAULT_GRID_SIZE: i32 = 5;
pub const MIN_GRID_SIZE: i32 = 2;
pub const MAX_GRID_SIZE: i32 = 10;

/// Performance points gained by sucking up dirt. Every action also costs one point.
pub const SUCK_REWARD: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SquareState {
    Clean,
    Dirty,
}

/// VacuumWorldLocalPercept is the Percept that the Agent receives from the Environment for just
/// a single location, e.g imagine a dirt sensor looking right down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VacuumWorldLocalPercept {
    pub location: Position,
    pub square_state: SquareState,
}

/// PlanAgent replays a plan found by a search, one action per time step, ignoring its percepts.
/// It stops once the plan runs out.
pub struct PlanAgent<'a> {
    plan: Playback<'a, VacuumAction>,
}

impl<'a> PlanAgent<'a> {
    pub fn new(result: &'a SearchResult<VacuumAction>) -> Self {
        Self {
            plan: result.playback(),
        }
    }

    /// Start the plan over.
    pub fn restart(&mut self) {
        self.plan.restart();
    }

    pub fn remaining(&self) -> usize {
        self.plan.remaining()
    }
}

impl<'a> Agent for PlanAgent<'a> {
    type Action = VacuumAction;
    type Percept = VacuumWorldLocalPercept;

    fn act(&mut self, _percept: &Self::Percept) -> Option<Self::Action> {
        self.plan.next()
    }
}

/// ReflexVacuumAgent sucks whenever its square is dirty and otherwise sweeps the grid row by row,
/// right along even rows and left along odd ones, stepping down at the end of each row. It only
/// covers cells at or after its starting point in that order, so start it at the origin to clean
/// the whole grid. It stops at the end of the last row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReflexVacuumAgent {
    grid_size: i32,
}

impl ReflexVacuumAgent {
    pub fn new(grid_size: i32) -> Self {
        Self { grid_size }
    }
}

impl Agent for ReflexVacuumAgent {
    type Action = VacuumAction;
    type Percept = VacuumWorldLocalPercept;

    fn act(&mut self, percept: &Self::Percept) -> Option<Self::Action> {
        if percept.square_state == SquareState::Dirty {
            return Some(VacuumAction::Suck);
        }
        let Position { row, col } = percept.location;
        let last = self.grid_size - 1;
        let rightward = row % 2 == 0;
        match (rightward, col) {
            (true, col) if col < last => Some(VacuumAction::Right),
            (false, col) if col > 0 => Some(VacuumAction::Left),
            _ if row < last => Some(VacuumAction::Down),
            _ => None,
        }
    }
}

/// The interactive vacuum world: an n×n grid the robot moves around in one action at a time.
///
/// Unlike the search model, moves into a wall are not illegal here: the robot just stays put,
/// and the action is still paid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VacuumWorldEnvironment {
    grid_size: i32,
    robot: Position,
    dirt: BTreeSet<Position>,
    action_history: Vec<VacuumAction>,
    path_history: Vec<Position>,
    total_cost: Cost,
    performance: i32,
}

impl Default for VacuumWorldEnvironment {
    fn default() -> Self {
        VacuumWorldEnvironment::new(DEFAULT_GRID_SIZE)
    }
}

impl VacuumWorldEnvironment {
    /// A clean grid with the robot in the top-left corner. The size is clamped to
    /// [`MIN_GRID_SIZE`]..=[`MAX_GRID_SIZE`].
    pub fn new(grid_size: i32) -> Self {
        let robot = Position::default();
        Self {
            grid_size: grid_size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE),
            robot,
            dirt: BTreeSet::new(),
            action_history: Vec::new(),
            path_history: vec![robot],
            total_cost: 0,
            performance: 0,
        }
    }

    /// An environment showing `state`. Fails if the state does not fit on the grid.
    pub fn from_state(grid_size: i32, state: &VacuumState) -> Result<Self, ConfigurationError> {
        let mut environment = Self::new(grid_size);
        state.validate(environment.grid_size)?;
        environment.robot = state.robot();
        environment.path_history = vec![state.robot()];
        environment.dirt = state.dirty().clone();
        Ok(environment)
    }

    /// Clean grid, robot back at the origin, histories and counters cleared.
    pub fn reset(&mut self) {
        *self = Self::new(self.grid_size);
    }

    pub fn grid_size(&self) -> i32 {
        self.grid_size
    }

    pub fn robot(&self) -> Position {
        self.robot
    }

    pub fn dirt(&self) -> &BTreeSet<Position> {
        &self.dirt
    }

    pub fn action_history(&self) -> &[VacuumAction] {
        &self.action_history
    }

    /// Cells the robot has occupied, starting with where it was placed.
    pub fn path_history(&self) -> &[Position] {
        &self.path_history
    }

    pub fn total_cost(&self) -> Cost {
        self.total_cost
    }

    /// Performance points: minus one per action, plus [`SUCK_REWARD`] per cleaned cell.
    pub fn performance(&self) -> i32 {
        self.performance
    }

    pub fn is_clean(&self) -> bool {
        self.dirt.is_empty()
    }

    /// Move the robot. Ignored, returning false, if `position` is off the grid.
    pub fn set_robot_position(&mut self, position: Position) -> bool {
        if !position.in_bounds(self.grid_size) {
            return false;
        }
        self.robot = position;
        self.path_history = vec![position];
        self.performance = 0;
        true
    }

    /// Dirty a cell. Ignored, returning false, if `position` is off the grid.
    pub fn add_dirt(&mut self, position: Position) -> bool {
        position.in_bounds(self.grid_size) && self.dirt.insert(position)
    }

    pub fn remove_dirt(&mut self, position: Position) -> bool {
        self.dirt.remove(&position)
    }

    pub fn toggle_dirt(&mut self, position: Position) {
        if !self.remove_dirt(position) {
            self.add_dirt(position);
        }
    }

    pub fn clear_dirt(&mut self) {
        self.dirt.clear();
    }

    /// Replace the dirt with a fresh layout where each cell is dirty with `probability`.
    pub fn random_dirt<R: Rng>(&mut self, probability: f64, rng: &mut R) {
        let probability = probability.clamp(0.0, 1.0);
        let size = self.grid_size;
        self.dirt = (0..size)
            .flat_map(|row| (0..size).map(move |col| Position::new(row, col)))
            .filter(|_| rng.gen_bool(probability))
            .collect();
        self.performance = 0;
        debug!("random dirt: {} dirty cells", self.dirt.len());
    }

    /// Resize the grid, clamped to [`MIN_GRID_SIZE`]..=[`MAX_GRID_SIZE`]. Dirt that falls off the
    /// grid is dropped and the robot is pulled back inside.
    pub fn set_grid_size(&mut self, grid_size: i32) {
        self.grid_size = grid_size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE);
        let size = self.grid_size;
        self.dirt.retain(|cell| cell.in_bounds(size));
        self.robot = Position::new(self.robot.row.min(size - 1), self.robot.col.min(size - 1));
        self.path_history = vec![self.robot];
    }

    /// Actions the search model considers legal from here.
    pub fn valid_actions(&self) -> Vec<VacuumAction> {
        let state = self.state();
        VacuumAction::ALL
            .into_iter()
            .filter(|action| apply(&state, *action, self.grid_size).is_some())
            .collect()
    }

    /// Snapshot of the world as a search state.
    pub fn state(&self) -> VacuumState {
        VacuumState::new_unchecked(self.robot, self.dirt.clone())
    }

    /// States visited when `path` is played from the current state.
    pub fn state_path(&self, path: &[VacuumAction]) -> Vec<VacuumState> {
        state_path(&self.state(), path, self.grid_size)
    }
}

impl Environment for VacuumWorldEnvironment {
    type Action = VacuumAction;
    type Percept = VacuumWorldLocalPercept;
    type Score = i32;

    fn percept(&self) -> Self::Percept {
        let square_state = if self.dirt.contains(&self.robot) {
            SquareState::Dirty
        } else {
            SquareState::Clean
        };
        VacuumWorldLocalPercept {
            location: self.robot,
            square_state,
        }
    }

    fn execute_action(&mut self, action: &Self::Action) {
        let mut points = -1;
        match action.offset() {
            Some((d_row, d_col)) => {
                let last = self.grid_size - 1;
                let target = Position::new(
                    (self.robot.row + d_row).clamp(0, last),
                    (self.robot.col + d_col).clamp(0, last),
                );
                if target != self.robot {
                    self.robot = target;
                    self.path_history.push(target);
                }
            }
            None => {
                if self.dirt.remove(&self.robot) {
                    points += SUCK_REWARD;
                }
            }
        }
        self.action_history.push(*action);
        self.total_cost += STEP_COST;
        self.performance += points;
    }

    /// One point per clean square. Not cumulative: this is the score of the current state.
    fn score(&self) -> Self::Score {
        self.grid_size * self.grid_size - self.dirt.len() as i32
    }
}

// Rows top to bottom. `R` robot, `@` robot on dirt, `*` dirt, `.` clean.
impl Display for VacuumWorldEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in 0..self.grid_size {
            let line: Vec<&str> = (0..self.grid_size)
                .map(|col| {
                    let cell = Position::new(row, col);
                    match (cell == self.robot, self.dirt.contains(&cell)) {
                        (true, true) => "@",
                        (true, false) => "R",
                        (false, true) => "*",
                        (false, false) => ".",
                    }
                })
                .collect();
            write!(f, "{}", line.join(" "))?;
            if row < self.grid_size - 1 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use graph_search::{Budget, Strategy};
    use rand::SeedableRng;

    use super::*;
    use crate::planner::search;
    use crate::state_space::goal_test;
    use crate::Simulation;

    fn environment_with_dirt(grid_size: i32, dirt: &[(i32, i32)]) -> VacuumWorldEnvironment {
        let mut env = VacuumWorldEnvironment::new(grid_size);
        for cell in dirt {
            assert!(env.add_dirt((*cell).into()));
        }
        env
    }

    #[test]
    fn test_grid_size_is_clamped() {
        assert_eq!(VacuumWorldEnvironment::new(1).grid_size(), MIN_GRID_SIZE);
        assert_eq!(VacuumWorldEnvironment::new(50).grid_size(), MAX_GRID_SIZE);
        assert_eq!(VacuumWorldEnvironment::default().grid_size(), DEFAULT_GRID_SIZE);
    }

    #[test]
    fn test_vacuum_world_environment_returns_dirty_percept() {
        let env = environment_with_dirt(2, &[(0, 0)]);
        let percept = env.percept();
        assert_eq!(percept.location, Position::new(0, 0));
        assert_eq!(percept.square_state, SquareState::Dirty);
    }

    #[test]
    fn test_vacuum_world_environment_allows_cleaning() {
        let mut env = environment_with_dirt(2, &[(0, 0), (0, 1)]);
        env.execute_action(&VacuumAction::Suck);
        assert_eq!(env.percept().square_state, SquareState::Clean);
        assert_eq!(env.performance(), SUCK_REWARD - 1);

        env.execute_action(&VacuumAction::Right);
        let percept = env.percept();
        assert_eq!(percept.location, Position::new(0, 1));
        assert_eq!(percept.square_state, SquareState::Dirty);
        assert_eq!(env.total_cost(), 2);
    }

    #[test]
    fn test_moves_into_walls_stay_put_but_cost() {
        let mut env = VacuumWorldEnvironment::new(3);
        env.execute_action(&VacuumAction::Up);
        env.execute_action(&VacuumAction::Left);
        assert_eq!(env.robot(), Position::new(0, 0));
        assert_eq!(env.total_cost(), 2);
        assert_eq!(env.performance(), -2);
        assert_eq!(env.path_history(), [Position::new(0, 0)]);
        assert_eq!(env.action_history(), [VacuumAction::Up, VacuumAction::Left]);
    }

    #[test]
    fn test_suck_on_clean_square_costs_a_point() {
        let mut env = VacuumWorldEnvironment::new(2);
        env.execute_action(&VacuumAction::Suck);
        assert_eq!(env.performance(), -1);
    }

    #[test]
    fn test_vacuum_world_environment_score() {
        let mut env = environment_with_dirt(2, &[(0, 0), (0, 1)]);
        assert_eq!(env.score(), 2);
        env.execute_action(&VacuumAction::Suck);
        assert_eq!(env.score(), 3);
        env.execute_action(&VacuumAction::Right);
        assert_eq!(env.score(), 3);
        env.execute_action(&VacuumAction::Suck);
        assert_eq!(env.score(), 4);
        assert!(env.is_clean());
    }

    #[test]
    fn test_dirt_editing() {
        let mut env = VacuumWorldEnvironment::new(3);
        assert!(!env.add_dirt(Position::new(3, 0)));
        env.toggle_dirt(Position::new(1, 1));
        assert!(env.dirt().contains(&Position::new(1, 1)));
        env.toggle_dirt(Position::new(1, 1));
        assert!(env.is_clean());
        env.add_dirt(Position::new(2, 2));
        env.clear_dirt();
        assert!(env.is_clean());
    }

    #[test]
    fn test_set_robot_position_rejects_off_grid() {
        let mut env = VacuumWorldEnvironment::new(3);
        assert!(!env.set_robot_position(Position::new(0, 3)));
        assert!(env.set_robot_position(Position::new(2, 1)));
        assert_eq!(env.robot(), Position::new(2, 1));
        assert_eq!(env.path_history(), [Position::new(2, 1)]);
    }

    #[test]
    fn test_shrinking_grid_drops_dirt_and_moves_robot() {
        let mut env = environment_with_dirt(5, &[(0, 0), (4, 4), (2, 3)]);
        env.set_robot_position(Position::new(4, 1));
        env.set_grid_size(3);
        assert_eq!(env.grid_size(), 3);
        assert_eq!(env.robot(), Position::new(2, 1));
        let dirt: Vec<Position> = env.dirt().iter().copied().collect();
        assert_eq!(dirt, vec![Position::new(0, 0)]);
    }

    #[test]
    fn test_random_dirt_is_reproducible_and_in_bounds() {
        let mut a = VacuumWorldEnvironment::new(6);
        let mut b = VacuumWorldEnvironment::new(6);
        a.random_dirt(0.3, &mut rand_pcg::Pcg64::seed_from_u64(42));
        b.random_dirt(0.3, &mut rand_pcg::Pcg64::seed_from_u64(42));
        assert_eq!(a.dirt(), b.dirt());
        assert!(a.dirt().iter().all(|cell| cell.in_bounds(6)));

        a.random_dirt(1.0, &mut rand_pcg::Pcg64::seed_from_u64(1));
        assert_eq!(a.dirt().len(), 36);
        a.random_dirt(0.0, &mut rand_pcg::Pcg64::seed_from_u64(1));
        assert!(a.is_clean());
    }

    #[test]
    fn test_valid_actions_in_corner() {
        let env = VacuumWorldEnvironment::new(2);
        assert_eq!(
            env.valid_actions(),
            vec![VacuumAction::Down, VacuumAction::Right, VacuumAction::Suck]
        );
    }

    #[test]
    fn test_display() {
        let mut env = environment_with_dirt(3, &[(0, 0), (2, 1)]);
        assert_eq!(env.to_string(), "@ . .\n. . .\n. * .");
        env.execute_action(&VacuumAction::Suck);
        assert_eq!(env.to_string(), "R . .\n. . .\n. * .");
    }

    #[test]
    fn test_plan_agent_cleans_the_world() {
        let env = environment_with_dirt(4, &[(3, 3), (1, 2), (0, 3)]);
        let result = search(
            &env.state(),
            env.grid_size(),
            Strategy::AStar,
            Some(Default::default()),
            &Budget::unlimited(),
        )
        .unwrap();
        let states = env.state_path(result.path());
        assert!(goal_test(states.last().unwrap()));

        let agent = PlanAgent::new(&result);
        let mut simulation = Simulation::new(env, agent, 100);
        simulation.run();

        assert_eq!(simulation.steps_taken() as usize, result.path().len());
        let env = simulation.environment();
        assert!(env.is_clean());
        assert_eq!(env.total_cost(), result.path_cost());
        assert_eq!(
            env.performance(),
            3 * SUCK_REWARD - result.path().len() as i32
        );
    }

    #[test]
    fn test_reflex_agent_sweeps_whole_grid_from_origin() {
        let mut rng = rand_pcg::Pcg64::seed_from_u64(3);
        for n in MIN_GRID_SIZE..=5 {
            let mut env = VacuumWorldEnvironment::new(n);
            env.random_dirt(0.5, &mut rng);
            let dirt = env.dirt().len() as i32;
            let mut simulation = Simulation::new(env, ReflexVacuumAgent::new(n), 1000);
            simulation.run();
            assert!(simulation.environment().is_clean(), "n = {}", n);
            assert_eq!(simulation.steps_taken(), n * n - 1 + dirt);
            assert_eq!(simulation.environment().path_history().len() as i32, n * n);
        }
    }

    #[test]
    fn test_reflex_agent_stops_at_end_of_sweep() {
        let mut agent = ReflexVacuumAgent::new(3);
        let percept = |row, col, square_state| VacuumWorldLocalPercept {
            location: Position::new(row, col),
            square_state,
        };
        assert_eq!(agent.act(&percept(2, 1, SquareState::Dirty)), Some(VacuumAction::Suck));
        assert_eq!(agent.act(&percept(0, 2, SquareState::Clean)), Some(VacuumAction::Down));
        assert_eq!(agent.act(&percept(1, 2, SquareState::Clean)), Some(VacuumAction::Left));
        assert_eq!(agent.act(&percept(1, 0, SquareState::Clean)), Some(VacuumAction::Down));
        assert_eq!(agent.act(&percept(2, 2, SquareState::Clean)), None);
    }

    #[test]
    fn test_plan_agent_restarts() {
        let env = environment_with_dirt(2, &[(1, 1)]);
        let result = search(
            &env.state(),
            2,
            Strategy::BreadthFirst,
            None,
            &Budget::unlimited(),
        )
        .unwrap();
        let mut agent = PlanAgent::new(&result);
        let percept = env.percept();
        let first = agent.act(&percept);
        while agent.act(&percept).is_some() {}
        assert_eq!(agent.remaining(), 0);
        agent.restart();
        assert_eq!(agent.act(&percept), first);
    }

    #[test]
    fn test_from_state_rejects_state_off_grid() {
        let state = crate::state_space::initial_state(8, Position::new(7, 7), []).unwrap();
        assert_eq!(
            VacuumWorldEnvironment::from_state(3, &state),
            Err(ConfigurationError::RobotOutOfBounds {
                position: Position::new(7, 7),
                grid_size: 3
            })
        );
        let env = VacuumWorldEnvironment::from_state(8, &state).unwrap();
        assert_eq!(env.state(), state);
    }
}
