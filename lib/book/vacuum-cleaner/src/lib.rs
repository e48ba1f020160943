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

//! The vacuum-cleaner world.
//!
//! Two views of the same world live here. [`state_space`] and [`planner`] treat it as a search
//! problem: immutable states, a transition function, heuristics, and entry points that plan a
//! route with any [`graph_search::Strategy`]. [`vacuum_world`] is the environment a robot acts
//! in, one action at a time, in a Performance, Environment, Action, Sensing (PEAS) cycle.
//!
//! See:
//! -  Chapter 2: Intelligent Agents, page 40
//! -  Chapter 3: Solving Problems by Searching, section 3.2.1

use num_traits::Zero;

pub mod planner;
pub mod state_space;
pub mod vacuum_world;

pub use graph_search::{Budget, SearchResult, SearchStatus, Strategy};
pub use planner::{compare_strategies, nearest_neighbor, search, VacuumError, VacuumProblem};
pub use state_space::{
    goal_test, heuristic, initial_state, successors, ConfigurationError, Position, VacuumAction,
    VacuumHeuristic, VacuumState,
};

/// An Agent acts in a Performance, Environment, Action, Sensing (PEAS) cycle.
/// For a given Perception, the Agent will return an Action, or `None` once it has nothing left to
/// do.
///
/// Notice that the Agent is not aware of an Environment, it's only interface
/// is the Perception coming in then the Action going out.
pub trait Agent {
    type Action;
    type Percept;

    fn act(&mut self, percept: &Self::Percept) -> Option<Self::Action>;
}

/// An Environment runs a single Agent in a Performance, Environment, Action, Sensing (PEAS) cycle.
///
/// Notice that the Environment is not aware of an Agent.
pub trait Environment {
    type Action;
    type Percept;
    type Score: num_traits::NumAssign + Copy;

    fn percept(&self) -> Self::Percept;
    fn execute_action(&mut self, action: &Self::Action);

    /// Returns the score of the Environment. This is not cumulative or stateful. This is the score
    /// of the Environment at the current state.
    fn score(&self) -> Self::Score;
}

/// A Simulation runs a single Agent in multiple Performance, Environment, Action, Sensing (PEAS)
/// cycles. The Agent's score (Performance) is continually kept up to date.
///
/// The Simulation is aware of both the Environment and the single Agent. Notice that the Agent's
/// generic Action and Percept come from the Environment.
pub struct Simulation<_Environment, _Agent>
where
    _Environment: Environment,
    _Agent: Agent<Action = _Environment::Action, Percept = _Environment::Percept>,
{
    environment: _Environment,
    agent: _Agent,
    time_steps: i32,
    steps_taken: i32,
    score: _Environment::Score,
}

impl<_Environment, _Agent> Simulation<_Environment, _Agent>
where
    _Environment: Environment,
    _Agent: Agent<Action = _Environment::Action, Percept = _Environment::Percept>,
{
    pub fn new(environment: _Environment, agent: _Agent, time_steps: i32) -> Self {
        Self {
            environment,
            agent,
            time_steps,
            steps_taken: 0,
            score: _Environment::Score::zero(),
        }
    }

    /// Run until `time_steps` cycles have passed or the agent stops acting.
    pub fn run(&mut self) {
        while self.step().is_some() {}
    }

    /// Run a single cycle. Returns the action taken, or `None` if the simulation is over.
    pub fn step(&mut self) -> Option<_Environment::Action> {
        if self.steps_taken >= self.time_steps {
            return None;
        }
        let percept = self.environment.percept();
        let action = self.agent.act(&percept)?;
        self.environment.execute_action(&action);
        self.score += self.environment.score();
        self.steps_taken += 1;
        Some(action)
    }

    pub fn score(&self) -> <_Environment as Environment>::Score {
        self.score
    }

    pub fn steps_taken(&self) -> i32 {
        self.steps_taken
    }

    pub fn environment(&self) -> &_Environment {
        &self.environment
    }
}
