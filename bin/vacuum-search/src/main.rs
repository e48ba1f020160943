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

//! Plan a cleaning route for a vacuum-world grid with one or more search strategies and compare
//! them.

use std::collections::BTreeSet;
use std::error::Error;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use vacuum_cleaner::vacuum_world::{
    PlanAgent, VacuumWorldEnvironment, MAX_GRID_SIZE, MIN_GRID_SIZE,
};
use vacuum_cleaner::{
    initial_state, nearest_neighbor, search, Budget, Environment, Position, SearchResult,
    Simulation, Strategy, VacuumAction, VacuumError, VacuumHeuristic, VacuumState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Algorithm {
    Bfs,
    Dfs,
    Ucs,
    Greedy,
    Astar,
    /// Walk to the nearest dirt and suck, repeatedly. Fast, not optimal.
    Nearest,
}

impl Algorithm {
    const ALL: [Algorithm; 6] = [
        Algorithm::Bfs,
        Algorithm::Dfs,
        Algorithm::Ucs,
        Algorithm::Greedy,
        Algorithm::Astar,
        Algorithm::Nearest,
    ];

    fn strategy(&self) -> Option<Strategy> {
        match self {
            Algorithm::Bfs => Some(Strategy::BreadthFirst),
            Algorithm::Dfs => Some(Strategy::DepthFirst),
            Algorithm::Ucs => Some(Strategy::UniformCost),
            Algorithm::Greedy => Some(Strategy::GreedyBestFirst),
            Algorithm::Astar => Some(Strategy::AStar),
            Algorithm::Nearest => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum HeuristicArg {
    DirtCount,
    NearestDirt,
}

impl From<HeuristicArg> for VacuumHeuristic {
    fn from(heuristic: HeuristicArg) -> Self {
        match heuristic {
            HeuristicArg::DirtCount => VacuumHeuristic::DirtCount,
            HeuristicArg::NearestDirt => VacuumHeuristic::NearestDirt,
        }
    }
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Grid size n, for an n x n grid
    #[clap(short, long, default_value_t = 5)]
    size: i32,

    /// Robot position as ROW,COL
    #[clap(short, long, default_value = "0,0", value_parser = parse_position)]
    robot: Position,

    /// Dirty cell as ROW,COL. Repeat for more cells
    #[clap(short, long, value_parser = parse_position)]
    dirt: Vec<Position>,

    /// Also make every cell dirty with this probability
    #[clap(long)]
    random_dirt: Option<f64>,

    /// Seed for --random-dirt
    #[clap(long, default_value_t = 42)]
    seed: u64,

    /// Strategy to run. Repeat to compare several; all of them by default
    #[clap(long = "strategy", value_enum)]
    algorithms: Vec<Algorithm>,

    /// Heuristic for greedy best-first and A*
    #[clap(long, value_enum, default_value_t = HeuristicArg::NearestDirt)]
    heuristic: HeuristicArg,

    /// Give up after this many expansions
    #[clap(long)]
    max_expansions: Option<usize>,

    /// Give up after this many milliseconds
    #[clap(long)]
    timeout_ms: Option<u64>,

    /// Discard nodes deeper than this
    #[clap(long)]
    max_depth: Option<usize>,

    /// Run the algorithms on separate threads
    #[clap(long)]
    parallel: bool,

    /// Print results as JSON instead of a table
    #[clap(long)]
    json: bool,

    /// Replay the cheapest plan step by step
    #[clap(long)]
    play: bool,
}

impl Args {
    fn budget(&self) -> Budget {
        let mut budget = Budget::unlimited();
        if let Some(max_expansions) = self.max_expansions {
            budget = budget.with_max_expansions(max_expansions);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            budget = budget.with_max_duration(Duration::from_millis(timeout_ms));
        }
        if let Some(max_depth) = self.max_depth {
            budget = budget.with_max_depth(max_depth);
        }
        budget
    }

    fn initial_state(&self) -> Result<VacuumState, Box<dyn Error>> {
        let mut dirt: BTreeSet<Position> = self.dirt.iter().copied().collect();
        if let Some(probability) = self.random_dirt {
            if !(0.0..=1.0).contains(&probability) {
                return Err(format!("--random-dirt must be in [0, 1], got {}", probability).into());
            }
            let mut rng = rand_pcg::Pcg64::seed_from_u64(self.seed);
            for row in 0..self.size {
                for col in 0..self.size {
                    if rng.gen_bool(probability) {
                        dirt.insert(Position::new(row, col));
                    }
                }
            }
        }
        Ok(initial_state(self.size, self.robot, dirt)?)
    }
}

fn parse_position(s: &str) -> Result<Position, String> {
    let (row, col) = s
        .split_once(',')
        .ok_or_else(|| format!("expected ROW,COL, got {:?}", s))?;
    let row = row
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("bad row {:?}: {}", row, e))?;
    let col = col
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("bad column {:?}: {}", col, e))?;
    Ok(Position::new(row, col))
}

fn run_algorithm(
    algorithm: Algorithm,
    initial: &VacuumState,
    grid_size: i32,
    heuristic: VacuumHeuristic,
    budget: &Budget,
) -> Result<SearchResult<VacuumAction>, VacuumError> {
    match algorithm.strategy() {
        Some(strategy) => search(initial, grid_size, strategy, Some(heuristic), budget),
        None => Ok(nearest_neighbor(initial, grid_size)?),
    }
}

fn print_table(results: &[SearchResult<VacuumAction>]) {
    println!(
        "{:<18} {:<26} {:>6} {:>6} {:>10} {:>10} {:>9} {:>10} {:>12}",
        "algorithm",
        "status",
        "steps",
        "cost",
        "expanded",
        "generated",
        "frontier",
        "time (ms)",
        "memory (B)"
    );
    for result in results {
        println!(
            "{:<18} {:<26} {:>6} {:>6} {:>10} {:>10} {:>9} {:>10.3} {:>12}",
            result.algorithm(),
            result.status().to_string(),
            result.path().len(),
            result.path_cost(),
            result.nodes_expanded(),
            result.nodes_generated(),
            result.max_frontier_size(),
            result.elapsed_time().as_secs_f64() * 1000.0,
            result.peak_memory()
        );
    }
}

fn play(
    initial: &VacuumState,
    grid_size: i32,
    result: &SearchResult<VacuumAction>,
) -> Result<(), Box<dyn Error>> {
    if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&grid_size) {
        warn!(
            "replay only supports grids of {} to {} cells a side, skipping",
            MIN_GRID_SIZE, MAX_GRID_SIZE
        );
        return Ok(());
    }
    let environment = VacuumWorldEnvironment::from_state(grid_size, initial)?;
    let time_steps = i32::try_from(result.path().len())?;
    let mut simulation = Simulation::new(environment, PlanAgent::new(result), time_steps);

    println!("\nreplaying {} plan:\n", result.algorithm());
    println!("{}\n", simulation.environment());
    while let Some(action) = simulation.step() {
        println!("{}: {}", simulation.steps_taken(), action);
        println!("{}\n", simulation.environment());
    }

    let environment = simulation.environment();
    println!(
        "cost: {}, performance: {}, cumulative score: {}",
        environment.total_cost(),
        environment.performance(),
        simulation.score()
    );
    if !environment.is_clean() {
        warn!("plan finished with {} dirty cells left", environment.dirt().len());
    }
    // Percept of the final square, as the robot would sense it.
    info!("final percept: {:?}", environment.percept());
    Ok(())
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let initial = args.initial_state()?;
    let budget = args.budget();
    let heuristic = VacuumHeuristic::from(args.heuristic);
    let algorithms = if args.algorithms.is_empty() {
        Algorithm::ALL.to_vec()
    } else {
        args.algorithms.clone()
    };
    info!(
        "{}x{} grid, robot at {}, {} dirty cells, {} algorithms",
        args.size,
        args.size,
        initial.robot(),
        initial.dirty().len(),
        algorithms.len()
    );

    // Each run owns its own frontier, explored set and counters, so the runs are independent.
    let results: Vec<SearchResult<VacuumAction>> = if args.parallel {
        algorithms
            .par_iter()
            .map(|algorithm| run_algorithm(*algorithm, &initial, args.size, heuristic, &budget))
            .collect::<Result<_, _>>()?
    } else {
        algorithms
            .iter()
            .map(|algorithm| run_algorithm(*algorithm, &initial, args.size, heuristic, &budget))
            .collect::<Result<_, _>>()?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_table(&results);
    }

    if args.play {
        match results
            .iter()
            .filter(|result| result.success())
            .min_by_key(|result| result.path_cost())
        {
            Some(best) => play(&initial, args.size, best)?,
            None => warn!("no algorithm found a plan to replay"),
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
