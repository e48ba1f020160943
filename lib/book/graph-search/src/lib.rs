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

#![warn(missing_docs)]

//! Generic graph search.
//!
//! One search loop, many strategies. A [`Problem`] describes the state space (initial state, goal
//! test, successor function) and a [`Strategy`] picks the frontier discipline that decides which
//! generated node is expanded next. The loop itself, the explored set and all of the
//! instrumentation (expansions, wall-clock time, memory) are shared by every strategy so that
//! results are directly comparable.
//!
//! See Chapter 3: Solving Problems by Searching, figure 3.7 (best-first search) and section 3.4
//! (uninformed search strategies).

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::mem::size_of;
use std::str::FromStr;
use std::time::{Duration, Instant};

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

mod frontier;
mod result;

pub use frontier::{FifoFrontier, Frontier, LifoFrontier, PriorityFrontier};
pub use result::{BudgetLimit, Playback, SearchResult, SearchStats, SearchStatus};

/// Path and step costs. Costs are never negative.
pub type Cost = u64;

/// Hash set used for the explored set.
pub type HashSet<T> = rustc_hash::FxHashSet<T>;

/// An action that moves a [`Problem`] from one state to another.
pub trait Action: Clone + Copy + PartialEq + Eq + Hash + Debug + Serialize {}

/// A state of a [`Problem`]. States are immutable values: two states that compare equal are the
/// same state, which is what lets the explored set deduplicate them.
pub trait State: Clone + PartialEq + Eq + Hash + Debug {
    /// Bytes this state owns on the heap, on top of `size_of::<Self>()`. Only used for the memory
    /// statistic.
    fn heap_size(&self) -> usize {
        0
    }
}

/// One outgoing edge of the state space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Successor<_State, _Action> {
    /// The action taken.
    pub action: _Action,

    /// The state the action leads to.
    pub state: _State,

    /// Cost of taking the action.
    pub step_cost: Cost,
}

/// A search problem: an initial state, a goal test and a transition function.
pub trait Problem {
    /// State type of the problem.
    type State: State;

    /// Action type of the problem.
    type Action: Action;

    /// The state the search starts from.
    fn initial_state(&self) -> &Self::State;

    /// Whether `state` is a goal state.
    fn is_goal(&self, state: &Self::State) -> bool;

    /// All legal successors of `state`. The order must be deterministic, it decides how ties are
    /// explored.
    fn successors(&self, state: &Self::State) -> Vec<Successor<Self::State, Self::Action>>;
}

/// Estimate of the remaining cost from a state to the nearest goal.
///
/// For A* to return optimal paths the estimate must be admissible (never overestimate) and for
/// the graph-search variant used here it should also be consistent.
pub trait Heuristic<_State> {
    /// Estimated cost from `state` to a goal.
    fn estimate(&self, state: &_State) -> Cost;
}

impl<_State, F> Heuristic<_State> for F
where
    F: Fn(&_State) -> Cost,
{
    fn estimate(&self, state: &_State) -> Cost {
        self(state)
    }
}

/// Search error. These are configuration mistakes by the caller; a search that runs and does not
/// find a goal is reported through [`SearchStatus`] instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The strategy orders its frontier by a heuristic but none was given.
    #[error("strategy {0} requires a heuristic")]
    MissingHeuristic(Strategy),

    /// Strategy name could not be parsed.
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),
}

/// Search strategy. Selects the frontier discipline used by [`search`].
///
/// | Strategy | Frontier ordering | Optimal |
/// |---|---|---|
/// | `BreadthFirst` | FIFO | yes, when all step costs are equal |
/// | `DepthFirst` | LIFO | no |
/// | `UniformCost` | path cost | yes |
/// | `GreedyBestFirst` | heuristic | no |
/// | `AStar` | path cost + heuristic | yes, with a consistent heuristic |
///
/// Priority ties are broken by insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Breadth-first search.
    BreadthFirst,

    /// Depth-first search. Not optimal, and only complete because of the explored set.
    DepthFirst,

    /// Uniform-cost search (Dijkstra).
    UniformCost,

    /// Greedy best-first search. Not optimal.
    GreedyBestFirst,

    /// A* search.
    AStar,
}

impl Strategy {
    /// Every strategy, in the order they are usually compared.
    pub const ALL: [Strategy; 5] = [
        Strategy::BreadthFirst,
        Strategy::DepthFirst,
        Strategy::UniformCost,
        Strategy::GreedyBestFirst,
        Strategy::AStar,
    ];

    /// Short display name.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::BreadthFirst => "BFS",
            Strategy::DepthFirst => "DFS",
            Strategy::UniformCost => "UCS",
            Strategy::GreedyBestFirst => "Greedy",
            Strategy::AStar => "A*",
        }
    }

    /// Whether the frontier is ordered by a heuristic.
    pub fn uses_heuristic(&self) -> bool {
        matches!(self, Strategy::GreedyBestFirst | Strategy::AStar)
    }

    /// Whether the strategy is guaranteed to return a minimum-cost path. For breadth-first search
    /// this only holds when all step costs are equal.
    pub fn is_optimal(&self) -> bool {
        !matches!(self, Strategy::DepthFirst | Strategy::GreedyBestFirst)
    }

    /// A new, empty frontier with this strategy's discipline.
    pub fn frontier(&self) -> Box<dyn Frontier> {
        match self {
            Strategy::BreadthFirst => Box::<FifoFrontier>::default(),
            Strategy::DepthFirst => Box::<LifoFrontier>::default(),
            Strategy::UniformCost | Strategy::GreedyBestFirst | Strategy::AStar => {
                Box::<PriorityFrontier>::default()
            }
        }
    }

    /// Frontier priority of a node with path cost `path_cost` and heuristic value `h`. Lower is
    /// removed first. FIFO and LIFO frontiers ignore it.
    pub fn priority(&self, path_cost: Cost, h: Cost) -> Cost {
        match self {
            Strategy::BreadthFirst | Strategy::DepthFirst => 0,
            Strategy::UniformCost => path_cost,
            Strategy::GreedyBestFirst => h,
            Strategy::AStar => path_cost.saturating_add(h),
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Strategy {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bfs" | "breadth-first" => Ok(Strategy::BreadthFirst),
            "dfs" | "depth-first" => Ok(Strategy::DepthFirst),
            "ucs" | "uniform-cost" => Ok(Strategy::UniformCost),
            "greedy" | "greedy-best-first" => Ok(Strategy::GreedyBestFirst),
            "astar" | "a*" => Ok(Strategy::AStar),
            _ => Err(SearchError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Limits on a single search. Every limit is optional; the default is unlimited.
///
/// The time limit is checked once per loop iteration, the expansion limit just before a node
/// would be expanded, after its goal test. Exceeding either ends the search with
/// [`SearchStatus::BudgetExceeded`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Budget {
    /// Stop after this many expansions.
    pub max_expansions: Option<usize>,

    /// Stop once this much wall-clock time has passed.
    pub max_duration: Option<Duration>,

    /// Nodes deeper than this are discarded when they leave the frontier, goal or not. Mostly
    /// useful to keep depth-first search from wandering; a search that runs out of nodes because
    /// of it reports [`SearchStatus::Exhausted`].
    pub max_depth: Option<usize>,
}

impl Budget {
    /// No limits.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Limit the number of expansions.
    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = Some(max_expansions);
        self
    }

    /// Limit the wall-clock time.
    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = Some(max_duration);
        self
    }

    /// Limit the depth of expanded nodes.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    fn out_of_time(&self, elapsed: Duration) -> bool {
        matches!(self.max_duration, Some(max) if elapsed >= max)
    }

    fn out_of_expansions(&self, nodes_expanded: usize) -> bool {
        matches!(self.max_expansions, Some(max) if nodes_expanded >= max)
    }

    fn too_deep(&self, depth: usize) -> bool {
        matches!(self.max_depth, Some(max) if depth > max)
    }
}

new_key_type! {
    /// Key of a node in the search tree of a single run.
    pub struct NodeKey;
}

/// A node of the search tree. Children refer to their parent by key, never the other way around,
/// so the tree can be walked from any node back to the root but holds no cycles.
#[derive(Debug, Clone)]
struct SearchNode<_State, _Action> {
    state: _State,
    parent: Option<NodeKey>,
    action: Option<_Action>,
    path_cost: Cost,
    depth: usize,
}

/// Arena owning every node generated during one run.
struct SearchTree<_State, _Action> {
    nodes: slotmap::SlotMap<NodeKey, SearchNode<_State, _Action>>,
}

impl<_State, _Action> SearchTree<_State, _Action>
where
    _State: State,
    _Action: Action,
{
    fn new(root_state: _State) -> (Self, NodeKey) {
        let mut nodes = slotmap::SlotMap::with_key();
        let root = nodes.insert(SearchNode {
            state: root_state,
            parent: None,
            action: None,
            path_cost: 0,
            depth: 0,
        });
        (Self { nodes }, root)
    }

    fn get(&self, key: NodeKey) -> &SearchNode<_State, _Action> {
        &self.nodes[key]
    }

    fn add_child(
        &mut self,
        parent: NodeKey,
        successor: Successor<_State, _Action>,
    ) -> (NodeKey, Cost) {
        let (path_cost, depth) = {
            let parent_node = self.get(parent);
            (
                parent_node.path_cost.saturating_add(successor.step_cost),
                parent_node.depth + 1,
            )
        };
        let child = self.nodes.insert(SearchNode {
            state: successor.state,
            parent: Some(parent),
            action: Some(successor.action),
            path_cost,
            depth,
        });
        (child, path_cost)
    }

    /// Actions from the root to `key`, in execution order.
    fn path_to(&self, key: NodeKey) -> Vec<_Action> {
        let mut path = Vec::with_capacity(self.get(key).depth);
        let mut current = Some(key);
        while let Some(node_key) = current {
            let node = self.get(node_key);
            if let Some(action) = node.action {
                path.push(action);
            }
            current = node.parent;
        }
        path.reverse();
        path
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn memory(&self) -> usize {
        self.nodes.len() * size_of::<SearchNode<_State, _Action>>()
            + self
                .nodes
                .values()
                .map(|node| node.state.heap_size())
                .sum::<usize>()
    }
}

/// How the loop in [`search`] ended.
enum Termination {
    Goal(NodeKey),
    Failed(SearchStatus),
}

/// Run a graph search over `problem` with the frontier discipline of `strategy`.
///
/// `heuristic` is required for [`Strategy::GreedyBestFirst`] and [`Strategy::AStar`] and ignored
/// by the others. The goal test happens when a node is removed from the frontier, and a state is
/// only checked against the explored set at that point too, so a cheaper path to a state that is
/// already waiting in the frontier is never thrown away early. There is no decrease-key on the
/// frontier: duplicates are allowed in and the worse copies are discarded when they come out.
///
/// A search that does not reach a goal is not an error: the returned [`SearchResult`] carries
/// [`SearchStatus::Exhausted`] or [`SearchStatus::BudgetExceeded`].
pub fn search<_Problem>(
    problem: &_Problem,
    strategy: Strategy,
    heuristic: Option<&dyn Heuristic<_Problem::State>>,
    budget: &Budget,
) -> Result<SearchResult<_Problem::Action>, SearchError>
where
    _Problem: Problem,
{
    if strategy.uses_heuristic() && heuristic.is_none() {
        return Err(SearchError::MissingHeuristic(strategy));
    }
    let estimate = |state: &_Problem::State| heuristic.map_or(0, |h| h.estimate(state));

    let root_state = problem.initial_state().clone();
    let root_priority = strategy.priority(0, estimate(&root_state));
    let (mut tree, root) = SearchTree::new(root_state);
    let mut frontier = strategy.frontier();
    frontier.insert(root, root_priority);
    let mut explored: HashSet<_Problem::State> = HashSet::default();
    let mut stats = SearchStats {
        nodes_generated: 1,
        max_frontier_size: 1,
        ..SearchStats::default()
    };

    debug!("{}: starting search from {:?}", strategy, problem.initial_state());
    let start = Instant::now();

    let termination = loop {
        if budget.out_of_time(start.elapsed()) {
            break Termination::Failed(SearchStatus::BudgetExceeded(BudgetLimit::Duration));
        }
        let key = match frontier.remove_next() {
            Some(key) => key,
            None => break Termination::Failed(SearchStatus::Exhausted),
        };

        let node = tree.get(key);
        if budget.too_deep(node.depth) {
            continue;
        }
        if problem.is_goal(&node.state) {
            break Termination::Goal(key);
        }
        if explored.contains(&node.state) {
            continue;
        }
        // Only expansion is capped, a goal already in the frontier is still found.
        if budget.out_of_expansions(stats.nodes_expanded) {
            break Termination::Failed(SearchStatus::BudgetExceeded(BudgetLimit::Expansions));
        }

        trace!(
            "{}: expanding {:?} (cost {}, depth {})",
            strategy,
            node.state,
            node.path_cost,
            node.depth
        );
        explored.insert(node.state.clone());
        stats.nodes_expanded += 1;

        for successor in problem.successors(&node.state) {
            if explored.contains(&successor.state) {
                continue;
            }
            let h = estimate(&successor.state);
            let (child, path_cost) = tree.add_child(key, successor);
            frontier.insert(child, strategy.priority(path_cost, h));
            stats.nodes_generated += 1;
        }
        stats.max_frontier_size = stats.max_frontier_size.max(frontier.len());
    };

    stats.elapsed_time = start.elapsed();
    stats.peak_memory = tree.memory()
        + explored.len() * size_of::<_Problem::State>()
        + explored.iter().map(State::heap_size).sum::<usize>()
        + stats.max_frontier_size * frontier.entry_size();

    let result = match termination {
        Termination::Goal(key) => SearchResult::new(
            strategy.name(),
            SearchStatus::Success,
            tree.path_to(key),
            tree.get(key).path_cost,
            stats,
        ),
        Termination::Failed(status) => {
            SearchResult::new(strategy.name(), status, Vec::new(), 0, stats)
        }
    };
    debug!(
        "{}: {} after {} expansions, {} nodes in tree",
        strategy,
        result.status(),
        stats.nodes_expanded,
        tree.len()
    );
    Ok(result)
}
