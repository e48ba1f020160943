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

use std::fmt::Display;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Action, Cost};

/// Which budget limit ended a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BudgetLimit {
    /// The expansion limit was reached.
    Expansions,

    /// The wall-clock limit was reached.
    Duration,
}

/// Terminal state of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchStatus {
    /// A goal state was reached.
    Success,

    /// The frontier ran empty without reaching a goal.
    Exhausted,

    /// A [`crate::Budget`] limit was hit before a goal was reached.
    BudgetExceeded(BudgetLimit),
}

impl Display for SearchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchStatus::Success => write!(f, "success"),
            SearchStatus::Exhausted => write!(f, "no solution"),
            SearchStatus::BudgetExceeded(BudgetLimit::Expansions) => {
                write!(f, "expansion budget exceeded")
            }
            SearchStatus::BudgetExceeded(BudgetLimit::Duration) => {
                write!(f, "time budget exceeded")
            }
        }
    }
}

/// Counters collected around the search loop. Every strategy is measured at the same points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Nodes whose successors were generated.
    pub nodes_expanded: usize,

    /// Nodes created, including the root.
    pub nodes_generated: usize,

    /// Largest number of nodes waiting in the frontier at once.
    pub max_frontier_size: usize,

    /// Wall-clock time spent in the search loop.
    pub elapsed_time: Duration,

    /// Estimated peak memory of the search tree, explored set and frontier, in bytes.
    pub peak_memory: usize,
}

/// Outcome of one search run. Built once when the search terminates and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult<_Action: Action> {
    algorithm: String,
    status: SearchStatus,
    path: Vec<_Action>,
    path_cost: Cost,
    stats: SearchStats,
}

impl<_Action: Action> SearchResult<_Action> {
    /// Build a result. Failed results should carry an empty path and zero cost.
    pub fn new(
        algorithm: impl Into<String>,
        status: SearchStatus,
        path: Vec<_Action>,
        path_cost: Cost,
        stats: SearchStats,
    ) -> Self {
        Self {
            algorithm: algorithm.into(),
            status,
            path,
            path_cost,
            stats,
        }
    }

    /// Name of the algorithm that produced this result.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Terminal state of the search.
    pub fn status(&self) -> SearchStatus {
        self.status
    }

    /// Whether a goal was reached.
    pub fn success(&self) -> bool {
        self.status == SearchStatus::Success
    }

    /// Actions from the initial state to the goal. Empty when the initial state already is a goal
    /// or when the search failed.
    pub fn path(&self) -> &[_Action] {
        &self.path
    }

    /// Total cost of [`Self::path`].
    pub fn path_cost(&self) -> Cost {
        self.path_cost
    }

    /// All collected counters.
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Nodes expanded.
    pub fn nodes_expanded(&self) -> usize {
        self.stats.nodes_expanded
    }

    /// Nodes generated, including the root.
    pub fn nodes_generated(&self) -> usize {
        self.stats.nodes_generated
    }

    /// Largest frontier size seen.
    pub fn max_frontier_size(&self) -> usize {
        self.stats.max_frontier_size
    }

    /// Time spent in the search loop.
    pub fn elapsed_time(&self) -> Duration {
        self.stats.elapsed_time
    }

    /// Estimated peak memory in bytes.
    pub fn peak_memory(&self) -> usize {
        self.stats.peak_memory
    }

    /// Step through the path one action at a time. Every call starts from the first action.
    pub fn playback(&self) -> Playback<'_, _Action> {
        Playback::new(&self.path)
    }
}

impl<_Action: Action> Display for SearchResult<_Action> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}, {} steps, cost {}, {} expanded, {:.3} ms, {} bytes",
            self.algorithm,
            self.status,
            self.path.len(),
            self.path_cost,
            self.stats.nodes_expanded,
            self.stats.elapsed_time.as_secs_f64() * 1000.0,
            self.stats.peak_memory
        )
    }
}

/// Lazy, restartable walk over a solution path. Holds no timing state; the caller decides when to
/// take the next step.
#[derive(Debug, Clone)]
pub struct Playback<'a, _Action> {
    path: &'a [_Action],
    position: usize,
}

impl<'a, _Action: Copy> Playback<'a, _Action> {
    /// Playback starting at the first action of `path`.
    pub fn new(path: &'a [_Action]) -> Self {
        Self { path, position: 0 }
    }

    /// Go back to the first action.
    pub fn restart(&mut self) {
        self.position = 0;
    }

    /// Number of actions already produced.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of actions left.
    pub fn remaining(&self) -> usize {
        self.path.len() - self.position
    }
}

impl<'a, _Action: Copy> Iterator for Playback<'a, _Action> {
    type Item = _Action;

    fn next(&mut self) -> Option<Self::Item> {
        let action = self.path.get(self.position).copied()?;
        self.position += 1;
        Some(action)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

impl<'a, _Action: Copy> ExactSizeIterator for Playback<'a, _Action> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    enum Step {
        Left,
        Right,
    }

    impl Action for Step {}

    fn solved() -> SearchResult<Step> {
        SearchResult::new(
            "test",
            SearchStatus::Success,
            vec![Step::Left, Step::Right, Step::Right],
            3,
            SearchStats::default(),
        )
    }

    #[test]
    fn test_playback_yields_path_in_order() {
        let result = solved();
        let played: Vec<Step> = result.playback().collect();
        assert_eq!(played, result.path());
    }

    #[test]
    fn test_playback_restarts_from_beginning() {
        let result = solved();
        let mut playback = result.playback();
        assert_eq!(playback.next(), Some(Step::Left));
        assert_eq!(playback.next(), Some(Step::Right));
        assert_eq!(playback.remaining(), 1);

        playback.restart();
        assert_eq!(playback.position(), 0);
        assert_eq!(playback.len(), 3);
        assert_eq!(playback.next(), Some(Step::Left));

        // A fresh playback is independent of any earlier one.
        assert_eq!(result.playback().count(), 3);
    }

    #[test]
    fn test_playback_of_empty_path_is_empty() {
        let result: SearchResult<Step> = SearchResult::new(
            "test",
            SearchStatus::Exhausted,
            Vec::new(),
            0,
            SearchStats::default(),
        );
        assert!(!result.success());
        assert_eq!(result.playback().next(), None);
    }

    #[test]
    fn test_status_display_distinguishes_failures() {
        assert_eq!(SearchStatus::Exhausted.to_string(), "no solution");
        assert_eq!(
            SearchStatus::BudgetExceeded(BudgetLimit::Expansions).to_string(),
            "expansion budget exceeded"
        );
        assert_ne!(
            SearchStatus::BudgetExceeded(BudgetLimit::Duration),
            SearchStatus::Exhausted
        );
    }
}
