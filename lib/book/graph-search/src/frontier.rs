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

//! Frontier disciplines. The frontier holds keys of generated-but-not-yet-expanded nodes; which
//! key comes out next is the only thing that differs between search strategies.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::mem::size_of;

use crate::{Cost, NodeKey};

/// A frontier of nodes waiting to be expanded.
pub trait Frontier {
    /// Add a node. `priority` is only used by ordered frontiers; lower comes out first.
    fn insert(&mut self, node: NodeKey, priority: Cost);

    /// Remove the next node to expand.
    fn remove_next(&mut self) -> Option<NodeKey>;

    /// Number of waiting nodes.
    fn len(&self) -> usize;

    /// Whether no nodes are waiting.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes used by one waiting node.
    fn entry_size(&self) -> usize {
        size_of::<NodeKey>()
    }
}

/// First in, first out. Breadth-first search.
#[derive(Debug, Default)]
pub struct FifoFrontier {
    queue: VecDeque<NodeKey>,
}

impl Frontier for FifoFrontier {
    fn insert(&mut self, node: NodeKey, _priority: Cost) {
        self.queue.push_back(node);
    }

    fn remove_next(&mut self) -> Option<NodeKey> {
        self.queue.pop_front()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}

/// Last in, first out. Depth-first search.
#[derive(Debug, Default)]
pub struct LifoFrontier {
    stack: Vec<NodeKey>,
}

impl Frontier for LifoFrontier {
    fn insert(&mut self, node: NodeKey, _priority: Cost) {
        self.stack.push(node);
    }

    fn remove_next(&mut self) -> Option<NodeKey> {
        self.stack.pop()
    }

    fn len(&self) -> usize {
        self.stack.len()
    }
}

// Field order matters: the derived Ord compares priority first, then the insertion sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct PriorityEntry {
    priority: Cost,
    sequence: u64,
    node: NodeKey,
}

/// Lowest priority first, ties broken by earliest insertion. Uniform-cost, greedy best-first and
/// A* search.
#[derive(Debug, Default)]
pub struct PriorityFrontier {
    heap: BinaryHeap<Reverse<PriorityEntry>>,
    inserted: u64,
}

impl Frontier for PriorityFrontier {
    fn insert(&mut self, node: NodeKey, priority: Cost) {
        self.heap.push(Reverse(PriorityEntry {
            priority,
            sequence: self.inserted,
            node,
        }));
        self.inserted += 1;
    }

    fn remove_next(&mut self) -> Option<NodeKey> {
        self.heap.pop().map(|Reverse(entry)| entry.node)
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn entry_size(&self) -> usize {
        size_of::<Reverse<PriorityEntry>>()
    }
}
