// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::{CostModel, Edge, RoadGraph, SearchError};

/// Result of a successful [search].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Ids of nodes on the found route, starting with the start node
    /// and ending with the goal node.
    pub path: Vec<i64>,

    /// Edges taken between consecutive nodes of [SearchOutcome::path].
    /// In the presence of parallel edges, these are exactly the edges used by the search.
    pub path_edges: Vec<Edge>,

    /// Total cost of the route, as computed by the [CostModel].
    pub cost: f64,

    /// Ids of nodes in the order they were expanded (taken off the frontier).
    pub expanded: Vec<i64>,

    /// Every successful relaxation, as (parent id, child id) pairs,
    /// in the order they were performed.
    pub relaxed: Vec<(i64, i64)>,
}

#[derive(Debug, Clone, Copy)]
struct QueueItem {
    at: i64,
    cost: f64,
    score: f64,
    seq: u64,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // NOTE: Rust's BinaryHeap is a max-heap, so "greater" items are popped first:
        // lower scores, then higher costs (deeper in the search), then earlier discovered.
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.cost.total_cmp(&other.cost))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

fn reconstruct_path(came_from: &HashMap<i64, (i64, Edge)>, mut last: i64) -> (Vec<i64>, Vec<Edge>) {
    let mut path = vec![last];
    let mut edges = Vec::default();

    while let Some(&(nd, edge)) = came_from.get(&last) {
        path.push(nd);
        edges.push(edge);
        last = nd;
    }

    path.reverse();
    edges.reverse();
    return (path, edges);
}

/// Uses the [A* algorithm](https://en.wikipedia.org/wiki/A*_search_algorithm)
/// to find the cheapest route between two nodes in the provided graph,
/// as defined by the provided [CostModel].
///
/// Apart from the route, the order of node expansions and edge relaxations is recorded
/// in the returned [SearchOutcome]. Ties between frontier entries with equal scores are
/// broken in favor of the entry with the higher cost from the start, and then in favor
/// of the entry discovered first, which makes the whole outcome deterministic.
///
/// Self-loops and edges to nodes missing from the graph are ignored.
///
/// The search is unbounded - concluding that no route exists requires expanding
/// every node reachable from the start. Use [search_with_limit] to guard against that.
pub fn search<C: CostModel + ?Sized>(
    g: &RoadGraph,
    cost_model: &C,
    from_id: i64,
    to_id: i64,
) -> Result<SearchOutcome, SearchError> {
    search_with_limit(g, cost_model, from_id, to_id, usize::MAX)
}

/// Same as [search], but fails with [SearchError::StepLimitExceeded] after more than
/// `step_limit` nodes were expanded. The recommended value is
/// [DEFAULT_STEP_LIMIT](crate::DEFAULT_STEP_LIMIT).
pub fn search_with_limit<C: CostModel + ?Sized>(
    g: &RoadGraph,
    cost_model: &C,
    from_id: i64,
    to_id: i64,
    step_limit: usize,
) -> Result<SearchOutcome, SearchError> {
    let mut queue: BinaryHeap<QueueItem> = BinaryHeap::default();
    let mut came_from: HashMap<i64, (i64, Edge)> = HashMap::default();
    let mut known_costs: HashMap<i64, f64> = HashMap::default();
    let mut closed: HashSet<i64> = HashSet::default();
    let mut expanded: Vec<i64> = Vec::default();
    let mut relaxed: Vec<(i64, i64)> = Vec::default();
    let mut steps: usize = 0;
    let mut seq: u64 = 0;

    let to_node = g.get_node(to_id).ok_or(SearchError::NoNodeFound)?;

    {
        let from_node = g.get_node(from_id).ok_or(SearchError::NoNodeFound)?;

        queue.push(QueueItem {
            at: from_id,
            cost: 0.0,
            score: cost_model.heuristic(&from_node, &to_node),
            seq,
        });
        known_costs.insert(from_id, 0.0);
        seq += 1;
    }

    while let Some(item) = queue.pop() {
        // Contrary to the wikipedia definition, we might keep multiple items in the queue for the same node.
        if closed.contains(&item.at)
            || item.cost > known_costs.get(&item.at).copied().unwrap_or(f64::INFINITY)
        {
            continue;
        }

        closed.insert(item.at);
        expanded.push(item.at);

        if item.at == to_id {
            let (path, path_edges) = reconstruct_path(&came_from, to_id);
            log::debug!(
                "route {} -> {} found: {} nodes, cost {:.3}, {} expansions, {} relaxations",
                from_id,
                to_id,
                path.len(),
                item.cost,
                expanded.len(),
                relaxed.len(),
            );
            return Ok(SearchOutcome {
                path,
                path_edges,
                cost: item.cost,
                expanded,
                relaxed,
            });
        }

        steps += 1;
        if steps > step_limit {
            log::debug!("route {} -> {}: step limit {} exceeded", from_id, to_id, step_limit);
            return Err(SearchError::StepLimitExceeded);
        }

        for edge in g.get_edges(item.at) {
            let neighbor_id = edge.to;

            // Self-loops can't improve anything, and closed nodes already have their final cost
            if neighbor_id == item.at || closed.contains(&neighbor_id) {
                continue;
            }

            // Check if the referred node exists
            let Some(neighbor) = g.get_node(neighbor_id) else {
                continue;
            };

            let edge_cost = cost_model.edge_cost(edge);
            if !edge_cost.is_finite() || edge_cost < 0.0 {
                return Err(SearchError::InvalidCostModel {
                    from: item.at,
                    to: neighbor_id,
                    cost: edge_cost,
                });
            }

            // Check if this is the cheapest way to the neighbor
            let neighbor_cost = item.cost + edge_cost;
            if neighbor_cost >= known_costs.get(&neighbor_id).copied().unwrap_or(f64::INFINITY) {
                continue;
            }

            // Push the new item into the queue
            came_from.insert(neighbor_id, (item.at, *edge));
            known_costs.insert(neighbor_id, neighbor_cost);
            relaxed.push((item.at, neighbor_id));
            queue.push(QueueItem {
                at: neighbor_id,
                cost: neighbor_cost,
                score: neighbor_cost + cost_model.heuristic(&neighbor, &to_node),
                seq,
            });
            seq += 1;
        }
    }

    log::debug!(
        "no route {} -> {}: frontier exhausted after {} expansions",
        from_id,
        to_id,
        expanded.len(),
    );
    Err(SearchError::NoPathFound {
        from: from_id,
        to: to_id,
    })
}
