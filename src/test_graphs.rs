// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Small synthetic road networks shared by unit tests.

use std::collections::HashMap;

use crate::{earth_distance, CostModel, Edge, Node, RoadGraph, RoadType};

/// Builds a [RoadGraph] from nodes and edges with explicit attributes.
pub struct TestGraphBuilder {
    g: RoadGraph,
}

impl TestGraphBuilder {
    pub fn new() -> Self {
        Self {
            g: RoadGraph::new(),
        }
    }

    pub fn node(mut self, id: i64, lat: f64, lon: f64) -> Self {
        self.g.set_node(Node { id, lat, lon }).unwrap();
        self
    }

    pub fn edge(
        mut self,
        from: i64,
        to: i64,
        length_m: f64,
        speed_kmh: f64,
        multiplier: f64,
        intersection: bool,
        road_type: RoadType,
    ) -> Self {
        self.g
            .add_edge(
                from,
                Edge {
                    to,
                    length_m,
                    free_flow_speed_kmh: speed_kmh,
                    pollution_multiplier: multiplier,
                    is_intersection_approach: intersection,
                    road_type,
                },
            )
            .unwrap();
        self
    }

    /// Adds an edge with a given length and default attributes.
    pub fn plain_edge(self, from: i64, to: i64, length_m: f64) -> Self {
        self.edge(from, to, length_m, 50.0, 1.0, false, RoadType::Unknown)
    }

    /// Adds an edge whose length is the crow-flies distance between its nodes
    /// multiplied by `stretch` (which must be at least 1).
    pub fn road(
        self,
        from: i64,
        to: i64,
        stretch: f64,
        speed_kmh: f64,
        multiplier: f64,
        intersection: bool,
    ) -> Self {
        let a = self.g.get_node(from).unwrap();
        let b = self.g.get_node(to).unwrap();
        // Round up to whole meters, so that lengths never undercut the crow-flies distance
        let length_m = (earth_distance(a.lat, a.lon, b.lat, b.lon) * 1000.0 * stretch).ceil();
        self.edge(
            from,
            to,
            length_m,
            speed_kmh,
            multiplier,
            intersection,
            RoadType::Unknown,
        )
    }

    pub fn build(self) -> RoadGraph {
        self.g
    }
}

/// A 4-node square. The 2-edge route 1 -> 2 -> 4 uses a long and fast, but heavily
/// polluted arterial road; the 3-edge detour 1 -> 3 -> 2 -> 4 is much shorter,
/// but goes through slow stop-and-go living streets.
///
/// ```text
///        4
///        │
///   ┌────2
///   │    │
///   1────3
/// ```
///
/// (the arterial 1 -> 2 is drawn on the left)
pub fn square() -> RoadGraph {
    TestGraphBuilder::new()
        .node(1, 0.0, 0.0)
        .node(3, 0.0, 0.004)
        .node(2, 0.004, 0.004)
        .node(4, 0.008, 0.004)
        .edge(1, 2, 3000.0, 80.0, 3.0, false, RoadType::Primary)
        .edge(1, 3, 600.0, 10.0, 1.0, true, RoadType::LivingStreet)
        .edge(3, 2, 600.0, 10.0, 1.0, true, RoadType::LivingStreet)
        .edge(2, 4, 500.0, 50.0, 1.5, false, RoadType::Secondary)
        .build()
}

/// Two components: a triangle {1, 2, 3} and a pair {10, 11}, plus an isolated node 20.
pub fn disconnected() -> RoadGraph {
    TestGraphBuilder::new()
        .node(1, 0.0, 0.0)
        .node(2, 0.0, 0.01)
        .node(3, 0.01, 0.0)
        .node(10, 0.05, 0.05)
        .node(11, 0.05, 0.06)
        .node(20, 0.02, 0.02)
        .road(1, 2, 1.2, 50.0, 1.5, false)
        .road(2, 3, 1.2, 50.0, 1.5, false)
        .road(3, 1, 1.2, 50.0, 1.5, false)
        .road(10, 11, 1.2, 50.0, 1.5, false)
        .road(11, 10, 1.2, 50.0, 1.5, false)
        .build()
}

/// A 4x4 grid of streets with varied lengths, speeds and multipliers.
/// Most streets are two-way; a few are one-way, so some node pairs are unreachable
/// in one direction. Node ids are `row * 4 + col + 1`.
pub fn grid() -> RoadGraph {
    const SPEEDS: [f64; 4] = [20.0, 30.0, 50.0, 80.0];
    const MULTIPLIERS: [f64; 4] = [1.0, 1.6, 2.5, 3.0];

    let mut b = TestGraphBuilder::new();
    for row in 0..4 {
        for col in 0..4 {
            b = b.node(id(row, col), row as f64 * 0.003, col as f64 * 0.003);
        }
    }

    let add = |b: TestGraphBuilder, from: i64, to: i64| {
        let k = (from * 7 + to * 13) as usize;
        b.road(
            from,
            to,
            1.0 + (k % 10) as f64 * 0.15,
            SPEEDS[k % 4],
            MULTIPLIERS[(k / 4) % 4],
            k % 3 == 0,
        )
    };

    for row in 0..4 {
        for col in 0..4 {
            let here = id(row, col);
            if col < 3 {
                b = add(b, here, id(row, col + 1));
                // The top row is a one-way street, going east
                if row != 3 {
                    b = add(b, id(row, col + 1), here);
                }
            }
            if row < 3 {
                b = add(b, here, id(row + 1, col));
                // The rightmost column is a one-way street, going north
                if col != 3 {
                    b = add(b, id(row + 1, col), here);
                }
            }
            if row < 3 && col < 3 && (row + col) % 2 == 0 {
                b = add(b, here, id(row + 1, col + 1));
            }
        }
    }

    b.build()
}

fn id(row: i64, col: i64) -> i64 {
    row * 4 + col + 1
}

/// Computes the costs of the cheapest routes from `from` to every reachable node
/// with the Bellman-Ford algorithm, which doesn't rely on any heuristic.
pub fn reference_costs<C: CostModel>(g: &RoadGraph, cost: &C, from: i64) -> HashMap<i64, f64> {
    let mut costs = HashMap::from([(from, 0.0)]);

    for _ in 0..g.len() {
        let mut changed = false;
        for node in g.iter() {
            let Some(&base) = costs.get(&node.id) else {
                continue;
            };
            for edge in g.get_edges(node.id) {
                let candidate = base + cost.edge_cost(edge);
                if candidate < costs.get(&edge.to).copied().unwrap_or(f64::INFINITY) {
                    costs.insert(edge.to, candidate);
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }

    costs
}
