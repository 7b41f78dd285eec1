// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{earth_distance, Edge, Node, RoadGraph};

/// Assumed maximum speed on the road network, in km/h.
pub const DEFAULT_MAX_SPEED_KMH: f64 = 80.0;

/// Lowest pollution multiplier of any road type. Multipliers of all
/// [Edges](Edge) must not be less than this value.
pub const MIN_POLLUTION_MULTIPLIER: f64 = 1.0;

/// Multiplier of the pollution score of edges approaching an intersection,
/// representing stop-and-go traffic.
pub const INTERSECTION_APPROACH_PENALTY: f64 = 1.10;

/// Defines a single optimization objective for [search](crate::search).
///
/// Implementations must uphold the following invariants, otherwise
/// A* is no longer guaranteed to return the optimal route:
/// - `edge_cost` must be finite and not less than zero,
/// - `heuristic` must never overestimate the cost of reaching `b` from `a` (admissibility),
/// - `heuristic(a, c) <= edge_cost(a -> b) + heuristic(b, c)` (consistency).
pub trait CostModel {
    /// Cost of traversing the provided edge.
    fn edge_cost(&self, edge: &Edge) -> f64;

    /// Estimated cost of reaching `b` from `a`.
    fn heuristic(&self, a: &Node, b: &Node) -> f64;
}

/// Minimizes travel time at free-flow speeds, in seconds.
///
/// The heuristic is the crow-flies distance covered at the maximum speed of the network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeCostModel {
    max_speed_mps: f64,
}

impl TimeCostModel {
    /// Creates a time cost model, assuming that no edge has a free-flow speed
    /// above `max_speed_kmh`.
    pub fn with_max_speed(max_speed_kmh: f64) -> Self {
        assert!(max_speed_kmh.is_finite() && max_speed_kmh > 0.0);
        Self {
            max_speed_mps: max_speed_kmh / 3.6,
        }
    }

    /// Creates a time cost model whose heuristic is admissible for the provided graph.
    ///
    /// Uses [DEFAULT_MAX_SPEED_KMH], unless the graph contains a faster edge.
    pub fn for_graph(g: &RoadGraph) -> Self {
        match g.max_speed_kmh() {
            Some(speed) if speed > DEFAULT_MAX_SPEED_KMH => {
                log::debug!(
                    "raising the assumed maximum speed from {:.1} km/h to {:.1} km/h",
                    DEFAULT_MAX_SPEED_KMH,
                    speed,
                );
                Self::with_max_speed(speed)
            }
            _ => Self::default(),
        }
    }

    /// Maximum assumed speed, in km/h.
    pub fn max_speed_kmh(&self) -> f64 {
        self.max_speed_mps * 3.6
    }
}

impl Default for TimeCostModel {
    fn default() -> Self {
        Self::with_max_speed(DEFAULT_MAX_SPEED_KMH)
    }
}

impl CostModel for TimeCostModel {
    #[inline]
    fn edge_cost(&self, edge: &Edge) -> f64 {
        edge.travel_time_s()
    }

    fn heuristic(&self, a: &Node, b: &Node) -> f64 {
        earth_distance(a.lat, a.lon, b.lat, b.lon) * 1000.0 / self.max_speed_mps
    }
}

/// Minimizes the estimated pollution exposure, see [Edge::pollution_score].
///
/// The heuristic is the crow-flies distance (in kilometers) travelled
/// along the cleanest possible road type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollutionCostModel;

impl CostModel for PollutionCostModel {
    #[inline]
    fn edge_cost(&self, edge: &Edge) -> f64 {
        edge.pollution_score()
    }

    fn heuristic(&self, a: &Node, b: &Node) -> f64 {
        earth_distance(a.lat, a.lon, b.lat, b.lon) * MIN_POLLUTION_MULTIPLIER
    }
}
