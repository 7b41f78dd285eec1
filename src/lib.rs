// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Fastest and least-polluting routes over an annotated city road network.
//!
//! The road network is a weighted directed [RoadGraph], usually loaded from a GraphML
//! snapshot written by an offline preprocessing step (see [graphml]). Every [Edge] carries
//! its length, free-flow speed, a pollution multiplier and an intersection-approach flag.
//!
//! Routes are found with a single A* implementation ([search]), parametrized by
//! a [CostModel]. Two cost models are provided: [TimeCostModel] (minimize travel time)
//! and [PollutionCostModel] (minimize the estimated pollution exposure). Apart from the
//! route itself, every search records the order in which nodes were expanded and edges
//! were relaxed, so that the search can be replayed on a map.
//!
//! # Example
//!
//! ```no_run
//! let g = greenroute::graphml::load_from_file(
//!     &greenroute::graphml::Options::default(),
//!     "path/to/city.graphml.gz",
//! ).expect("failed to load the road network");
//!
//! let routes = greenroute::compute_routes(&g, -6.1754, 106.8272, -6.2088, 106.8456)
//!     .expect("failed to find routes");
//!
//! println!("{}", serde_json::to_string(&routes).unwrap());
//! ```

mod astar;
mod cost;
mod distance;
mod graph;
pub mod graphml;
mod kd;
mod query;
mod road_type;
mod route;

pub use astar::{search, search_with_limit, SearchError, SearchOutcome, DEFAULT_STEP_LIMIT};
pub use cost::{
    CostModel, PollutionCostModel, TimeCostModel, DEFAULT_MAX_SPEED_KMH,
    INTERSECTION_APPROACH_PENALTY, MIN_POLLUTION_MULTIPLIER,
};
pub use distance::earth_distance;
pub use graph::{Bbox, GraphError, RoadGraph};
pub use kd::KDTree;
pub use query::{
    compute_routes, RoutePair, RouteQuery, FASTEST_ROUTE_NAME, GREENEST_ROUTE_NAME,
};
pub use road_type::RoadType;
pub use route::{RouteResult, RouteStats};

/// Represents an intersection or a shape point of the [RoadGraph].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
}

impl Node {
    /// Returns the position of the node as a `[lat, lon]` pair.
    #[inline]
    pub fn coordinates(&self) -> [f64; 2] {
        [self.lat, self.lon]
    }
}

/// Represents an outgoing (one-way) road segment from a specific [Node].
///
/// `length_m` must not be shorter than the crow-flies distance between the two nodes,
/// otherwise the A* heuristics stop being admissible.
///
/// Due to implementation details, `to` might not exist in the [RoadGraph].
/// Users must silently ignore such edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: i64,

    /// Length of the road segment, in meters.
    pub length_m: f64,

    /// Expected speed on an empty road, in km/h. Must be positive.
    pub free_flow_speed_kmh: f64,

    /// Relative pollution exposure per kilometer, depending on the road type.
    /// Must be at least [MIN_POLLUTION_MULTIPLIER].
    pub pollution_multiplier: f64,

    /// Whether traversing the edge approaches a junction, incurring
    /// the stop-and-go [INTERSECTION_APPROACH_PENALTY].
    pub is_intersection_approach: bool,

    pub road_type: RoadType,
}

impl Edge {
    /// Time needed to traverse the edge at free-flow speed, in seconds.
    #[inline]
    pub fn travel_time_s(&self) -> f64 {
        self.length_m / (self.free_flow_speed_kmh / 3.6)
    }

    /// Estimated pollution exposure when traversing the edge.
    pub fn pollution_score(&self) -> f64 {
        let penalty = if self.is_intersection_approach {
            INTERSECTION_APPROACH_PENALTY
        } else {
            1.0
        };
        self.length_m / 1000.0 * self.pollution_multiplier * penalty
    }
}

#[cfg(test)]
pub(crate) mod test_graphs;
