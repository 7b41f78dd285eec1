// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{RoadGraph, RoadType, SearchError, SearchOutcome};

/// Aggregated statistics of a found route.
///
/// All values are computed from the edges of the route only,
/// regardless of the cost model used to find it.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RouteStats {
    /// Human-readable label of the route, set by [RouteQuery](crate::RouteQuery).
    /// Empty for routes built directly with [RouteResult::build].
    pub name: String,

    pub distance_km: f64,
    pub time_minutes: f64,
    pub pollution_score: f64,

    /// Number of edges on the route.
    pub num_segments: usize,

    /// Number of edges on the route, per road type.
    pub road_types: BTreeMap<RoadType, usize>,
}

/// A found route, together with the exploration trace of the search which found it,
/// ready to be displayed on a map. All positions are `[lat, lon]` pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResult {
    pub path: Vec<[f64; 2]>,

    pub stats: RouteStats,

    /// Positions of expanded nodes, in expansion order.
    #[serde(rename = "explored")]
    pub explored_nodes: Vec<[f64; 2]>,

    /// Relaxed edges as `[parent, child]` position pairs, in relaxation order.
    pub explored_edges: Vec<[[f64; 2]; 2]>,
}

impl RouteResult {
    /// Converts a [SearchOutcome] into a [RouteResult].
    ///
    /// The outcome must come from a search over the same graph; otherwise
    /// [SearchError::NoNodeFound] is returned for nodes missing from the graph.
    pub fn build(g: &RoadGraph, outcome: &SearchOutcome) -> Result<Self, SearchError> {
        let position = |id: i64| {
            g.get_node(id)
                .map(|n| n.coordinates())
                .ok_or(SearchError::NoNodeFound)
        };

        let path = outcome
            .path
            .iter()
            .map(|&id| position(id))
            .collect::<Result<Vec<_>, _>>()?;

        let explored_nodes = outcome
            .expanded
            .iter()
            .map(|&id| position(id))
            .collect::<Result<Vec<_>, _>>()?;

        let explored_edges = outcome
            .relaxed
            .iter()
            .map(|&(parent, child)| -> Result<_, SearchError> {
                Ok([position(parent)?, position(child)?])
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut stats = RouteStats::default();
        let mut length_m = 0.0;
        let mut time_s = 0.0;
        for edge in &outcome.path_edges {
            length_m += edge.length_m;
            time_s += edge.travel_time_s();
            stats.pollution_score += edge.pollution_score();
            *stats.road_types.entry(edge.road_type).or_default() += 1;
        }
        stats.distance_km = length_m / 1000.0;
        stats.time_minutes = time_s / 60.0;
        stats.num_segments = outcome.path_edges.len();

        Ok(Self {
            path,
            stats,
            explored_nodes,
            explored_edges,
        })
    }
}
