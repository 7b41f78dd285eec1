// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use serde::Serialize;

use crate::{
    search_with_limit, CostModel, KDTree, Node, PollutionCostModel, RoadGraph, RouteResult,
    SearchError, TimeCostModel,
};

/// Name of [RoutePair::time_route], see [RouteStats::name](crate::RouteStats::name).
pub const FASTEST_ROUTE_NAME: &str = "Fastest Route";

/// Name of [RoutePair::pollution_route], see [RouteStats::name](crate::RouteStats::name).
pub const GREENEST_ROUTE_NAME: &str = "Greenest Route";

/// The fastest and the least-polluting routes between the same two points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePair {
    pub time_route: RouteResult,
    pub pollution_route: RouteResult,
}

/// Finds the fastest and the least-polluting routes between two positions.
///
/// Both positions are snapped to the nearest nodes of the graph, and both searches
/// run in parallel. Positions far outside of the network are still snapped to its
/// closest nodes; callers should check them against [RoadGraph::bbox] beforehand.
///
/// See [RouteQuery] for more options.
pub fn compute_routes(
    g: &RoadGraph,
    start_lat: f64,
    start_lon: f64,
    end_lat: f64,
    end_lon: f64,
) -> Result<RoutePair, SearchError> {
    RouteQuery::new(g).compute(start_lat, start_lon, end_lat, end_lon)
}

/// Configures how routes are computed over a specific [RoadGraph].
///
/// A RouteQuery only borrows the graph (and optionally a [KDTree] built over it),
/// and can be reused across any number of requests, also from multiple threads.
#[derive(Debug, Clone, Copy)]
pub struct RouteQuery<'a> {
    g: &'a RoadGraph,
    index: Option<&'a KDTree>,
    step_limit: usize,
    time_model: TimeCostModel,
}

impl<'a> RouteQuery<'a> {
    pub fn new(g: &'a RoadGraph) -> Self {
        Self {
            g,
            index: None,
            step_limit: usize::MAX,
            time_model: TimeCostModel::for_graph(g),
        }
    }

    /// Use a [KDTree] for snapping positions to nodes, instead of scanning all nodes.
    /// The tree must have been built from the same graph.
    pub fn with_index(self, index: &'a KDTree) -> Self {
        Self {
            index: Some(index),
            ..self
        }
    }

    /// Limit the number of node expansions of every search,
    /// see [search_with_limit](crate::search_with_limit).
    pub fn with_step_limit(self, step_limit: usize) -> Self {
        Self { step_limit, ..self }
    }

    /// Finds the node closest to the provided position.
    pub fn nearest_node(&self, lat: f64, lon: f64) -> Result<Node, SearchError> {
        match self.index {
            Some(index) => Ok(index.find_nearest_node(lat, lon)),
            None => self.g.find_nearest_node(lat, lon),
        }
    }

    /// Snaps both positions to the graph and finds routes between them.
    pub fn compute(
        &self,
        start_lat: f64,
        start_lon: f64,
        end_lat: f64,
        end_lon: f64,
    ) -> Result<RoutePair, SearchError> {
        let start = self.nearest_node(start_lat, start_lon)?;
        let end = self.nearest_node(end_lat, end_lon)?;
        log::debug!(
            "snapped ({}, {}) to node {} and ({}, {}) to node {}",
            start_lat,
            start_lon,
            start.id,
            end_lat,
            end_lon,
            end.id,
        );
        self.compute_between(start.id, end.id)
    }

    /// Finds routes between two nodes of the graph.
    ///
    /// If any of the two searches fails, its error is returned;
    /// the time search error takes precedence.
    pub fn compute_between(&self, from_id: i64, to_id: i64) -> Result<RoutePair, SearchError> {
        let (time_route, pollution_route) = rayon::join(
            || self.route(&self.time_model, from_id, to_id, FASTEST_ROUTE_NAME),
            || self.route(&PollutionCostModel, from_id, to_id, GREENEST_ROUTE_NAME),
        );

        Ok(RoutePair {
            time_route: time_route?,
            pollution_route: pollution_route?,
        })
    }

    fn route<C: CostModel + ?Sized>(
        &self,
        cost_model: &C,
        from_id: i64,
        to_id: i64,
        name: &str,
    ) -> Result<RouteResult, SearchError> {
        let outcome = search_with_limit(self.g, cost_model, from_id, to_id, self.step_limit)?;
        let mut route = RouteResult::build(self.g, &outcome)?;
        route.stats.name = name.to_string();
        Ok(route)
    }
}
