// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Recommended number of allowed node expansions in [search_with_limit](crate::search_with_limit)
/// before [SearchError::StepLimitExceeded] is returned.
pub const DEFAULT_STEP_LIMIT: usize = 1_000_000;

/// Error conditions which may occur when looking for a route.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SearchError {
    /// The graph is empty, or the start or end nodes don't exist in the graph.
    #[error("no matching node in the road network")]
    NoNodeFound,

    /// Both nodes exist, but there is no directed path between them.
    /// This can happen due to one-way streets or disconnected networks.
    #[error("no route from node {from} to node {to}")]
    NoPathFound { from: i64, to: i64 },

    /// A [CostModel](crate::CostModel) returned a negative or non-finite cost,
    /// violating preconditions of A*. This is a programming error.
    #[error("cost model returned an invalid cost {cost} for edge {from} -> {to}")]
    InvalidCostModel { from: i64, to: i64, cost: f64 },

    /// Route search has exceeded its limit of steps.
    /// Either the nodes are really far apart, or no route exists.
    ///
    /// Concluding that no route exists requires traversing the whole graph,
    /// which can result in a denial-of-service. The step limit protects
    /// against resource exhaustion.
    #[error("step limit exceeded")]
    StepLimitExceeded,
}
