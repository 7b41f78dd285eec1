// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{earth_distance, Edge, Node, SearchError, MIN_POLLUTION_MULTIPLIER};
use std::collections::btree_map::{BTreeMap, Entry};

/// Error conditions which may occur when building a [RoadGraph].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("node {0} has non-finite coordinates")]
    InvalidNode(i64),

    #[error("edge from node {0} does not exist")]
    UnknownNode(i64),

    #[error("edge {from} -> {to} has invalid attributes")]
    InvalidEdge { from: i64, to: i64 },
}

/// Geographical extent of a [RoadGraph], in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl Bbox {
    /// Checks whether a position lies within the box (boundary inclusive).
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

/// Represents an annotated road network as a set of [Nodes](Node)
/// and directed [Edges](Edge) between them.
///
/// The graph is built once (usually by [graphml](crate::graphml)) and then only
/// shared by reference between searches, which never modify it.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RoadGraph {
    nodes: BTreeMap<i64, (Node, Vec<Edge>)>,

    /// Highest free-flow speed of all edges, kept up-to-date by [RoadGraph::add_edge].
    max_speed_kmh: Option<f64>,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|(_, edges)| edges.len()).sum()
    }

    /// Returns an iterator over all [Nodes](Node) in the graph, in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().map(|(_, (node, _))| node)
    }

    /// Retrieves a [Node] with the provided id.
    pub fn get_node(&self, id: i64) -> Option<Node> {
        self.nodes.get(&id).map(|&(node, _)| node)
    }

    /// Creates or updates a [Node] with `node.id`.
    ///
    /// All outgoing and incoming edges are preserved.
    pub fn set_node(&mut self, node: Node) -> Result<(), GraphError> {
        if !node.lat.is_finite() || !node.lon.is_finite() {
            return Err(GraphError::InvalidNode(node.id));
        }

        match self.nodes.entry(node.id) {
            Entry::Vacant(e) => {
                e.insert((node, Vec::default()));
            }
            Entry::Occupied(mut e) => {
                debug_assert_eq!(e.get().0.id, node.id);
                e.get_mut().0 = node;
            }
        }
        Ok(())
    }

    /// Finds the closest [Node] to the given position.
    ///
    /// This function requires computing the distance to every [Node] in the graph,
    /// see [KDTree](crate::KDTree) for a faster alternative on large graphs.
    /// Ties are resolved in favor of the lowest node id.
    ///
    /// Positions outside of the network still resolve to a node; use [RoadGraph::bbox]
    /// to reject them beforehand.
    pub fn find_nearest_node(&self, lat: f64, lon: f64) -> Result<Node, SearchError> {
        // Nodes are visited in ascending id order, and min_by returns
        // the first of equal elements - the lowest id wins ties.
        self.iter()
            .map(|&nd| (earth_distance(lat, lon, nd.lat, nd.lon), nd))
            .min_by(|(a_dist, _), (b_dist, _)| a_dist.total_cmp(b_dist))
            .map(|(_, nd)| nd)
            .ok_or(SearchError::NoNodeFound)
    }

    /// Gets all outgoing [Edges](Edge) from a node with a given id.
    pub fn get_edges(&self, from_id: i64) -> &[Edge] {
        self.nodes
            .get(&from_id)
            .map(|(_, e)| e.as_slice())
            .unwrap_or_default()
    }

    /// Adds an [Edge] from a node with a given id.
    ///
    /// Parallel edges (with the same `from_id` and `edge.to`) are kept as separate
    /// edges, as they usually represent different carriageways of a road.
    pub fn add_edge(&mut self, from_id: i64, edge: Edge) -> Result<(), GraphError> {
        let valid = edge.length_m.is_finite()
            && edge.length_m >= 0.0
            && edge.free_flow_speed_kmh.is_finite()
            && edge.free_flow_speed_kmh > 0.0
            && edge.pollution_multiplier.is_finite()
            && edge.pollution_multiplier >= MIN_POLLUTION_MULTIPLIER;
        if !valid {
            return Err(GraphError::InvalidEdge {
                from: from_id,
                to: edge.to,
            });
        }

        match self.nodes.get_mut(&from_id) {
            Some((_, edges)) => {
                edges.push(edge);
                self.max_speed_kmh = Some(match self.max_speed_kmh {
                    Some(speed) => speed.max(edge.free_flow_speed_kmh),
                    None => edge.free_flow_speed_kmh,
                });
                Ok(())
            }
            None => Err(GraphError::UnknownNode(from_id)),
        }
    }

    /// Returns the smallest box containing all nodes, or `None` for an empty graph.
    pub fn bbox(&self) -> Option<Bbox> {
        self.iter().fold(None, |acc, n| {
            Some(match acc {
                None => Bbox {
                    min_lat: n.lat,
                    min_lon: n.lon,
                    max_lat: n.lat,
                    max_lon: n.lon,
                },
                Some(b) => Bbox {
                    min_lat: b.min_lat.min(n.lat),
                    min_lon: b.min_lon.min(n.lon),
                    max_lat: b.max_lat.max(n.lat),
                    max_lon: b.max_lon.max(n.lon),
                },
            })
        })
    }

    /// Returns the highest free-flow speed over all edges, in km/h.
    #[inline]
    pub fn max_speed_kmh(&self) -> Option<f64> {
        self.max_speed_kmh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RoadType;

    fn edge(to: i64, length_m: f64) -> Edge {
        Edge {
            to,
            length_m,
            free_flow_speed_kmh: 50.0,
            pollution_multiplier: 1.5,
            is_intersection_approach: false,
            road_type: RoadType::Primary,
        }
    }

    fn three_nodes() -> RoadGraph {
        let mut g = RoadGraph::new();
        g.set_node(Node { id: 1, lat: 0.01, lon: 0.01 }).unwrap();
        g.set_node(Node { id: 2, lat: 0.02, lon: 0.03 }).unwrap();
        g.set_node(Node { id: 3, lat: 0.03, lon: 0.01 }).unwrap();
        g
    }

    #[test]
    fn parallel_edges_are_kept() {
        let mut g = three_nodes();
        g.add_edge(1, edge(2, 2500.0)).unwrap();
        g.add_edge(1, edge(2, 2600.0)).unwrap();
        g.add_edge(2, edge(3, 2600.0)).unwrap();

        assert_eq!(g.get_edges(1).len(), 2);
        assert_eq!(g.get_edges(1)[0].length_m, 2500.0);
        assert_eq!(g.get_edges(1)[1].length_m, 2600.0);
        assert_eq!(g.edge_count(), 3);
        assert!(g.get_edges(3).is_empty());
        assert!(g.get_edges(42).is_empty());
    }

    #[test]
    fn invalid_edges_are_rejected() {
        let mut g = three_nodes();

        assert_eq!(
            g.add_edge(7, edge(2, 100.0)),
            Err(GraphError::UnknownNode(7)),
        );
        assert_eq!(
            g.add_edge(1, edge(2, -1.0)),
            Err(GraphError::InvalidEdge { from: 1, to: 2 }),
        );
        assert_eq!(
            g.add_edge(1, Edge { free_flow_speed_kmh: 0.0, ..edge(2, 100.0) }),
            Err(GraphError::InvalidEdge { from: 1, to: 2 }),
        );
        assert_eq!(
            g.add_edge(1, Edge { pollution_multiplier: 0.5, ..edge(2, 100.0) }),
            Err(GraphError::InvalidEdge { from: 1, to: 2 }),
        );
        assert_eq!(
            g.set_node(Node { id: 4, lat: f64::NAN, lon: 0.0 }),
            Err(GraphError::InvalidNode(4)),
        );

        // Zero-length edges are fine
        assert_eq!(g.add_edge(1, edge(2, 0.0)), Ok(()));
    }

    #[test]
    fn find_nearest_node() {
        let g = three_nodes();
        assert_eq!(g.find_nearest_node(0.011, 0.012).unwrap().id, 1);
        assert_eq!(g.find_nearest_node(0.021, 0.028).unwrap().id, 2);

        // Far outside of the network still resolves
        assert_eq!(g.find_nearest_node(10.0, 0.01).unwrap().id, 3);
    }

    #[test]
    fn find_nearest_node_tie() {
        let mut g = RoadGraph::new();
        g.set_node(Node { id: 8, lat: 0.0, lon: 0.01 }).unwrap();
        g.set_node(Node { id: 3, lat: 0.0, lon: -0.01 }).unwrap();
        assert_eq!(g.find_nearest_node(0.0, 0.0).unwrap().id, 3);
    }

    #[test]
    fn find_nearest_node_empty() {
        assert_eq!(
            RoadGraph::new().find_nearest_node(0.0, 0.0),
            Err(SearchError::NoNodeFound),
        );
    }

    #[test]
    fn bbox() {
        assert_eq!(RoadGraph::new().bbox(), None);

        let b = three_nodes().bbox().unwrap();
        assert_eq!(
            b,
            Bbox {
                min_lat: 0.01,
                min_lon: 0.01,
                max_lat: 0.03,
                max_lon: 0.03,
            },
        );
        assert!(b.contains(0.02, 0.02));
        assert!(b.contains(0.01, 0.03));
        assert!(!b.contains(0.04, 0.02));
    }

    #[test]
    fn max_speed() {
        let mut g = three_nodes();
        assert_eq!(g.max_speed_kmh(), None);
        g.add_edge(1, edge(2, 100.0)).unwrap();
        g.add_edge(2, Edge { free_flow_speed_kmh: 90.0, ..edge(3, 100.0) }).unwrap();
        assert_eq!(g.max_speed_kmh(), Some(90.0));

        // Slower and rejected edges leave the maximum as-is
        g.add_edge(3, Edge { free_flow_speed_kmh: 20.0, ..edge(1, 100.0) }).unwrap();
        assert!(g.add_edge(3, Edge { free_flow_speed_kmh: 120.0, ..edge(1, -1.0) }).is_err());
        assert_eq!(g.max_speed_kmh(), Some(90.0));
    }
}
