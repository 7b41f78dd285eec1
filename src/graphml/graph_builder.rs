// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{HashMap, HashSet};

use crate::{
    Edge, Node, RoadGraph, RoadType, DEFAULT_MAX_SPEED_KMH, INTERSECTION_APPROACH_PENALTY,
};

use super::xml::{Element, KeyDomain};
use super::{Error, Options};

/// Reason why a single node or edge record was skipped.
#[derive(Debug, PartialEq)]
enum InvalidRecord {
    InvalidId(String),
    MissingAttribute(&'static str),
    InvalidNumber(&'static str, String),
    InvalidBool(&'static str, String),
    UnknownEndpoint(i64),
    OutsideBbox(i64),
    InvalidEdge,
}

impl std::fmt::Display for InvalidRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId(id) => write!(f, "invalid node id {id:?}"),
            Self::MissingAttribute(name) => write!(f, "missing {name:?} attribute"),
            Self::InvalidNumber(name, value) => write!(f, "invalid number {value:?} in {name:?}"),
            Self::InvalidBool(name, value) => write!(f, "invalid boolean {value:?} in {name:?}"),
            Self::UnknownEndpoint(id) => write!(f, "reference to unknown node {id}"),
            Self::OutsideBbox(id) => write!(f, "node {id} is outside of the bounding box"),
            Self::InvalidEdge => write!(f, "non-positive speed, negative length or too low multiplier"),
        }
    }
}

/// Edge record waiting for all nodes to be loaded.
struct PendingEdge {
    source: String,
    target: String,
    directed: Option<bool>,
    attributes: HashMap<String, String>,
}

/// Helper object used for converting GraphML [Elements](Element) into a [RoadGraph].
///
/// Edges are buffered until the end of the document, as GraphML
/// doesn't require nodes to be declared before the edges referencing them.
pub(super) struct GraphBuilder<'a> {
    g: RoadGraph,
    options: &'a Options,
    node_keys: HashMap<String, String>,
    edge_keys: HashMap<String, String>,
    directed: bool,
    edges: Vec<PendingEdge>,
    outside_nodes: HashSet<i64>,
    skipped_nodes: usize,
    skipped_edges: usize,
    outside_edges: usize,
    ignore_bbox: bool,
}

impl<'a> GraphBuilder<'a> {
    pub(super) fn new(options: &'a Options) -> Self {
        let non_finite = options.bbox.iter().any(|x| !x.is_finite());
        if non_finite {
            log::warn!("ignoring non-finite bounding box {:?}", options.bbox);
        }
        let ignore_bbox = non_finite || options.bbox.iter().all(|&x| x == 0.0);

        Self {
            g: RoadGraph::new(),
            options,
            node_keys: HashMap::default(),
            edge_keys: HashMap::default(),
            directed: true,
            edges: Vec::default(),
            outside_nodes: HashSet::default(),
            skipped_nodes: 0,
            skipped_edges: 0,
            outside_edges: 0,
            ignore_bbox,
        }
    }

    /// Consumes all [Elements](Element) from the iterator and returns the built [RoadGraph].
    pub(super) fn build<I, E>(mut self, elements: I) -> Result<RoadGraph, Error>
    where
        I: IntoIterator<Item = Result<Element, E>>,
        Error: From<E>,
    {
        for element in elements {
            self.add_element(element?);
        }
        self.add_pending_edges();
        self.log_summary();
        Ok(self.g)
    }

    fn add_pending_edges(&mut self) {
        let edges = std::mem::take(&mut self.edges);
        for e in edges {
            match self.add_edge(&e) {
                Ok(()) => {}
                Err(err @ InvalidRecord::OutsideBbox(_)) => {
                    log::debug!("skipping edge {} -> {}: {}", e.source, e.target, err);
                    self.outside_edges += 1;
                }
                Err(err) => {
                    log::warn!("skipping edge {} -> {}: {}", e.source, e.target, err);
                    self.skipped_edges += 1;
                }
            }
        }
    }

    fn log_summary(&self) {
        if self.skipped_nodes > 0 {
            log::warn!("skipped {} invalid node(s)", self.skipped_nodes);
        }
        if self.skipped_edges > 0 {
            log::warn!("skipped {} invalid or dangling edge(s)", self.skipped_edges);
        }
        if !self.outside_nodes.is_empty() {
            log::info!(
                "dropped {} node(s) and {} edge(s) outside of the bounding box",
                self.outside_nodes.len(),
                self.outside_edges,
            );
        }
        if let Some(speed) = self.g.max_speed_kmh().filter(|&s| s > DEFAULT_MAX_SPEED_KMH) {
            log::warn!(
                "road network has edges with free-flow speed {:.1} km/h, above the assumed {:.1} km/h",
                speed,
                DEFAULT_MAX_SPEED_KMH,
            );
        }
        log::info!(
            "loaded road network with {} nodes and {} edges",
            self.g.len(),
            self.g.edge_count(),
        );
    }

    fn add_element(&mut self, element: Element) {
        match element {
            Element::Key { id, domain, name } => match domain {
                KeyDomain::Node => {
                    self.node_keys.insert(id, name);
                }
                KeyDomain::Edge => {
                    self.edge_keys.insert(id, name);
                }
                KeyDomain::Other => {}
            },

            Element::Graph { directed } => self.directed = directed,

            Element::Node { id, data } => {
                let attributes = resolve_keys(&self.node_keys, data);
                match parse_node(&id, &attributes) {
                    Ok(n) if self.is_in_bbox(n.lat, n.lon) => {
                        // Coordinates were already checked to be finite
                        _ = self.g.set_node(n);
                    }
                    Ok(n) => {
                        self.outside_nodes.insert(n.id);
                    }
                    Err(err) => {
                        log::warn!("skipping node {id:?}: {err}");
                        self.skipped_nodes += 1;
                    }
                }
            }

            Element::Edge {
                source,
                target,
                directed,
                data,
            } => {
                let attributes = resolve_keys(&self.edge_keys, data);
                self.edges.push(PendingEdge {
                    source,
                    target,
                    directed,
                    attributes,
                });
            }
        }
    }

    fn is_in_bbox(&self, lat: f64, lon: f64) -> bool {
        if self.ignore_bbox {
            return true;
        }
        let [min_lon, min_lat, max_lon, max_lat] = self.options.bbox;
        lat >= min_lat && lat <= max_lat && lon >= min_lon && lon <= max_lon
    }

    fn add_edge(&mut self, e: &PendingEdge) -> Result<(), InvalidRecord> {
        let from = parse_id(&e.source)?;
        let to = parse_id(&e.target)?;
        for id in [from, to] {
            if self.outside_nodes.contains(&id) {
                return Err(InvalidRecord::OutsideBbox(id));
            } else if self.g.get_node(id).is_none() {
                return Err(InvalidRecord::UnknownEndpoint(id));
            }
        }

        let edge = parse_edge(to, &e.attributes)?;
        self.g
            .add_edge(from, edge)
            .map_err(|_| InvalidRecord::InvalidEdge)?;

        if !e.directed.unwrap_or(self.directed) && from != to {
            self.g
                .add_edge(to, Edge { to: from, ..edge })
                .map_err(|_| InvalidRecord::InvalidEdge)?;
        }

        Ok(())
    }
}

/// Replaces key ids by attribute names. Undeclared keys are kept as-is.
fn resolve_keys(
    keys: &HashMap<String, String>,
    data: HashMap<String, String>,
) -> HashMap<String, String> {
    data.into_iter()
        .map(|(k, v)| match keys.get(&k) {
            Some(name) => (name.clone(), v),
            None => (k, v),
        })
        .collect()
}

fn parse_id(s: &str) -> Result<i64, InvalidRecord> {
    s.trim()
        .parse()
        .map_err(|_| InvalidRecord::InvalidId(s.to_string()))
}

fn get_number(
    attributes: &HashMap<String, String>,
    name: &'static str,
) -> Result<Option<f64>, InvalidRecord> {
    match attributes.get(name) {
        None => Ok(None),
        Some(s) => match s.parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(Some(x)),
            _ => Err(InvalidRecord::InvalidNumber(name, s.clone())),
        },
    }
}

fn require_number(
    attributes: &HashMap<String, String>,
    name: &'static str,
) -> Result<f64, InvalidRecord> {
    get_number(attributes, name)?.ok_or(InvalidRecord::MissingAttribute(name))
}

fn get_bool(
    attributes: &HashMap<String, String>,
    name: &'static str,
) -> Result<Option<bool>, InvalidRecord> {
    match attributes.get(name).map(String::as_str) {
        None => Ok(None),
        Some("True" | "true" | "1") => Ok(Some(true)),
        Some("False" | "false" | "0" | "") => Ok(Some(false)),
        Some(s) => Err(InvalidRecord::InvalidBool(name, s.to_string())),
    }
}

fn parse_node(id: &str, attributes: &HashMap<String, String>) -> Result<Node, InvalidRecord> {
    Ok(Node {
        id: parse_id(id)?,
        lat: require_number(attributes, "y")?,
        lon: require_number(attributes, "x")?,
    })
}

fn parse_edge(to: i64, attributes: &HashMap<String, String>) -> Result<Edge, InvalidRecord> {
    let length_m = require_number(attributes, "length")?;
    let pollution_multiplier = require_number(attributes, "pollution_multiplier")?;

    // Snapshots may carry the traversal time (in seconds) instead of the speed
    let free_flow_speed_kmh = match get_number(attributes, "speed_kph")? {
        Some(speed) => speed,
        None => match get_number(attributes, "time")? {
            Some(time) if time > 0.0 => length_m / time * 3.6,
            _ => return Err(InvalidRecord::MissingAttribute("speed_kph")),
        },
    };

    // Snapshots may carry the penalized pollution (in meters) instead of the flag
    let is_intersection_approach = match get_bool(attributes, "intersection_approach")? {
        Some(flag) => flag,
        None => match get_number(attributes, "pollution")? {
            Some(pollution) if length_m > 0.0 => {
                let ratio = pollution / (length_m * pollution_multiplier);
                ratio > (1.0 + INTERSECTION_APPROACH_PENALTY) / 2.0
            }
            _ => false,
        },
    };

    let road_type = attributes
        .get("road_type")
        .or_else(|| attributes.get("highway"))
        .map(|s| RoadType::from_highway(s))
        .unwrap_or_default();

    Ok(Edge {
        to,
        length_m,
        free_flow_speed_kmh,
        pollution_multiplier,
        is_intersection_approach,
        road_type,
    })
}
