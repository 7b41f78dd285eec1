// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Loading annotated road networks from [GraphML](http://graphml.graphdrawing.org/) snapshots.
//!
//! Snapshots are expected to follow the layout written by [osmnx](https://osmnx.readthedocs.io/):
//! nodes carry their position in the `y` (latitude) and `x` (longitude) attributes,
//! and edges carry:
//! - `length`: length of the segment in meters, required;
//! - `speed_kph`: free-flow speed in km/h, required unless `time`
//!   (traversal time in seconds) is present;
//! - `pollution_multiplier`: required, see [Edge::pollution_multiplier](crate::Edge::pollution_multiplier);
//! - `intersection_approach`: `True` or `False`, defaults to `False`, unless `pollution`
//!   (length in meters multiplied by the multiplier and the intersection penalty) is present;
//! - `road_type` or `highway`: optional, see [RoadType::from_highway](crate::RoadType::from_highway).
//!
//! Records with missing or invalid attributes, as well as edges referencing unknown nodes,
//! are skipped with a warning.

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use graph_builder::GraphBuilder;

use crate::RoadGraph;

mod graph_builder;
mod xml;

/// Format of the input GraphML file
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Unknown format - guess the format based on the content
    #[default]
    Unknown,

    /// Force uncompressed GraphML
    GraphMl,

    /// Force GraphML with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    GraphMlGz,

    /// Force GraphML with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    GraphMlBz2,
}

impl FileFormat {
    /// Guesses the format of a file based on its first bytes.
    pub fn detect(magic: &[u8]) -> Self {
        if magic.starts_with(&[0x1f, 0x8b]) {
            Self::GraphMlGz
        } else if magic.starts_with(b"BZh") {
            Self::GraphMlBz2
        } else {
            Self::GraphMl
        }
    }
}

/// Additional controls for loading GraphML snapshots into a [RoadGraph].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Options {
    /// Format of the input data.
    pub file_format: FileFormat,

    /// Filter nodes by a specific bounding box. In order: left (min lon), bottom (min lat),
    /// right (max lon), top (max lat). Ignored if all values are set to zero, or at least one
    /// of them is not finite. Edges incident to filtered-out nodes are dropped.
    pub bbox: [f64; 4],
}

/// Error conditions which may occur when loading a snapshot.
///
/// Invalid records don't cause an error; they are skipped instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("io: {0}")]
    Io(#[from] io::Error),
}

/// Loads a [RoadGraph] from a GraphML stream as per the provided [Options].
///
/// The provided stream will be automatically wrapped in a buffered reader when needed.
pub fn load_from_io<R: io::Read>(options: &Options, reader: R) -> Result<RoadGraph, Error> {
    let mut b = io::BufReader::new(reader);

    let format = match options.file_format {
        FileFormat::Unknown => FileFormat::detect(b.fill_buf()?),
        format => format,
    };

    match format {
        FileFormat::Unknown | FileFormat::GraphMl => {
            let r = xml::Reader::from_io(b);
            GraphBuilder::new(options).build(r)
        }

        FileFormat::GraphMlGz => {
            let d = flate2::read::MultiGzDecoder::new(b);
            let r = xml::Reader::from_io(io::BufReader::new(d));
            GraphBuilder::new(options).build(r)
        }

        FileFormat::GraphMlBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(b);
            let r = xml::Reader::from_io(io::BufReader::new(d));
            GraphBuilder::new(options).build(r)
        }
    }
}

/// Loads a [RoadGraph] from a GraphML file at the provided path as per the provided [Options].
pub fn load_from_file<P: AsRef<Path>>(options: &Options, path: P) -> Result<RoadGraph, Error> {
    let path = path.as_ref();
    log::info!("loading road network from {}", path.display());
    let f = File::open(path)?;
    load_from_io(options, f)
}

/// Loads a [RoadGraph] from a static buffer as per the provided [Options].
pub fn load_from_buffer(options: &Options, data: &[u8]) -> Result<RoadGraph, Error> {
    let format = match options.file_format {
        FileFormat::Unknown => FileFormat::detect(data),
        format => format,
    };

    if format == FileFormat::GraphMl {
        // Fast path is available for in-memory XML data
        let r = xml::Reader::from_buffer(data);
        GraphBuilder::new(options).build(r)
    } else {
        // Wrap the buffer in a cursor and use the IO path
        let cursor = io::Cursor::new(data);
        let options = Options {
            file_format: format,
            ..options.clone()
        };
        load_from_io(&options, cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Edge, Node, RoadType};

    const SMALL_GRAPHML: &[u8] = include_bytes!("test_fixtures/small.graphml");
    const SMALL_GRAPHML_GZ: &[u8] = include_bytes!("test_fixtures/small.graphml.gz");
    const SMALL_GRAPHML_BZ2: &[u8] = include_bytes!("test_fixtures/small.graphml.bz2");

    fn check_small_graph(g: &RoadGraph) {
        // Node 105 has no longitude
        assert_eq!(g.len(), 4);
        assert_eq!(
            g.get_node(101),
            Some(Node {
                id: 101,
                lat: -6.2,
                lon: 106.8,
            }),
        );
        assert_eq!(g.get_node(105), None);

        // 104 -> 101 has no length, 104 -> 999 is dangling,
        // and the undirected 103 - 104 is loaded in both directions
        assert_eq!(g.edge_count(), 6);

        assert_eq!(
            g.get_edges(101),
            &[
                Edge {
                    to: 102,
                    length_m: 560.0,
                    free_flow_speed_kmh: 40.0,
                    pollution_multiplier: 1.6,
                    is_intersection_approach: true,
                    road_type: RoadType::Primary,
                },
                Edge {
                    to: 102,
                    length_m: 700.0,
                    free_flow_speed_kmh: 80.0,
                    pollution_multiplier: 1.0,
                    is_intersection_approach: false,
                    road_type: RoadType::Motorway,
                },
            ],
        );

        let back = &g.get_edges(102)[0];
        assert_eq!(back.to, 101);
        assert!(!back.is_intersection_approach);
        assert_eq!(back.road_type, RoadType::Primary);

        let derived = &g.get_edges(102)[1];
        assert_eq!(derived.to, 103);
        assert!((derived.free_flow_speed_kmh - 20.0).abs() < 1e-9);
        assert!(derived.is_intersection_approach);
        assert_eq!(derived.road_type, RoadType::Residential);

        assert_eq!(g.get_edges(103).len(), 1);
        assert_eq!(g.get_edges(103)[0].to, 104);
        assert_eq!(g.get_edges(104).len(), 1);
        assert_eq!(g.get_edges(104)[0].to, 103);
        assert_eq!(g.get_edges(104)[0].length_m, 600.0);
    }

    #[test]
    fn load_plain() -> Result<(), Error> {
        let options = Options {
            file_format: FileFormat::GraphMl,
            ..Options::default()
        };
        check_small_graph(&load_from_buffer(&options, SMALL_GRAPHML)?);
        check_small_graph(&load_from_io(&options, SMALL_GRAPHML)?);
        Ok(())
    }

    #[test]
    fn load_gz() -> Result<(), Error> {
        let options = Options {
            file_format: FileFormat::GraphMlGz,
            ..Options::default()
        };
        check_small_graph(&load_from_buffer(&options, SMALL_GRAPHML_GZ)?);
        Ok(())
    }

    #[test]
    fn load_bz2() -> Result<(), Error> {
        let options = Options {
            file_format: FileFormat::GraphMlBz2,
            ..Options::default()
        };
        check_small_graph(&load_from_buffer(&options, SMALL_GRAPHML_BZ2)?);
        Ok(())
    }

    #[test]
    fn detect_format() -> Result<(), Error> {
        assert_eq!(FileFormat::detect(SMALL_GRAPHML), FileFormat::GraphMl);
        assert_eq!(FileFormat::detect(SMALL_GRAPHML_GZ), FileFormat::GraphMlGz);
        assert_eq!(FileFormat::detect(SMALL_GRAPHML_BZ2), FileFormat::GraphMlBz2);
        assert_eq!(FileFormat::detect(b""), FileFormat::GraphMl);

        let options = Options::default();
        for data in [SMALL_GRAPHML, SMALL_GRAPHML_GZ, SMALL_GRAPHML_BZ2] {
            check_small_graph(&load_from_buffer(&options, data)?);
            check_small_graph(&load_from_io(&options, io::Cursor::new(data))?);
        }
        Ok(())
    }

    #[test]
    fn load_with_bbox() -> Result<(), Error> {
        let options = Options {
            bbox: [106.799, -6.201, 106.806, -6.199],
            ..Options::default()
        };
        let g = load_from_buffer(&options, SMALL_GRAPHML)?;

        assert_eq!(g.iter().map(|n| n.id).collect::<Vec<_>>(), vec![101, 102]);
        assert_eq!(g.edge_count(), 3);
        Ok(())
    }

    #[test]
    fn load_missing_file() {
        let result = load_from_file(&Options::default(), "test_fixtures/does_not_exist.graphml");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn load_malformed() {
        let result = load_from_buffer(&Options::default(), b"<graphml><graph></node></graphml>");
        assert!(matches!(result, Err(Error::Xml(_))));
    }

    #[test]
    fn loaded_graph_is_routable() -> Result<(), Error> {
        let g = load_from_buffer(&Options::default(), SMALL_GRAPHML)?;
        let routes = crate::compute_routes(&g, -6.2, 106.8, -6.195, 106.8).unwrap();

        // 101 -> 102 -> 103 -> 104
        assert_eq!(routes.time_route.path.len(), 4);
        assert_eq!(routes.time_route.path.last(), Some(&[-6.195, 106.8]));
        assert_eq!(routes.time_route.stats.num_segments, 3);
        Ok(())
    }
}
