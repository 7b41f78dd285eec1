use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use greenroute;

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct GraphLoadError(PathBuf, #[source] greenroute::graphml::Error);

#[derive(Debug, thiserror::Error)]
#[error("{name} position ({lat}, {lon}) is outside of the road network {bbox:?}")]
struct OutOfBounds {
    name: &'static str,
    lat: f64,
    lon: f64,
    bbox: Option<greenroute::Bbox>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// Guess the format based on the content
    Auto,
    /// Uncompressed GraphML
    Graphml,
    /// GraphML with gzip compression
    Gz,
    /// GraphML with bzip2 compression
    Bz2,
}

impl From<Format> for greenroute::graphml::FileFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Auto => Self::Unknown,
            Format::Graphml => Self::GraphMl,
            Format::Gz => Self::GraphMlGz,
            Format::Bz2 => Self::GraphMlBz2,
        }
    }
}

/// Finds the fastest and the least-polluting routes between two points,
/// and prints both routes with their exploration traces as JSON.
#[derive(Parser)]
struct Cli {
    /// The path to the annotated GraphML snapshot
    graph_file: PathBuf,

    /// Latitude of the start point
    #[arg(allow_hyphen_values = true)]
    start_lat: f64,

    /// Longitude of the start point
    #[arg(allow_hyphen_values = true)]
    start_lon: f64,

    /// Latitude of the end point
    #[arg(allow_hyphen_values = true)]
    end_lat: f64,

    /// Longitude of the end point
    #[arg(allow_hyphen_values = true)]
    end_lon: f64,

    /// Format of the snapshot
    #[arg(long, value_enum, default_value_t = Format::Auto)]
    format: Format,

    /// Maximum number of node expansions of every search
    #[arg(long, default_value_t = greenroute::DEFAULT_STEP_LIMIT)]
    step_limit: usize,

    /// Snap positions to nodes with a k-d tree instead of a linear scan
    #[arg(long)]
    kd_tree: bool,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,

    /// Increase logging verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    colog::default_builder()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let g = load_graph(&cli.graph_file, cli.format)?;

    let bbox = g.bbox();
    check_bounds(bbox, "start", cli.start_lat, cli.start_lon)?;
    check_bounds(bbox, "end", cli.end_lat, cli.end_lon)?;

    let index = if cli.kd_tree {
        greenroute::KDTree::from_graph(&g)
    } else {
        None
    };

    let mut query = greenroute::RouteQuery::new(&g).with_step_limit(cli.step_limit);
    if let Some(index) = &index {
        query = query.with_index(index);
    }

    let routes = query.compute(cli.start_lat, cli.start_lon, cli.end_lat, cli.end_lon)?;

    let output = if cli.pretty {
        serde_json::to_string_pretty(&routes)?
    } else {
        serde_json::to_string(&routes)?
    };
    println!("{}", output);

    Ok(())
}

fn load_graph<P: AsRef<Path>>(
    path: P,
    format: Format,
) -> Result<greenroute::RoadGraph, GraphLoadError> {
    let options = greenroute::graphml::Options {
        file_format: format.into(),
        bbox: [0.0; 4],
    };
    greenroute::graphml::load_from_file(&options, path.as_ref())
        .map_err(|e| GraphLoadError(PathBuf::from(path.as_ref()), e))
}

fn check_bounds(
    bbox: Option<greenroute::Bbox>,
    name: &'static str,
    lat: f64,
    lon: f64,
) -> Result<(), OutOfBounds> {
    match bbox {
        Some(b) if b.contains(lat, lon) => Ok(()),
        _ => Err(OutOfBounds {
            name,
            lat,
            lon,
            bbox,
        }),
    }
}
