use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ixmaps::core::config::MapConfig;
use ixmaps::data::dateline::{repair_collection, DatelineMode};
use ixmaps::data::geojson::{GeoJson, Position};
use ixmaps::measure::{format_area, format_distance, ScaleBar};
use ixmaps::projection::factory::create_any_projection;
use ixmaps::{LatLng, ProjectionOptions, ProjectionType};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "IxMaps projection and GeoJSON utilities", long_about = None)]
struct Cli {
    /// JSON config overriding IxMaps placement, cache and measurement settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Repair polygons crossing the ±180° meridian
    Dateline {
        #[arg(value_enum)]
        mode: Mode,
        input: PathBuf,
        output: PathBuf,
    },
    /// IxEarth length of a polyline given as lng,lat pairs
    Distance {
        #[arg(
            required = true,
            num_args = 2..,
            allow_hyphen_values = true,
            value_parser = parse_position
        )]
        positions: Vec<Position>,
    },
    /// IxEarth area of a ring given as lng,lat pairs
    Area {
        #[arg(
            required = true,
            num_args = 3..,
            allow_hyphen_values = true,
            value_parser = parse_position
        )]
        positions: Vec<Position>,
    },
    /// Project lng,lat pairs to pixels
    Project {
        /// Defaults to the configured layer projection
        #[arg(long, value_parser = parse_projection)]
        projection: Option<ProjectionType>,
        #[arg(long, default_value_t = 960.0)]
        width: f64,
        #[arg(long, default_value_t = 500.0)]
        height: f64,
        /// Pixels per radian; fits the world to the canvas when omitted
        #[arg(long)]
        scale: Option<f64>,
        #[arg(required = true, allow_hyphen_values = true, value_parser = parse_position)]
        positions: Vec<Position>,
    },
    /// Scale bar for a Web Mercator view
    ScaleBar {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long)]
        zoom: f64,
        #[arg(long, default_value_t = 100.0)]
        max_width: f64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Split,
    Shift,
}

impl From<Mode> for DatelineMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Split => DatelineMode::Split,
            Mode::Shift => DatelineMode::Shift,
        }
    }
}

fn parse_position(s: &str) -> std::result::Result<Position, String> {
    let (lng, lat) = s
        .split_once(',')
        .ok_or_else(|| format!("expected lng,lat but got {:?}", s))?;
    let lng = lng.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let lat = lat.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok([lng, lat])
}

fn parse_projection(s: &str) -> std::result::Result<ProjectionType, String> {
    s.parse::<ProjectionType>().map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => MapConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MapConfig::default(),
    };

    match cli.command {
        Command::Dateline {
            mode,
            input,
            output,
        } => {
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let features = GeoJson::from_str(&text)?.into_features();
            let (features, report) = repair_collection(features, mode.into());

            let collection = GeoJson::FeatureCollection { features };
            std::fs::write(&output, collection.to_string()?)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Distance { positions } => {
            let km = config.measure().try_polyline_distance(&positions)?;
            println!("{}", format_distance(km, config.measurement.dual_units));
        }
        Command::Area { positions } => {
            let km2 = config.measure().try_polygon_area(&positions)?;
            println!("{}", format_area(km2, config.measurement.dual_units));
        }
        Command::Project {
            projection,
            width,
            height,
            scale,
            positions,
        } => {
            let mut options = ProjectionOptions::new(width, height);
            options.scale = scale;
            let projection_type = projection.unwrap_or(config.layer.projection);
            let projection = create_any_projection(projection_type, &options, config.ixmaps)?;
            for position in positions {
                match projection.project(LatLng::from_position(position)) {
                    Some(point) => println!("{:.3},{:.3}", point.x, point.y),
                    None => println!("-"),
                }
            }
        }
        Command::ScaleBar {
            lat,
            zoom,
            max_width,
        } => {
            let Some(bar) = ScaleBar::for_view(lat, zoom, max_width) else {
                bail!("no scale bar fits {} px at zoom {}", max_width, zoom);
            };
            println!("{}", serde_json::to_string_pretty(&bar)?);
        }
    }

    Ok(())
}
