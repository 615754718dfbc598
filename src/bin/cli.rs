//! xplore CLI - find unexplored roads around a location
//!
//! Usage:
//!   xplore run --center 40.0,-75.0 [--radius-km 5] [--spacing-m 100] [--output <dir>]
//!   xplore grid --center 40.0,-75.0 [--radius-km 5] [--spacing-m 100]
//!   xplore history [--data-dir data]
//!
//! Data directory layout:
//!   takeouts/*.zip                   Google Takeout location history
//!   gpx/*.gpx                        extra GPS tracks
//!   excluded_from_exploration.json   private points and areas
//!   rolling_history.json             accumulated visited points
//!   grid_to_road_cache/              Roads API cache

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::error;
use xplore::{
    generate_disk_grid, pipeline::load_visited, progress::LogProgress, render_map,
    roads::required_requests, run_exploration, write_geojson, ExploreConfig, GoogleRoadsClient,
    GpsPoint, GridCache, RoadsClientConfig,
};

#[derive(Parser)]
#[command(name = "xplore")]
#[command(about = "Find roads you have not explored yet", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Find unexplored road points and render them on a map
    Run {
        #[command(flatten)]
        area: AreaArgs,

        /// Maximum Roads API requests for this run
        #[arg(long, default_value = "50")]
        max_requests: usize,

        /// Neighbours retrieved per proximity query
        #[arg(long, default_value = "30")]
        neighbors: usize,

        /// Google Maps API key with the Roads API enabled
        #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Concurrent Roads API requests
        #[arg(long, default_value = "4")]
        max_parallel: usize,

        /// Per-request timeout in seconds
        #[arg(long, default_value = "30")]
        timeout_secs: u64,

        /// Output directory for map.html and unexplored.geojson
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show grid size and how much of it still needs snapping
    Grid {
        #[command(flatten)]
        area: AreaArgs,
    },

    /// Merge the newest takeout and GPX files into the rolling history
    History {
        /// Data directory
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
}

#[derive(Args)]
struct AreaArgs {
    /// Center point as "lat,lon"
    #[arg(long, value_parser = parse_center)]
    center: GpsPoint,

    /// Search radius in kilometers
    #[arg(long, default_value = "5")]
    radius_km: f64,

    /// Grid spacing in meters
    #[arg(long, default_value = "100")]
    spacing_m: f64,

    /// Data directory
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

impl AreaArgs {
    fn to_config(&self) -> ExploreConfig {
        ExploreConfig {
            center: self.center,
            radius_km: self.radius_km,
            grid_spacing_m: self.spacing_m,
            data_dir: self.data_dir.clone(),
            ..ExploreConfig::default()
        }
    }
}

fn parse_center(s: &str) -> Result<GpsPoint, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lon\", got \"{s}\""))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("bad latitude: {e}"))?;
    let lon: f64 = lon.trim().parse().map_err(|e| format!("bad longitude: {e}"))?;
    let point = GpsPoint::new(lat, lon);
    if !point.is_valid() {
        return Err(format!("{s} is not a valid coordinate"));
    }
    Ok(point)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let result = match cli.command {
        Commands::Run {
            area,
            max_requests,
            neighbors,
            api_key,
            max_parallel,
            timeout_secs,
            output,
        } => {
            let config = ExploreConfig {
                max_requests,
                neighbors,
                ..area.to_config()
            };
            let client_config = RoadsClientConfig {
                max_parallel,
                timeout_secs,
                ..RoadsClientConfig::default()
            };
            run(&config, &api_key, client_config, output)
        }
        Commands::Grid { area } => grid(&area.to_config()),
        Commands::History { data_dir } => history(data_dir),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(
    config: &ExploreConfig,
    api_key: &str,
    client_config: RoadsClientConfig,
    output: Option<PathBuf>,
) -> xplore::Result<()> {
    let client = GoogleRoadsClient::new(api_key, client_config)?;
    let result = run_exploration(config, &client, &LogProgress::default())?;

    println!("\n{}", "=".repeat(60));
    println!("RESULTS");
    println!("{}", "=".repeat(60));
    println!("  Visited points:    {}", result.visited_count);
    println!("  Excluded points:   {}", result.excluded_count);
    println!("  Grid points:       {}", result.grid_count);
    println!("  Road points:       {}", result.road_count);
    println!("  Snapped this run:  {}", result.newly_snapped);
    println!("  Unexplored points: {}", result.unexplored.len());

    for (i, p) in result.unexplored.iter().take(10).enumerate() {
        println!("    {:>2}. {:.6}, {:.6}", i + 1, p.latitude, p.longitude);
    }

    let output_dir = output.unwrap_or_else(|| config.data_dir.join("output"));
    let map_path = output_dir.join("map.html");
    render_map(config.center, &result.unexplored).save(&map_path)?;
    write_geojson(
        config.center,
        &result.unexplored,
        &output_dir.join("unexplored.geojson"),
    )?;
    println!("\n[Export] Map written to: {}", map_path.display());

    Ok(())
}

fn grid(config: &ExploreConfig) -> xplore::Result<()> {
    config.validate()?;
    let grid = generate_disk_grid(config.center, config.radius_km, config.grid_spacing_m)?;
    let cache = GridCache::load(&config.grid_cache_path())?;
    let missing = cache.missing(&grid);
    let batch_size = RoadsClientConfig::default().batch_size;

    println!("Grid points:      {}", grid.len());
    println!("Already cached:   {}", grid.len() - missing.len());
    println!("Still missing:    {}", missing.len());
    println!(
        "Requests needed:  {}",
        required_requests(missing.len(), batch_size)
    );
    Ok(())
}

fn history(data_dir: PathBuf) -> xplore::Result<()> {
    let config = ExploreConfig {
        data_dir,
        ..ExploreConfig::default()
    };
    let visited = load_visited(&config)?;
    println!(
        "Rolling history at {} has {} points",
        config.rolling_history_path().display(),
        visited.len()
    );
    Ok(())
}
