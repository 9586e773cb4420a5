//! `weld-align` command-line interface.

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::info;
use nalgebra::Point2;
use weld_align::audit::intrinsics_hash_v1;
use weld_align::core::LogFilter;
use weld_align::io::{MarkerAlignConfig, MarkerAlignReport, ModelAlignConfig, ModelAlignReport};
use weld_align::marker::order_corners_clockwise_from_top_left;
use weld_align::{align_marker, align_model};

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Debug, Parser)]
#[command(name = "weld-align", version)]
#[command(about = "Marker pose, model alignment and calibration fingerprints for weld inspection")]
struct Cli {
    /// Log filter: a level (off, error, warn, info, debug, trace), optionally
    /// followed by per-crate overrides, e.g. `warn,weld_align_marker=debug`.
    #[arg(long, global = true, default_value = "info")]
    log_level: LogFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the v1 fingerprint of a camera calibration.
    Hash {
        #[arg(long, allow_hyphen_values = true)]
        width: i32,
        #[arg(long, allow_hyphen_values = true)]
        height: i32,
        #[arg(long, allow_hyphen_values = true)]
        fx: f64,
        #[arg(long, allow_hyphen_values = true)]
        fy: f64,
        #[arg(long, allow_hyphen_values = true)]
        cx: f64,
        #[arg(long, allow_hyphen_values = true)]
        cy: f64,
    },

    /// Print points ordered clockwise from the top-left, as JSON.
    Order {
        /// Points as `x,y` pairs.
        #[arg(required = true, allow_hyphen_values = true)]
        points: Vec<String>,
    },

    /// Estimate a single marker pose from a JSON config.
    Marker {
        config: PathBuf,
        /// Report path; overrides `outputPath` from the config.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Fit the model to the world from a JSON config.
    Fit {
        config: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level)?;

    match cli.command {
        Commands::Hash {
            width,
            height,
            fx,
            fy,
            cx,
            cy,
        } => {
            println!("{}", intrinsics_hash_v1(width, height, fx, fy, cx, cy));
            Ok(())
        }
        Commands::Order { points } => run_order(&points),
        Commands::Marker { config, output } => run_marker(&config, output),
        Commands::Fit { config, output } => run_fit(&config, output),
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(filter: LogFilter) -> CliResult<()> {
    weld_align::core::init_with_filter(filter)?;
    Ok(())
}

#[cfg(feature = "tracing")]
fn init_logging(filter: LogFilter) -> CliResult<()> {
    if !weld_align::core::init_tracing(&filter, false) {
        log::warn!("a tracing subscriber was already installed");
    }
    Ok(())
}

fn parse_point(raw: &str) -> CliResult<Point2<f64>> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got {raw:?}"))?;
    Ok(Point2::new(x.trim().parse()?, y.trim().parse()?))
}

fn run_order(raw: &[String]) -> CliResult<()> {
    let points = raw
        .iter()
        .map(|p| parse_point(p))
        .collect::<CliResult<Vec<_>>>()?;
    let ordered = order_corners_clockwise_from_top_left(&points);
    println!("{}", serde_json::to_string(&ordered)?);
    Ok(())
}

fn run_marker(config_path: &Path, output: Option<PathBuf>) -> CliResult<()> {
    let cfg = MarkerAlignConfig::load_json(config_path)?;
    info!("marker {}: solving pose", cfg.observation.marker.id);

    let result = align_marker(&cfg.observation, &cfg.pose_params());
    let mut report = MarkerAlignReport::new(&cfg, config_path);
    report.set_result(&result);

    let out = output.unwrap_or_else(|| cfg.output_path());
    report.write_json(&out)?;
    info!("report written to {}", out.display());

    result?;
    Ok(())
}

fn run_fit(config_path: &Path, output: Option<PathBuf>) -> CliResult<()> {
    let cfg = ModelAlignConfig::load_json(config_path)?;
    info!(
        "fitting model from {} marker(s) and {} manual point(s)",
        cfg.request.markers.len(),
        cfg.request.manual_points.len()
    );

    let result = align_model(&cfg.request, &cfg.pose_params());
    let mut report = ModelAlignReport::new(&cfg, config_path);
    report.set_result(&result);

    let out = output.unwrap_or_else(|| cfg.output_path());
    report.write_json(&out)?;
    info!("report written to {}", out.display());

    result?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_points_with_spaces_and_signs() {
        assert_eq!(parse_point("1.5, -2").unwrap(), Point2::new(1.5, -2.0));
        assert!(parse_point("3").is_err());
        assert!(parse_point("a,b").is_err());
    }

    #[test]
    fn log_level_accepts_per_crate_overrides() {
        let cli = Cli::try_parse_from([
            "weld-align",
            "--log-level",
            "warn,weld_align_marker=debug",
            "order",
            "0,0",
        ])
        .unwrap();
        assert_eq!(cli.log_level.to_string(), "warn,weld_align_marker=debug");
        assert!(Cli::try_parse_from(["weld-align", "--log-level", "noisy", "order", "0,0"]).is_err());
    }
}
